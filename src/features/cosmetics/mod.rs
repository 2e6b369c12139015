//! Cosmetics catalog feature: list, view, create, edit and delete products.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/cosmetics` | List all cosmetics |
//! | GET | `/cosmetics/details/{id}` | Show one cosmetic |
//! | GET/POST | `/cosmetics/create` | Create form / create (multipart, image required) |
//! | GET/POST | `/cosmetics/edit/{id}` | Edit form / save fields (image unchanged) |
//! | GET/POST | `/cosmetics/delete/{id}` | Confirmation / delete row and image |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use repositories::PgCosmeticRepository;
pub use routes::routes;
pub use services::CosmeticService;
