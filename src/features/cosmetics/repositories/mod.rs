mod cosmetic_repository;

pub use cosmetic_repository::{CosmeticRepository, PgCosmeticRepository};
