mod cosmetic_service;

pub use cosmetic_service::{CosmeticService, FormOutcome};
