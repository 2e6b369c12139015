mod cosmetic_dto;

pub use cosmetic_dto::*;
