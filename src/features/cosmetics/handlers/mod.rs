mod cosmetic_handler;

pub use cosmetic_handler::*;
