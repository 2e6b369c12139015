mod cosmetic;

pub use cosmetic::Cosmetic;
