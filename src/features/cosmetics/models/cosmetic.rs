use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

/// Database model for a catalog cosmetic
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Cosmetic {
    pub id: i32,
    pub name: String,
    pub brand: String,
    pub price: Decimal,
    pub description: Option<String>,
    /// Public path of the product image, e.g. `/uploads/lipstick20261016093015123.png`
    pub picture: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
