use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::features::cosmetics::models::Cosmetic;

/// Multipart field carrying the product image on create
pub const IMAGE_FIELD: &str = "image_file";

pub const IMAGE_REQUIRED_MESSAGE: &str = "Please upload an image for the product.";

/// Allowed MIME types for product images
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Largest price a NUMERIC(10,2) column holds
fn max_price() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

/// Check if a MIME type is allowed
pub fn is_image_type_allowed(content_type: &str) -> bool {
    ALLOWED_IMAGE_TYPES.contains(&content_type)
}

/// A single validation failure, keyed by form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Flatten validator output into field errors, ordered by field name
    pub fn from_validation_errors(errors: &ValidationErrors) -> Vec<Self> {
        let mut result: Vec<Self> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                let field = field.to_string();
                errs.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field));
                    FieldError::new(field.clone(), message)
                })
            })
            .collect();
        result.sort_by(|a, b| a.field.cmp(&b.field));
        result
    }
}

/// Image part of a create request, before it is written to disk
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl UploadedImage {
    /// Check type and size; failures are reported on the image field
    pub fn check(&self, max_size: usize) -> Option<FieldError> {
        if !is_image_type_allowed(&self.content_type) {
            return Some(FieldError::new(
                IMAGE_FIELD,
                format!(
                    "Image type '{}' is not allowed. Allowed types: {}",
                    self.content_type,
                    ALLOWED_IMAGE_TYPES.join(", ")
                ),
            ));
        }

        if self.data.len() > max_size {
            return Some(FieldError::new(
                IMAGE_FIELD,
                format!(
                    "Image too large. Maximum size is {} MB",
                    max_size / 1024 / 1024
                ),
            ));
        }

        None
    }
}

/// Descriptive fields as submitted by the browser (unparsed)
#[derive(Debug, Clone, Default)]
pub struct CosmeticFields {
    pub name: String,
    pub brand: String,
    pub price: String,
    pub description: String,
}

impl CosmeticFields {
    /// Parse and validate into a [`CosmeticInput`], collecting every failure
    pub fn parse(&self) -> Result<CosmeticInput, Vec<FieldError>> {
        let mut errors = Vec::new();

        let price = match Decimal::from_str(self.price.trim()) {
            Ok(price) if price.is_sign_negative() => {
                errors.push(FieldError::new("price", "Price must not be negative"));
                Decimal::ZERO
            }
            Ok(price) if price.normalize().scale() > 2 => {
                errors.push(FieldError::new(
                    "price",
                    "Price must have at most 2 decimal places",
                ));
                Decimal::ZERO
            }
            Ok(price) if price > max_price() => {
                errors.push(FieldError::new("price", "Price is too large"));
                Decimal::ZERO
            }
            Ok(price) => price,
            Err(_) => {
                errors.push(FieldError::new("price", "Price must be a number"));
                Decimal::ZERO
            }
        };

        let description = self.description.trim();
        let input = CosmeticInput {
            name: self.name.trim().to_string(),
            brand: self.brand.trim().to_string(),
            price,
            description: (!description.is_empty()).then(|| description.to_string()),
        };

        if let Err(e) = input.validate() {
            errors.extend(FieldError::from_validation_errors(&e));
        }

        if errors.is_empty() {
            Ok(input)
        } else {
            Err(errors)
        }
    }
}

/// Validated descriptive fields, ready to persist
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct CosmeticInput {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(max = 100, message = "Brand must not exceed 100 characters"))]
    pub brand: String,

    pub price: Decimal,

    #[validate(length(max = 2000, message = "Description must not exceed 2000 characters"))]
    pub description: Option<String>,
}

/// Urlencoded body of the edit form
///
/// `picture` is echoed back for display only; edits never change the image.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EditCosmeticForm {
    pub id: Option<i32>,
    pub name: String,
    pub brand: String,
    pub price: String,
    pub description: String,
    pub picture: Option<String>,
}

impl EditCosmeticForm {
    pub fn fields(&self) -> CosmeticFields {
        CosmeticFields {
            name: self.name.clone(),
            brand: self.brand.clone(),
            price: self.price.clone(),
            description: self.description.clone(),
        }
    }
}

/// Cosmetic as shown on list/details/delete pages
#[derive(Debug, Clone, Serialize)]
pub struct CosmeticView {
    pub id: i32,
    pub name: String,
    pub brand: String,
    pub price: String,
    pub description: String,
    pub picture: String,
    pub created_at: String,
}

impl From<&Cosmetic> for CosmeticView {
    fn from(c: &Cosmetic) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            brand: c.brand.clone(),
            price: format!("{:.2}", c.price),
            description: c.description.clone().unwrap_or_default(),
            picture: c.picture.clone(),
            created_at: c.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Values filling the create/edit form
#[derive(Debug, Clone, Default, Serialize)]
pub struct CosmeticFormView {
    pub id: Option<i32>,
    pub name: String,
    pub brand: String,
    pub price: String,
    pub description: String,
    pub picture: Option<String>,
}

impl From<&Cosmetic> for CosmeticFormView {
    fn from(c: &Cosmetic) -> Self {
        Self {
            id: Some(c.id),
            name: c.name.clone(),
            brand: c.brand.clone(),
            price: format!("{:.2}", c.price),
            description: c.description.clone().unwrap_or_default(),
            picture: Some(c.picture.clone()),
        }
    }
}

impl From<CosmeticFields> for CosmeticFormView {
    fn from(f: CosmeticFields) -> Self {
        Self {
            id: None,
            name: f.name,
            brand: f.brand,
            price: f.price,
            description: f.description,
            picture: None,
        }
    }
}

impl From<EditCosmeticForm> for CosmeticFormView {
    fn from(f: EditCosmeticForm) -> Self {
        Self {
            id: f.id,
            name: f.name,
            brand: f.brand,
            price: f.price,
            description: f.description,
            picture: f.picture,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(name: &str, price: &str) -> CosmeticFields {
        CosmeticFields {
            name: name.to_string(),
            brand: "Maison".to_string(),
            price: price.to_string(),
            description: "  ".to_string(),
        }
    }

    #[test]
    fn test_parse_valid_fields() {
        let input = fields("  Velvet Lipstick ", "19.90").parse().unwrap();
        assert_eq!(input.name, "Velvet Lipstick");
        assert_eq!(input.price, Decimal::new(1990, 2));
        assert_eq!(input.description, None);
    }

    #[test]
    fn test_parse_collects_every_error() {
        let errors = fields("", "abc").parse().unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["price", "name"]);
        assert_eq!(errors[0].message, "Price must be a number");
        assert_eq!(errors[1].message, "Name must be 1-100 characters");
    }

    #[test]
    fn test_parse_rejects_bad_prices() {
        for price in ["-1", "1.999", "100000000", ""] {
            let errors = fields("Blush", price).parse().unwrap_err();
            assert_eq!(errors.len(), 1, "price {:?}", price);
            assert_eq!(errors[0].field, "price");
        }
        assert!(fields("Blush", "1.50").parse().is_ok());
        assert!(fields("Blush", "0").parse().is_ok());
    }

    #[test]
    fn test_parse_rejects_long_name() {
        let errors = fields(&"x".repeat(101), "1").parse().unwrap_err();
        assert_eq!(errors, vec![FieldError::new("name", "Name must be 1-100 characters")]);
    }

    #[test]
    fn test_image_check() {
        let image = UploadedImage {
            file_name: "a.png".to_string(),
            content_type: "image/png".to_string(),
            data: vec![0; 10],
        };
        assert!(image.check(10).is_none());
        assert_eq!(image.check(9).unwrap().field, IMAGE_FIELD);

        let pdf = UploadedImage {
            content_type: "application/pdf".to_string(),
            ..image
        };
        assert!(pdf.check(1024).unwrap().message.contains("not allowed"));
    }
}
