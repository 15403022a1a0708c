//! Input validation for product forms and image uploads.

use super::product::{NewProduct, ProductUpdate};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Minimum length of a trimmed product name.
pub const MIN_NAME_LEN: usize = 3;

/// Default upload limit in MiB.
pub const DEFAULT_MAX_IMAGE_MB: u64 = 5;

/// Content types accepted for product images.
pub const IMAGE_CONTENT_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

/// Field-level validation failures, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<&'static str, String>);

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for FormErrors {}

/// Raw product form input as typed by a user.
#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub price: String,
    pub category: Option<String>,
    pub stock: Option<String>,
    pub image_url: Option<String>,
}

impl ProductForm {
    /// Check every field, collecting all failures rather than stopping at the first.
    pub fn validate(&self) -> Result<NewProduct, FormErrors> {
        let mut errors = FormErrors::default();

        let name = check_name(&self.name, &mut errors);
        let description = self.description.trim();
        if description.is_empty() {
            errors.add("description", "description is required");
        }
        let price = check_price(&self.price, &mut errors);
        let stock = self
            .stock
            .as_deref()
            .and_then(|raw| check_stock(raw, &mut errors));

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(NewProduct {
            name,
            description: Some(description.to_string()),
            category: non_blank(self.category.as_deref()),
            price: price.unwrap_or_default(),
            stock: stock.unwrap_or_default(),
            image_url: non_blank(self.image_url.as_deref()),
        })
    }
}

/// Raw patch input; absent fields are left alone, present ones follow the form rules.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub category: Option<String>,
    pub stock: Option<String>,
    pub image_url: Option<String>,
}

impl ProductPatch {
    pub fn validate(&self) -> Result<ProductUpdate, FormErrors> {
        let mut errors = FormErrors::default();

        let name = self
            .name
            .as_deref()
            .map(|raw| check_name(raw, &mut errors));
        let description = self.description.as_deref().map(str::trim).map(|d| {
            if d.is_empty() {
                errors.add("description", "description is required");
            }
            d.to_string()
        });
        let price = self
            .price
            .as_deref()
            .and_then(|raw| check_price(raw, &mut errors));
        let stock = self
            .stock
            .as_deref()
            .and_then(|raw| check_stock(raw, &mut errors));

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ProductUpdate {
            name,
            description,
            category: non_blank(self.category.as_deref()),
            price,
            stock,
            image_url: non_blank(self.image_url.as_deref()),
        })
    }
}

fn check_name(raw: &str, errors: &mut FormErrors) -> String {
    let name = raw.trim();
    if name.is_empty() {
        errors.add("name", "name is required");
    } else if name.chars().count() < MIN_NAME_LEN {
        errors.add(
            "name",
            format!("name must be at least {} characters", MIN_NAME_LEN),
        );
    }
    name.to_string()
}

fn check_price(raw: &str, errors: &mut FormErrors) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        errors.add("price", "price is required");
        return None;
    }

    match raw.parse::<f64>() {
        Ok(price) if price.is_finite() && price >= 0.0 => Some(price),
        _ => {
            errors.add("price", "price must be a valid non-negative number");
            None
        }
    }
}

fn check_stock(raw: &str, errors: &mut FormErrors) -> Option<u32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    match raw.parse::<u32>() {
        Ok(stock) => Some(stock),
        Err(_) => {
            errors.add("stock", "stock must be a non-negative whole number");
            None
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Reasons an image upload is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("unsupported image format '{0}' (use JPG, PNG, GIF or WebP)")]
    UnsupportedType(String),
    #[error("image too large: {size} bytes exceeds the {max_mb}MB limit")]
    TooLarge { size: u64, max_mb: u64 },
}

/// Accept only known image content types no larger than `max_mb` MiB.
pub fn validate_image(content_type: &str, size: u64, max_mb: u64) -> Result<(), ImageError> {
    let content_type = content_type.trim().to_ascii_lowercase();
    if !IMAGE_CONTENT_TYPES.contains(&content_type.as_str()) {
        return Err(ImageError::UnsupportedType(content_type));
    }

    let max_bytes = max_mb.saturating_mul(1024 * 1024);
    if size > max_bytes {
        return Err(ImageError::TooLarge { size, max_mb });
    }

    Ok(())
}
