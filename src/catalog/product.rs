//! Product records and the patch/creation payloads that modify them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use xxhash_rust::xxh3::xxh3_64;

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Opaque product identifier.
///
/// Only used for equality and de-duplication; no structure is assumed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh identifier as 16 lowercase hex digits.
    ///
    /// Mixes the seed with wall-clock nanos and a process-wide counter, so two
    /// products created with the same name in the same instant still differ.
    pub fn generate(seed: &str) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let count = ID_COUNTER.fetch_add(1, Ordering::Relaxed);

        let material = format!("{seed}\u{1f}{nanos}\u{1f}{count}");
        Self(format!("{:016x}", xxh3_64(material.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub stock: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Creation time in unix milliseconds
    #[serde(default)]
    pub created_at: u64,
}

impl Product {
    /// Minimal product with only an id and a name, mostly useful in tests and fixtures.
    pub fn named(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ProductId::new(id),
            name: name.into(),
            description: None,
            category: None,
            price: 0.0,
            stock: 0,
            image_url: None,
            created_at: 0,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }

    pub fn with_created_at(mut self, created_at: u64) -> Self {
        self.created_at = created_at;
        self
    }
}

/// Validated payload for creating a product.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: f64,
    pub stock: u32,
    pub image_url: Option<String>,
}

impl NewProduct {
    /// Materialize into a stored product with a fresh id.
    pub fn into_product(self, created_at: u64) -> Product {
        Product {
            id: ProductId::generate(&self.name),
            name: self.name,
            description: self.description,
            category: self.category,
            price: self.price,
            stock: self.stock,
            image_url: self.image_url,
            created_at,
        }
    }
}

/// Partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<u32>,
    pub image_url: Option<String>,
}

impl ProductUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn apply(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(description) = self.description {
            product.description = Some(description);
        }
        if let Some(category) = self.category {
            product.category = Some(category);
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(image_url) = self.image_url {
            product.image_url = Some(image_url);
        }
    }
}

/// Current time in unix milliseconds.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}
