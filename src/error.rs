//! Error handling types and utilities.

use crate::catalog::product::ProductId;
use crate::catalog::validation::{FormErrors, ImageError};
use thiserror::Error;

/// A specialized Result type for catalog-mcp plumbing.
///
/// This is an alias for `anyhow::Result` with context added via `.context()` and
/// `.with_context()` methods throughout the codebase.
pub type Result<T> = anyhow::Result<T>;

/// Errors returned by catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No product with the given id.
    #[error("product '{id}' not found")]
    NotFound { id: ProductId },

    /// Form input failed validation.
    #[error("invalid product: {0}")]
    Invalid(#[from] FormErrors),

    /// Image rejected before upload.
    #[error(transparent)]
    InvalidImage(#[from] ImageError),

    /// Image URL does not point into the configured bucket.
    #[error("invalid image URL '{url}'")]
    InvalidImageUrl { url: String },

    /// Requested object name is empty or escapes the bucket.
    #[error("invalid image name '{name}'")]
    InvalidImageName { name: String },

    /// An object with this name already exists in the bucket.
    #[error("image '{name}' already exists")]
    ImageExists { name: String },

    /// The backend failed to load or persist the catalog.
    #[error("catalog backend error: {0:#}")]
    Backend(#[source] anyhow::Error),
}

impl CatalogError {
    pub fn not_found(id: &ProductId) -> Self {
        Self::NotFound { id: id.clone() }
    }
}

/// Errors raised while assembling configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}
