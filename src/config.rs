//! Runtime configuration.
//!
//! Built once at startup from defaults, an optional TOML file and environment
//! variables (highest priority), then passed to whatever needs it.

use crate::catalog::search::NameStrategy;
use crate::catalog::storage::DEFAULT_BUCKET;
use crate::catalog::validation::DEFAULT_MAX_IMAGE_MB;
use crate::error::ConfigError;
use serde::Deserialize;
use std::borrow::Cow;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

/// Environment variable naming an optional TOML config file.
pub const CONFIG_FILE_VAR: &str = "CATALOG_CONFIG";

/// Items per page on the storefront listing.
pub const DEFAULT_PAGE_SIZE: usize = 9;

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// JSON catalog file; `None` keeps the catalog in memory only
    pub catalog_path: Option<PathBuf>,
    /// Directory holding image buckets
    pub image_dir: PathBuf,
    /// Base URL images are served from
    pub public_url: String,
    pub bucket: String,
    pub page_size: usize,
    pub max_image_mb: u64,
    pub name_strategy: NameStrategy,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            image_dir: PathBuf::from("images"),
            public_url: "http://localhost:8080/storage".to_string(),
            bucket: DEFAULT_BUCKET.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            max_image_mb: DEFAULT_MAX_IMAGE_MB,
            name_strategy: NameStrategy::default(),
        }
    }
}

/// Optional overrides as read from a TOML file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub catalog_path: Option<String>,
    pub image_dir: Option<String>,
    pub public_url: Option<String>,
    pub bucket: Option<String>,
    pub page_size: Option<usize>,
    pub max_image_mb: Option<u64>,
    pub name_strategy: Option<NameStrategy>,
}

impl FileConfig {
    pub fn parse(content: &str, path: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }
}

impl CatalogConfig {
    /// Load from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` in place of the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = lookup(CONFIG_FILE_VAR) {
            let path = expand_tilde(&path).into_owned();
            let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
            config.apply_file(FileConfig::parse(&content, &path)?);
            tracing::debug!("Applied config file {}", path);
        }

        config.apply_env(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_file(&mut self, file: FileConfig) {
        if let Some(path) = file.catalog_path {
            self.catalog_path = Some(PathBuf::from(expand_tilde(&path).as_ref()));
        }
        if let Some(dir) = file.image_dir {
            self.image_dir = PathBuf::from(expand_tilde(&dir).as_ref());
        }
        if let Some(url) = file.public_url {
            self.public_url = url;
        }
        if let Some(bucket) = file.bucket {
            self.bucket = bucket;
        }
        if let Some(page_size) = file.page_size {
            self.page_size = page_size;
        }
        if let Some(mb) = file.max_image_mb {
            self.max_image_mb = mb;
        }
        if let Some(strategy) = file.name_strategy {
            self.name_strategy = strategy;
        }
    }

    fn apply_env(&mut self, lookup: &impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(path) = lookup("CATALOG_PATH") {
            self.catalog_path = Some(PathBuf::from(expand_tilde(&path).as_ref()));
        }
        if let Some(dir) = lookup("CATALOG_IMAGE_DIR") {
            self.image_dir = PathBuf::from(expand_tilde(&dir).as_ref());
        }
        if let Some(url) = lookup("CATALOG_PUBLIC_URL") {
            self.public_url = url;
        }
        if let Some(bucket) = lookup("CATALOG_BUCKET") {
            self.bucket = bucket;
        }
        if let Some(page_size) = parse_var(lookup, "CATALOG_PAGE_SIZE")? {
            self.page_size = page_size;
        }
        if let Some(mb) = parse_var(lookup, "CATALOG_MAX_IMAGE_MB")? {
            self.max_image_mb = mb;
        }
        if let Some(strategy) = parse_var(lookup, "CATALOG_NAME_STRATEGY")? {
            self.name_strategy = strategy;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(invalid("page_size", "must be greater than zero"));
        }
        if self.bucket.trim().is_empty() || self.bucket.contains('/') {
            return Err(invalid("bucket", "must be a non-empty name without '/'"));
        }
        if self.public_url.trim().is_empty() {
            return Err(invalid("public_url", "must not be empty"));
        }
        Ok(())
    }
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.into(),
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };

    raw.trim().parse().map(Some).map_err(|e: T::Err| {
        tracing::warn!("Invalid {} value '{}': {}", key, raw, e);
        invalid(key, e.to_string())
    })
}

/// Expands tilde (`~`) in a path to the user's home directory.
///
/// - `~/foo` becomes `/home/user/foo`
/// - `~` becomes `/home/user`
/// - Other paths are returned unchanged
pub fn expand_tilde(path: &str) -> Cow<'_, str> {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return Cow::Owned(home.join(stripped).display().to_string());
        }
    } else if path == "~"
        && let Some(home) = dirs::home_dir()
    {
        return Cow::Owned(home.display().to_string());
    }
    Cow::Borrowed(path)
}
