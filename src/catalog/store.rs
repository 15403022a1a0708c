//! Catalog storage: pluggable backends and the CRUD store built on them.
//!
//! The store is constructed explicitly from a backend and handed to whatever
//! needs it; there is no process-wide client. Products live in memory behind a
//! tokio `RwLock` and every mutation is written through to the backend.

use super::pagination::Page;
use super::product::{NewProduct, Product, ProductId, ProductUpdate, now_millis};
use crate::error::{CatalogError, Result};
use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// Where a catalog is loaded from and saved to.
pub trait CatalogBackend: Send + Sync {
    /// Load every product.
    fn load(&self) -> Result<Vec<Product>>;

    /// Replace the stored catalog with `products`.
    fn persist(&self, products: &[Product]) -> Result<()>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

/// Backend that keeps the catalog in memory only.
///
/// Records how many times it was persisted to, which makes it a convenient
/// stand-in for a real backend in tests.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    products: Mutex<Vec<Product>>,
    persists: AtomicU64,
    fail_persist: bool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(products: Vec<Product>) -> Self {
        Self {
            products: Mutex::new(products),
            ..Self::default()
        }
    }

    /// A backend whose `persist` always fails.
    pub fn failing() -> Self {
        Self::seeded_failing(Vec::new())
    }

    /// Loads `products` but refuses every `persist`.
    pub fn seeded_failing(products: Vec<Product>) -> Self {
        Self {
            products: Mutex::new(products),
            fail_persist: true,
            ..Self::default()
        }
    }

    pub fn persist_count(&self) -> u64 {
        self.persists.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> Vec<Product> {
        self.products
            .lock()
            .map(|products| products.clone())
            .unwrap_or_default()
    }
}

impl CatalogBackend for MemoryBackend {
    fn load(&self) -> Result<Vec<Product>> {
        let products = self
            .products
            .lock()
            .map_err(|_| anyhow::anyhow!("memory backend lock poisoned"))?;
        Ok(products.clone())
    }

    fn persist(&self, products: &[Product]) -> Result<()> {
        if self.fail_persist {
            anyhow::bail!("memory backend configured to fail");
        }
        let mut stored = self
            .products
            .lock()
            .map_err(|_| anyhow::anyhow!("memory backend lock poisoned"))?;
        *stored = products.to_vec();
        self.persists.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// Backend storing the catalog as a JSON array in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CatalogBackend for JsonFileBackend {
    /// A missing file is an empty catalog.
    fn load(&self) -> Result<Vec<Product>> {
        if !self.path.exists() {
            tracing::info!(
                "Catalog file {} does not exist yet, starting empty",
                self.path.display()
            );
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read catalog {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse catalog {}", self.path.display()))
    }

    /// Writes to a sibling temp file and renames it over the catalog.
    fn persist(&self, products: &[Product]) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let content =
            serde_json::to_string_pretty(products).context("Failed to serialize catalog")?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(anyhow::Error::new(e)
                .context(format!("Failed to replace catalog {}", self.path.display())));
        }
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory product catalog with write-through persistence.
///
/// Backend writes run on the blocking pool while the write lock is held, so
/// persisted snapshots land in mutation order.
pub struct CatalogStore {
    backend: Arc<dyn CatalogBackend>,
    products: RwLock<Vec<Product>>,
    revision: AtomicU64,
}

impl std::fmt::Debug for CatalogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogStore")
            .field("backend", &self.backend.describe())
            .field("revision", &self.revision())
            .finish_non_exhaustive()
    }
}

impl CatalogStore {
    /// Load the catalog from `backend`.
    pub fn open(backend: impl CatalogBackend + 'static) -> Result<Self> {
        let products = backend
            .load()
            .with_context(|| format!("Failed to open catalog at {}", backend.describe()))?;

        tracing::info!(
            "Loaded {} products from {}",
            products.len(),
            backend.describe()
        );

        Ok(Self {
            backend: Arc::new(backend),
            products: RwLock::new(products),
            revision: AtomicU64::new(0),
        })
    }

    /// Bumped by every successful mutation.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    pub async fn len(&self) -> usize {
        self.products.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.products.read().await.is_empty()
    }

    /// Snapshot of every product in stored order, with the revision it reflects.
    pub async fn snapshot(&self) -> (u64, Vec<Product>) {
        let products = self.products.read().await;
        (self.revision(), products.clone())
    }

    pub async fn all(&self) -> Vec<Product> {
        self.products.read().await.clone()
    }

    /// One page of products whose name contains `term` (case-insensitive),
    /// newest first. `page` is zero-based.
    pub async fn list(&self, page: usize, page_size: usize, term: &str) -> Page<Product> {
        let needle = term.trim().to_lowercase();
        let products = self.products.read().await;

        let mut matching: Vec<&Product> = products
            .iter()
            .filter(|product| needle.is_empty() || product.name.to_lowercase().contains(&needle))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Page::slice(matching, page, page_size).map(Product::clone)
    }

    pub async fn get(&self, id: &ProductId) -> std::result::Result<Product, CatalogError> {
        self.products
            .read()
            .await
            .iter()
            .find(|product| &product.id == id)
            .cloned()
            .ok_or_else(|| CatalogError::not_found(id))
    }

    pub async fn create(&self, new: NewProduct) -> std::result::Result<Product, CatalogError> {
        let product = new.into_product(now_millis());

        let mut products = self.products.write().await;
        products.push(product.clone());

        if let Err(e) = self.persist(&products).await {
            products.pop();
            return Err(e);
        }

        tracing::info!("Created product {} ({})", product.id, product.name);
        Ok(product)
    }

    pub async fn update(
        &self,
        id: &ProductId,
        update: ProductUpdate,
    ) -> std::result::Result<Product, CatalogError> {
        let mut products = self.products.write().await;
        let index = products
            .iter()
            .position(|product| &product.id == id)
            .ok_or_else(|| CatalogError::not_found(id))?;

        let previous = products[index].clone();
        update.apply(&mut products[index]);

        if let Err(e) = self.persist(&products).await {
            products[index] = previous;
            return Err(e);
        }

        tracing::info!("Updated product {}", id);
        Ok(products[index].clone())
    }

    pub async fn delete(&self, id: &ProductId) -> std::result::Result<Product, CatalogError> {
        let mut products = self.products.write().await;
        let index = products
            .iter()
            .position(|product| &product.id == id)
            .ok_or_else(|| CatalogError::not_found(id))?;

        let removed = products.remove(index);

        if let Err(e) = self.persist(&products).await {
            products.insert(index, removed);
            return Err(e);
        }

        tracing::info!("Deleted product {} ({})", removed.id, removed.name);
        Ok(removed)
    }

    /// Write through to the backend and bump the revision on success.
    async fn persist(&self, products: &[Product]) -> std::result::Result<(), CatalogError> {
        let backend = Arc::clone(&self.backend);
        let snapshot = products.to_vec();

        // Serialization and file I/O are blocking
        let result = tokio::task::spawn_blocking(move || backend.persist(&snapshot))
            .await
            .context("Catalog persist task failed")
            .and_then(|result| result);

        result.map_err(|e| {
            tracing::error!("Failed to persist catalog to {}: {:#}", self.backend.describe(), e);
            CatalogError::Backend(e)
        })?;
        self.revision.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}
