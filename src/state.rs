//! Shared state behind the MCP server.
//!
//! Owns the catalog store, the image store and a small LRU of listing results.
//! Cached listings are tagged with the store revision they were computed from,
//! so any mutation turns older entries into misses.

use crate::catalog::listing::{ListingQuery, categories};
use crate::catalog::product::Product;
use crate::catalog::storage::ImageStore;
use crate::catalog::store::{CatalogStore, JsonFileBackend, MemoryBackend};
use crate::config::CatalogConfig;
use crate::error::Result;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Maximum number of listing results kept in memory.
const LISTING_CACHE_SIZE: NonZeroUsize = NonZeroUsize::new(64).unwrap();

#[derive(Debug, Clone)]
struct CachedListing {
    revision: u64,
    products: Arc<Vec<Product>>,
}

pub struct CatalogState {
    store: CatalogStore,
    images: ImageStore,
    config: CatalogConfig,
    listings: RwLock<LruCache<ListingQuery, CachedListing>>,
}

impl std::fmt::Debug for CatalogState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogState")
            .field("store", &self.store)
            .field("images", &self.images)
            .field(
                "cache_size",
                &self.listings.try_read().map(|cache| cache.len()).ok(),
            )
            .finish()
    }
}

impl CatalogState {
    pub fn new(store: CatalogStore, images: ImageStore, config: CatalogConfig) -> Self {
        Self {
            store,
            images,
            config,
            listings: RwLock::new(LruCache::new(LISTING_CACHE_SIZE)),
        }
    }

    /// Build the backend named by `config`, open the store and the image bucket.
    pub fn from_config(config: CatalogConfig) -> Result<Self> {
        let store = match &config.catalog_path {
            Some(path) => CatalogStore::open(JsonFileBackend::new(path))?,
            None => {
                tracing::warn!("No CATALOG_PATH configured, catalog changes will not be saved");
                CatalogStore::open(MemoryBackend::new())?
            }
        };

        let images = ImageStore::new(
            &config.image_dir,
            &config.public_url,
            &config.bucket,
            config.max_image_mb,
        );

        Ok(Self::new(store, images, config))
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Run a storefront query, reusing a cached result when the catalog has not
    /// changed since it was computed.
    pub async fn listing(&self, query: &ListingQuery) -> Arc<Vec<Product>> {
        {
            let mut cache = self.listings.write().await;
            if let Some(cached) = cache.get(query)
                && cached.revision == self.store.revision()
            {
                tracing::debug!("Listing cache hit for {:?}", query.term);
                return Arc::clone(&cached.products);
            }
        }

        let (revision, products) = self.store.snapshot().await;
        let listed: Vec<Product> = query
            .apply(&products, self.config.name_strategy)
            .into_iter()
            .cloned()
            .collect();
        let listed = Arc::new(listed);

        self.listings.write().await.put(
            query.clone(),
            CachedListing {
                revision,
                products: Arc::clone(&listed),
            },
        );
        tracing::debug!(
            "Cached listing for {:?} ({} products, revision {})",
            query.term,
            listed.len(),
            revision
        );

        listed
    }

    /// Distinct categories across the whole catalog.
    pub async fn categories(&self) -> Vec<String> {
        let products = self.store.all().await;
        categories(&products)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub async fn is_cached(&self, query: &ListingQuery) -> bool {
        self.listings
            .read()
            .await
            .peek(query)
            .is_some_and(|cached| cached.revision == self.store.revision())
    }
}
