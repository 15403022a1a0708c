//! Shared test fixtures and utilities for integration tests.
//!
//! # Test Isolation Strategy
//!
//! Every test gets its own temporary directory holding a `catalog.json` and an
//! image bucket, plus a fresh `CatalogState` with an empty listing cache. Tests
//! can therefore run in parallel and mutate the catalog freely.
//!
//! # Available Fixtures
//!
//! - `isolated_catalog`: the furniture catalog from [`furniture`], file backed
//! - `empty_catalog`: a file-backed catalog with no products yet

use catalog_mcp::catalog::Product;
use catalog_mcp::{CatalogConfig, CatalogState};
use rstest::fixture;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// A temporary directory that is removed when dropped.
#[allow(dead_code)] // Methods used across different integration test crates
pub struct TempWorkspace {
    _temp: TempDir,
    root: PathBuf,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl TempWorkspace {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path().to_path_buf();
        Self { _temp: temp, root }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Creates a file with the given content, creating parent directories.
    ///
    /// # Panics
    /// Panics if file creation fails.
    pub fn create_file(&self, path: &str, content: &str) {
        let full_path = self.root.join(path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap_or_else(|e| {
                panic!("Failed to create parent directory for '{}': {}", path, e)
            });
        }
        std::fs::write(&full_path, content)
            .unwrap_or_else(|e| panic!("Failed to write file '{}': {}", path, e));
    }

    pub fn read_file(&self, path: &str) -> String {
        std::fs::read_to_string(self.root.join(path))
            .unwrap_or_else(|e| panic!("Failed to read file '{}': {}", path, e))
    }
}

impl Default for TempWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// A catalog persisted to a temp directory, with the state serving it.
#[allow(dead_code)] // Fields used across different integration test crates
pub struct IsolatedCatalog {
    workspace: TempWorkspace,
    pub state: Arc<CatalogState>,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl IsolatedCatalog {
    pub fn with_products(products: &[Product]) -> Self {
        catalog_mcp::tracing::init();

        let workspace = TempWorkspace::new();
        let json = serde_json::to_string_pretty(products).expect("Failed to serialize products");
        workspace.create_file("catalog.json", &json);

        let config = CatalogConfig {
            catalog_path: Some(workspace.path().join("catalog.json")),
            image_dir: workspace.path().join("images"),
            public_url: "http://localhost:8080/storage".to_string(),
            ..CatalogConfig::default()
        };
        let state = CatalogState::from_config(config).expect("Failed to open catalog");

        Self {
            workspace,
            state: Arc::new(state),
        }
    }

    pub fn root(&self) -> &Path {
        self.workspace.path()
    }

    /// Products as currently persisted on disk.
    pub fn persisted(&self) -> Vec<Product> {
        serde_json::from_str(&self.workspace.read_file("catalog.json"))
            .expect("Persisted catalog is not valid JSON")
    }
}

/// Twelve products across three categories, oldest first.
#[allow(dead_code)] // Used across different integration test crates
pub fn furniture() -> Vec<Product> {
    [
        ("p01", "Oak Dining Table", "Seats six", "Furniture", 450.0),
        ("p02", "Walnut Side Table", "Compact and sturdy", "Furniture", 120.0),
        ("p03", "Brass Table Lamp", "Warm light for reading", "Lighting", 65.0),
        ("p04", "Floor Lamp", "Adjustable arm", "Lighting", 89.0),
        ("p05", "Wool Rug", "Hand woven", "Textiles", 210.0),
        ("p06", "Linen Cushion", "Pairs with any table setting", "Textiles", 25.0),
        ("p07", "Pendant Light", "Hangs over a dining table", "Lighting", 140.0),
        ("p08", "Bar Stool", "Counter height", "Furniture", 75.0),
        ("p09", "Throw Blanket", "Soft cotton", "Textiles", 45.0),
        ("p10", "Bookshelf", "Five shelves", "Furniture", 180.0),
        ("p11", "Desk Lamp", "LED with dimmer", "Lighting", 55.0),
        ("p12", "Coffee Table", "Glass top", "Furniture", 160.0),
    ]
    .into_iter()
    .enumerate()
    .map(|(idx, (id, name, description, category, price))| {
        Product::named(id, name)
            .with_description(description)
            .with_category(category)
            .with_price(price)
            .with_created_at(1_000 + idx as u64)
    })
    .collect()
}

/// `count` filler products named `Item NN` whose descriptions never match
/// common search terms.
#[allow(dead_code)] // Used across different integration test crates
pub fn filler(count: usize) -> Vec<Product> {
    (0..count)
        .map(|idx| {
            Product::named(format!("f{:02}", idx), format!("Item {:02}", idx))
                .with_description("Generic stock")
                .with_category("Misc")
        })
        .collect()
}

#[allow(dead_code)] // Used across different integration test crates
#[fixture]
pub fn isolated_catalog() -> IsolatedCatalog {
    IsolatedCatalog::with_products(&furniture())
}

#[allow(dead_code)] // Used across different integration test crates
#[fixture]
pub fn empty_catalog() -> IsolatedCatalog {
    IsolatedCatalog::with_products(&[])
}
