//! Product catalog: model, search, listing and persistence.

pub mod listing;
pub mod pagination;
pub mod product;
pub mod search;
pub mod storage;
pub mod store;
pub mod validation;

pub use listing::{CategoryFilter, ListingQuery, SortOrder, categories};
pub use pagination::{Page, PageLink, page_window, render_window, total_pages};
pub use product::{NewProduct, Product, ProductId, ProductUpdate};
pub use search::{
    LINEAR_SCAN_THRESHOLD, NameStrategy, binary_search_by_name, filter_by_name, hybrid_search,
    hybrid_search_with, search_products, search_products_with,
};
pub use storage::ImageStore;
pub use store::{CatalogBackend, CatalogStore, JsonFileBackend, MemoryBackend};
pub use validation::{FormErrors, ImageError, ProductForm, ProductPatch, validate_image};
