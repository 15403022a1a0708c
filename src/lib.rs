pub mod catalog;
pub mod config;
pub mod debounce;
pub mod error;
pub mod server;
pub mod state;
pub mod tools;
pub mod tracing;

pub use catalog::{
    CatalogStore, ListingQuery, NameStrategy, Product, ProductId, hybrid_search, search_products,
};
pub use config::CatalogConfig;
pub use debounce::Debouncer;
pub use error::{CatalogError, Result};
pub use server::CatalogServer;
pub use state::CatalogState;
