pub mod categories;
pub mod products;
pub mod search;

pub use categories::*;
pub use products::*;
pub use search::*;
