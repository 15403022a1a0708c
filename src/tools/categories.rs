//! Category listing handler.

use crate::state::CatalogState;
use rmcp::schemars;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct ListCategoriesRequest {}

/// Distinct product categories in the order they first appear.
pub async fn handle_list_categories(
    state: &Arc<CatalogState>,
    _request: ListCategoriesRequest,
) -> Result<String, String> {
    let categories = state.categories().await;
    if categories.is_empty() {
        return Ok("No categories yet.\n".to_string());
    }

    let mut output = format!("Categories ({}):\n", categories.len());
    for category in &categories {
        output.push_str(&format!("  • {}\n", category));
    }
    Ok(output)
}
