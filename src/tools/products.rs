//! Product management handlers: list, get, create, update, delete.

use super::search::format_product_line;
use crate::catalog::pagination::render_window;
use crate::catalog::product::{Product, ProductId};
use crate::catalog::validation::{ProductForm, ProductPatch};
use crate::error::CatalogError;
use crate::state::CatalogState;
use rmcp::schemars;
use serde::Deserialize;
use std::fmt::Write as _;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct ListProductsRequest {
    /// One-based page number (default: 1)
    #[serde(default)]
    pub page: Option<usize>,
    /// Products per page (default: configured page size)
    #[serde(default)]
    pub page_size: Option<usize>,
    /// Only products whose name contains this text (case-insensitive)
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ProductIdRequest {
    /// Product identifier
    pub id: String,
}

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct CreateProductRequest {
    /// Product name (at least 3 characters)
    pub name: String,
    pub description: String,
    /// Non-negative decimal price, e.g. "19.99"
    pub price: String,
    #[serde(default)]
    pub category: Option<String>,
    /// Whole number of units in stock (default: 0)
    #[serde(default)]
    pub stock: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct UpdateProductRequest {
    /// Product identifier
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub stock: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Admin listing: newest first, optionally filtered by name.
pub async fn handle_list_products(
    state: &Arc<CatalogState>,
    request: ListProductsRequest,
) -> Result<String, String> {
    let page_size = request
        .page_size
        .unwrap_or(state.config().page_size)
        .max(1);
    let page_number = request.page.unwrap_or(1).max(1);
    let term = request.query.as_deref().unwrap_or_default();

    let page = state.store().list(page_number - 1, page_size, term).await;

    if page.count == 0 {
        return Ok(if term.trim().is_empty() {
            "The catalog is empty.\n".to_string()
        } else {
            format!("No products with a name containing '{}'.\n", term.trim())
        });
    }

    if page.items.is_empty() {
        return Err(format!(
            "Page {} is out of range, there are {} pages",
            page_number,
            page.total_pages()
        ));
    }

    let mut output = format!(
        "Products ({} total, page {} of {}):\n\n",
        page.count,
        page_number,
        page.total_pages()
    );
    let offset = page.offset();
    for (idx, product) in page.items.iter().enumerate() {
        output.push_str(&format_product_line(offset + idx + 1, product));
    }

    let window = render_window(page_number, page.total_pages());
    if !window.is_empty() {
        let _ = writeln!(output, "Pages: {}", window);
    }

    Ok(output)
}

pub async fn handle_get_product(
    state: &Arc<CatalogState>,
    request: ProductIdRequest,
) -> Result<String, String> {
    let id = ProductId::new(request.id.trim());
    let product = state.store().get(&id).await.map_err(|e| e.to_string())?;
    Ok(format_product(&product))
}

pub async fn handle_create_product(
    state: &Arc<CatalogState>,
    request: CreateProductRequest,
) -> Result<String, String> {
    let form = ProductForm {
        name: request.name,
        description: request.description,
        price: request.price,
        category: request.category,
        stock: request.stock,
        image_url: request.image_url,
    };

    let new = form
        .validate()
        .map_err(|errors| CatalogError::from(errors).to_string())?;
    let product = state.store().create(new).await.map_err(|e| e.to_string())?;

    Ok(format!("Created product:\n\n{}", format_product(&product)))
}

pub async fn handle_update_product(
    state: &Arc<CatalogState>,
    request: UpdateProductRequest,
) -> Result<String, String> {
    let patch = ProductPatch {
        name: request.name,
        description: request.description,
        price: request.price,
        category: request.category,
        stock: request.stock,
        image_url: request.image_url,
    };

    let update = patch
        .validate()
        .map_err(|errors| CatalogError::from(errors).to_string())?;
    if update.is_empty() {
        return Err("Nothing to update: provide at least one field".to_string());
    }

    let id = ProductId::new(request.id.trim());
    let product = state
        .store()
        .update(&id, update)
        .await
        .map_err(|e| e.to_string())?;

    Ok(format!("Updated product:\n\n{}", format_product(&product)))
}

/// Remove a product, then its image when the image lives in our bucket.
pub async fn handle_delete_product(
    state: &Arc<CatalogState>,
    request: ProductIdRequest,
) -> Result<String, String> {
    let id = ProductId::new(request.id.trim());
    let removed = state.store().delete(&id).await.map_err(|e| e.to_string())?;

    let mut output = format!("Deleted product `{}` ({}).\n", removed.name, removed.id);

    if let Some(url) = removed.image_url.as_deref()
        && state.images().owns(url)
    {
        match state.images().delete(url).await {
            Ok(()) => output.push_str("Removed its image.\n"),
            Err(e) => {
                tracing::warn!("Failed to delete image for product {}: {}", removed.id, e);
                output.push_str("Its image could not be removed.\n");
            }
        }
    }

    Ok(output)
}

/// Full product details.
fn format_product(product: &Product) -> String {
    let mut output = format!("`{}`\n", product.name);
    let _ = writeln!(output, "  id: {}", product.id);
    let _ = writeln!(output, "  price: ${:.2}", product.price);
    let _ = writeln!(output, "  stock: {}", product.stock);
    if let Some(category) = &product.category {
        let _ = writeln!(output, "  category: {}", category);
    }
    if let Some(url) = &product.image_url {
        let _ = writeln!(output, "  image: {}", url);
    }
    if let Some(description) = &product.description {
        let _ = write!(output, "\n{}\n", description.trim());
    }
    output
}
