//! Storefront search handler: search, filter, sort and paginate.

use crate::catalog::listing::{CategoryFilter, ListingQuery, SortOrder};
use crate::catalog::pagination::{Page, render_window};
use crate::catalog::product::Product;
use crate::state::CatalogState;
use rapidfuzz::distance::jaro_winkler;
use rmcp::schemars;
use serde::Deserialize;
use std::fmt::Write as _;
use std::sync::Arc;

/// Similarity a product name needs to be offered as a suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.7;

const MAX_SUGGESTIONS: usize = 5;

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct SearchProductsRequest {
    /// Text matched against product names and descriptions (case-insensitive)
    #[serde(default)]
    pub query: Option<String>,
    /// Category to restrict results to; "all" or omitted means every category
    #[serde(default)]
    pub category: Option<String>,
    /// One of: relevance, price_asc, price_desc, name_asc, name_desc
    #[serde(default)]
    pub sort: Option<String>,
    /// One-based page number (default: 1)
    #[serde(default)]
    pub page: Option<usize>,
    /// Products per page (default: configured page size)
    #[serde(default)]
    pub page_size: Option<usize>,
}

/// Run a storefront query and format one page of it.
pub async fn handle_search_products(
    state: &Arc<CatalogState>,
    request: SearchProductsRequest,
) -> Result<String, String> {
    let term = request.query.as_deref().unwrap_or_default().trim();
    let query = ListingQuery::new(term)
        .with_category(CategoryFilter::parse(request.category.as_deref()))
        .with_sort(SortOrder::parse_lenient(
            request.sort.as_deref().unwrap_or_default(),
        ));

    let page_size = request
        .page_size
        .unwrap_or(state.config().page_size)
        .max(1);
    let page_number = request.page.unwrap_or(1).max(1);

    let listed = state.listing(&query).await;
    tracing::debug!(
        "search_products '{}' matched {} products",
        term,
        listed.len()
    );

    if listed.is_empty() {
        let names: Vec<String> = state
            .store()
            .all()
            .await
            .into_iter()
            .map(|product| product.name)
            .collect();
        return Ok(format_no_results(&query, &suggest_names(term, &names)));
    }

    let page = Page::slice(listed.iter().collect(), page_number - 1, page_size);
    if page.items.is_empty() {
        return Err(format!(
            "Page {} is out of range, there are {} pages",
            page_number,
            page.total_pages()
        ));
    }

    Ok(format_search_results(&query, &page))
}

/// Product names close to `term`, best first.
pub fn suggest_names(term: &str, names: &[String]) -> Vec<String> {
    if term.is_empty() {
        return Vec::new();
    }

    let needle = term.to_lowercase();
    let mut scored: Vec<(f64, &String)> = names
        .iter()
        .map(|name| {
            let score = jaro_winkler::similarity(needle.chars(), name.to_lowercase().chars());
            (score, name)
        })
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut suggestions: Vec<String> = Vec::new();
    for (_, name) in scored {
        if !suggestions.contains(name) {
            suggestions.push(name.clone());
        }
        if suggestions.len() == MAX_SUGGESTIONS {
            break;
        }
    }
    suggestions
}

fn describe_query(query: &ListingQuery) -> String {
    let mut description = if query.term.is_empty() {
        "All products".to_string()
    } else {
        format!("Products matching '{}'", query.term)
    };
    if let CategoryFilter::Only(category) = &query.category {
        let _ = write!(description, " in '{}'", category);
    }
    if query.sort != SortOrder::Relevance {
        let _ = write!(description, " sorted by {}", query.sort);
    }
    description
}

fn format_no_results(query: &ListingQuery, suggestions: &[String]) -> String {
    let mut output = format!("No results found. {}: none.\n", describe_query(query));

    if !suggestions.is_empty() {
        output.push_str("\nDid you mean:\n");
        for name in suggestions {
            let _ = writeln!(output, "• {}", name);
        }
    } else if !query.term.is_empty() {
        output.push_str("\nTry a shorter term or search all categories.\n");
    }

    output
}

fn format_search_results(query: &ListingQuery, page: &Page<&Product>) -> String {
    let current = page.page + 1;
    let mut output = format!(
        "{} ({} total, page {} of {}):\n\n",
        describe_query(query),
        page.count,
        current,
        page.total_pages()
    );

    let offset = page.offset();
    for (idx, product) in page.items.iter().enumerate() {
        output.push_str(&format_product_line(offset + idx + 1, product));
    }

    let window = render_window(current, page.total_pages());
    if !window.is_empty() {
        let _ = writeln!(output, "Pages: {}", window);
    }

    output
}

/// Numbered summary of a product used in listings.
pub(crate) fn format_product_line(position: usize, product: &Product) -> String {
    let mut line = format!(
        "{}. `{}` ({}) - ${:.2}",
        position, product.name, product.id, product.price
    );
    if let Some(category) = &product.category {
        let _ = write!(line, " [{}]", category);
    }
    line.push('\n');

    if let Some(first_line) = product
        .description
        .as_deref()
        .and_then(|docs| docs.lines().find(|line| !line.trim().is_empty()))
    {
        let _ = writeln!(line, "   {}", first_line.trim());
    }

    line.push('\n');
    line
}
