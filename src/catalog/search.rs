//! In-memory product search.
//!
//! Filters a product list by a free-text term against `name` and `description`.
//! Small lists get a direct scan; larger ones go through a two-phase match that
//! puts name hits (in name order) ahead of description-only hits.
//!
//! Every function here borrows its input and returns references into it, so the
//! caller's list is never reordered or modified.

use super::product::{Product, ProductId};
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lists shorter than this are scanned directly in input order.
pub const LINEAR_SCAN_THRESHOLD: usize = 20;

/// How the name-phase of a large-list search finds its matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameStrategy {
    /// Scan every product, then sort the hits by name.
    #[default]
    Exhaustive,
    /// Binary-search the name-sorted list for one hit and grow a contiguous run
    /// around it. Substring matches are not contiguous under lexicographic order,
    /// so hits outside that run are missed.
    Contiguous,
}

impl FromStr for NameStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exhaustive" => Ok(Self::Exhaustive),
            "contiguous" | "binary" => Ok(Self::Contiguous),
            other => Err(format!(
                "unknown name strategy '{}' (expected 'exhaustive' or 'contiguous')",
                other
            )),
        }
    }
}

impl fmt::Display for NameStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhaustive => f.write_str("exhaustive"),
            Self::Contiguous => f.write_str("contiguous"),
        }
    }
}

fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn name_matches(product: &Product, needle: &str) -> bool {
    contains_folded(&product.name, needle)
}

/// An absent description never matches.
fn description_matches(product: &Product, needle: &str) -> bool {
    product
        .description
        .as_deref()
        .is_some_and(|description| contains_folded(description, needle))
}

/// Products paired with their lowercased name, sorted by that name.
///
/// The sort is stable, so products with equal names keep their input order.
fn sorted_by_name(products: &[Product]) -> Vec<(String, &Product)> {
    let mut sorted: Vec<(String, &Product)> = products
        .iter()
        .map(|product| (product.name.to_lowercase(), product))
        .collect();
    sorted.sort_by(|(a, _), (b, _)| a.cmp(b));
    sorted
}

/// Search with the default name strategy.
pub fn hybrid_search<'a>(products: &'a [Product], term: &str) -> Vec<&'a Product> {
    hybrid_search_with(products, term, NameStrategy::default())
}

/// Search `products` for `term`, picking the strategy by list size.
///
/// - empty term: every product, in input order
/// - fewer than [`LINEAR_SCAN_THRESHOLD`] products: name or description hits, in input order
/// - otherwise: [`search_products_with`]
pub fn hybrid_search_with<'a>(
    products: &'a [Product],
    term: &str,
    strategy: NameStrategy,
) -> Vec<&'a Product> {
    if term.is_empty() {
        return products.iter().collect();
    }

    if products.len() < LINEAR_SCAN_THRESHOLD {
        let needle = term.to_lowercase();
        return products
            .iter()
            .filter(|product| {
                name_matches(product, &needle) || description_matches(product, &needle)
            })
            .collect();
    }

    search_products_with(products, term, strategy)
}

/// Two-phase search with the default name strategy.
pub fn search_products<'a>(products: &'a [Product], term: &str) -> Vec<&'a Product> {
    search_products_with(products, term, NameStrategy::default())
}

/// Two-phase search: name hits sorted by name, then description-only hits in
/// input order. A product never appears twice.
pub fn search_products_with<'a>(
    products: &'a [Product],
    term: &str,
    strategy: NameStrategy,
) -> Vec<&'a Product> {
    if term.is_empty() {
        return products.iter().collect();
    }

    let needle = term.to_lowercase();
    let by_name = match strategy {
        NameStrategy::Exhaustive => filter_by_name(products, term),
        NameStrategy::Contiguous => binary_search_by_name(products, term),
    };

    let mut seen: AHashSet<&ProductId> = by_name.iter().map(|&product| &product.id).collect();
    let mut by_description = Vec::new();
    for product in products {
        if description_matches(product, &needle) && seen.insert(&product.id) {
            by_description.push(product);
        }
    }

    tracing::trace!(
        term,
        %strategy,
        name_hits = by_name.len(),
        description_hits = by_description.len(),
        "two-phase product search"
    );

    by_name.into_iter().chain(by_description).collect()
}

/// Every product whose name contains `term`, sorted case-insensitively by name.
pub fn filter_by_name<'a>(products: &'a [Product], term: &str) -> Vec<&'a Product> {
    let needle = term.to_lowercase();
    sorted_by_name(products)
        .into_iter()
        .filter(|(name, _)| name.contains(&needle))
        .map(|(_, product)| product)
        .collect()
}

/// Name matches found by binary-searching the name-sorted list.
///
/// Locates the leftmost hit the search path reaches (a miss moves right when the
/// name sorts before the term, left otherwise), then extends the run in both
/// directions while names keep matching. Only that contiguous run is returned,
/// in name order. An empty term returns every product in input order.
pub fn binary_search_by_name<'a>(products: &'a [Product], term: &str) -> Vec<&'a Product> {
    if term.is_empty() {
        return products.iter().collect();
    }

    let needle = term.to_lowercase();
    let sorted = sorted_by_name(products);

    let mut left = 0;
    let mut right = sorted.len();
    let mut first_match = None;

    while left < right {
        let mid = left + (right - left) / 2;
        let name = sorted[mid].0.as_str();

        if name.contains(&needle) {
            first_match = Some(mid);
            right = mid;
        } else if name < needle.as_str() {
            left = mid + 1;
        } else {
            right = mid;
        }
    }

    let Some(hit) = first_match else {
        return Vec::new();
    };

    let start = sorted[..hit]
        .iter()
        .rposition(|(name, _)| !name.contains(&needle))
        .map_or(0, |i| i + 1);
    let end = sorted[hit..]
        .iter()
        .position(|(name, _)| !name.contains(&needle))
        .map_or(sorted.len(), |i| hit + i);

    sorted[start..end].iter().map(|(_, product)| *product).collect()
}
