//! Storefront listing pipeline: text search, then category filter, then sort.

use super::product::Product;
use super::search::{NameStrategy, hybrid_search_with};
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Ordering applied after search and filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Keep the order produced by the search
    #[default]
    Relevance,
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
}

impl SortOrder {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Relevance => "relevance",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::NameAsc => "name_asc",
            Self::NameDesc => "name_desc",
        }
    }

    /// Parse a sort key. Unknown keys fall back to [`SortOrder::Relevance`].
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }

    fn compare(self, a: &Product, b: &Product) -> Ordering {
        match self {
            Self::Relevance => Ordering::Equal,
            Self::PriceAsc => a.price.total_cmp(&b.price),
            Self::PriceDesc => b.price.total_cmp(&a.price),
            Self::NameAsc => compare_names(a, b),
            Self::NameDesc => compare_names(b, a),
        }
    }
}

fn compare_names(a: &Product, b: &Product) -> Ordering {
    a.name.to_lowercase().cmp(&b.name.to_lowercase())
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "relevance" => Ok(Self::Relevance),
            "price_asc" => Ok(Self::PriceAsc),
            "price_desc" => Ok(Self::PriceDesc),
            "name_asc" => Ok(Self::NameAsc),
            "name_desc" => Ok(Self::NameDesc),
            other => Err(format!("unknown sort order '{}'", other)),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category restriction; `"all"` disables it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("" | "all") => Self::All,
            Some(category) => Self::Only(category.to_string()),
        }
    }

    pub fn admits(&self, product: &Product) -> bool {
        match self {
            Self::All => true,
            Self::Only(category) => product.category.as_deref() == Some(category.as_str()),
        }
    }
}

/// One storefront query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ListingQuery {
    pub term: String,
    pub category: CategoryFilter,
    pub sort: SortOrder,
}

impl ListingQuery {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: CategoryFilter) -> Self {
        self.category = category;
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// Run search, category filter and sort over `products`.
    ///
    /// The sort is stable, so [`SortOrder::Relevance`] and ties keep search order.
    pub fn apply<'a>(&self, products: &'a [Product], strategy: NameStrategy) -> Vec<&'a Product> {
        let mut listed = if self.term.is_empty() {
            products.iter().collect()
        } else {
            hybrid_search_with(products, &self.term, strategy)
        };

        listed.retain(|product| self.category.admits(product));

        if self.sort != SortOrder::Relevance {
            listed.sort_by(|a, b| self.sort.compare(a, b));
        }

        listed
    }
}

/// Distinct categories in first-seen order, skipping products without one.
pub fn categories(products: &[Product]) -> Vec<&str> {
    let mut seen = AHashSet::new();
    products
        .iter()
        .filter_map(|product| product.category.as_deref())
        .filter(|category| !category.is_empty() && seen.insert(*category))
        .collect()
}
