//! List-query parameters and paginated results.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unified product sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ProductSort {
    /// Backend-default relevance/position ordering.
    #[default]
    Relevance,
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
    Newest,
    Oldest,
}

impl ProductSort {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Relevance => "relevance",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::NameAsc => "name-asc",
            Self::NameDesc => "name-desc",
            Self::Newest => "newest",
            Self::Oldest => "oldest",
        }
    }
}

impl fmt::Display for ProductSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductSort {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relevance" => Ok(Self::Relevance),
            "price-asc" => Ok(Self::PriceAsc),
            "price-desc" => Ok(Self::PriceDesc),
            "name-asc" => Ok(Self::NameAsc),
            "name-desc" => Ok(Self::NameDesc),
            "newest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            _ => Err(()),
        }
    }
}

/// Parameters for a paginated product listing.
///
/// `page` is 1-based. Field order is stable so a serialized query is a
/// deterministic cache-key component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductQuery {
    pub page: u32,
    pub page_size: u32,
    pub sort: ProductSort,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_min: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_max: Option<Decimal>,
    #[serde(default)]
    pub in_stock_only: bool,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
            sort: ProductSort::default(),
            category_slug: None,
            brand_slug: None,
            search: None,
            price_min: None,
            price_max: None,
            in_stock_only: false,
        }
    }
}

impl ProductQuery {
    /// Clamps page and page size to their minimums.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.page = self.page.max(1);
        self.page_size = self.page_size.max(1);
        self
    }
}

/// One page of a larger result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total_items: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Wraps pre-sliced items with pagination metadata.
    #[must_use]
    pub fn new(items: Vec<T>, page: u32, page_size: u32, total_items: u32) -> Self {
        Self {
            items,
            page,
            page_size,
            total_items,
            total_pages: total_items.div_ceil(page_size.max(1)).max(1),
        }
    }

    /// Slices a page out of a fully materialized result set.
    ///
    /// Used when filtering happens client-side and pagination metadata
    /// must be recomputed from the filtered subset.
    #[must_use]
    pub fn slice(all: Vec<T>, page: u32, page_size: u32) -> Self {
        let page = page.max(1);
        let page_size = page_size.max(1);
        #[allow(clippy::cast_possible_truncation)]
        let total_items = all.len().min(u32::MAX as usize) as u32;
        let items: Vec<T> = all
            .into_iter()
            .skip(((page - 1) as usize).saturating_mul(page_size as usize))
            .take(page_size as usize)
            .collect();
        Self::new(items, page, page_size, total_items)
    }

    #[must_use]
    pub fn empty(page: u32, page_size: u32) -> Self {
        Self::new(Vec::new(), page.max(1), page_size.max(1), 0)
    }
}
