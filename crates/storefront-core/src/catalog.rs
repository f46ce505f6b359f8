//! Catalog listing inputs and the cursor page envelope.
//!
//! Query construction lives in `storefront-db`; this module holds the pieces
//! that are pure functions of the request so they can be tested without a
//! database.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Filters and paging for a product catalog listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    /// Exclusive start: only products with an id strictly greater are returned.
    pub cursor: Option<Uuid>,
    pub page_size: i64,
    /// Case-insensitive name prefix.
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// `Some(true)` keeps products with stock, `Some(false)` keeps sold-out ones.
    pub in_stock: Option<bool>,
}

impl CatalogQuery {
    /// Builds a query with the page size clamped and blank search dropped.
    #[must_use]
    pub fn new(page_size: Option<i64>) -> Self {
        Self {
            page_size: normalize_page_size(page_size),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_search(mut self, search: Option<&str>) -> Self {
        self.search = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned);
        self
    }

    /// `LIKE` pattern for the name prefix, if a search term is set.
    #[must_use]
    pub fn name_pattern(&self) -> Option<String> {
        self.search.as_deref().map(prefix_pattern)
    }

    /// Returns a description of the problem when the price bounds are inverted.
    #[must_use]
    pub fn price_range_error(&self) -> Option<String> {
        match (self.min_price, self.max_price) {
            (Some(min), Some(max)) if min > max => Some(format!(
                "min_price ({min}) must not exceed max_price ({max})"
            )),
            _ => None,
        }
    }
}

/// Clamps a requested page size to `1..=MAX_PAGE_SIZE`, defaulting when absent.
#[must_use]
pub fn normalize_page_size(page_size: Option<i64>) -> i64 {
    page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE)
}

/// Escapes `LIKE` metacharacters and appends the trailing wildcard.
#[must_use]
pub fn prefix_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 1);
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<Uuid>,
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Builds a page from rows fetched with one row of lookahead.
    ///
    /// `rows` holds up to `page_size + 1` entries in cursor order; the extra
    /// row only signals that another page exists and is dropped.
    #[must_use]
    pub fn from_lookahead(mut rows: Vec<T>, page_size: i64, id_of: impl Fn(&T) -> Uuid) -> Self {
        let limit = usize::try_from(page_size.max(1)).unwrap_or(usize::MAX);
        let has_more = rows.len() > limit;
        rows.truncate(limit);
        let next_cursor = rows.last().map(id_of);
        Self {
            items: rows,
            next_cursor,
            has_more,
        }
    }
}
