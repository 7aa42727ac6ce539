//! Cursor pagination
//!
//! List endpoints that page take `pageToken` / `pageSize` query arguments and
//! describe the page through response headers. Header values that are
//! missing or not numbers read as zero.

use serde::{Deserialize, Serialize};

/// Response header carrying the token of the next page
pub const HEADER_NEXT_PAGE_TOKEN: &str = "Next-Page-Token";
/// Response header carrying the token of the previous page
pub const HEADER_PREVIOUS_PAGE_TOKEN: &str = "Previous-Page-Token";
/// Response header carrying the page size used by the server
pub const HEADER_PAGE_SIZE: &str = "Page-Size";
/// Response header carrying the total number of items
pub const HEADER_TOTAL_ITEMS: &str = "Total-Items";

/// Query argument selecting a page
pub const QUERY_PAGE_TOKEN: &str = "pageToken";
/// Query argument requesting a page size
pub const QUERY_PAGE_SIZE: &str = "pageSize";

/// Paging request arguments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaginationOptions {
    /// Token returned as `next_page_token` by a previous call
    pub page_token: Option<String>,
    /// Requested page size; the server applies its own default when unset
    pub page_size: Option<u32>,
}

impl PaginationOptions {
    /// First page with the given size
    #[must_use]
    pub const fn with_page_size(page_size: u32) -> Self {
        Self { page_token: None, page_size: Some(page_size) }
    }

    /// Query pairs to append to a list request. Zero sizes and empty tokens
    /// are omitted.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(size) = self.page_size.filter(|size| *size > 0) {
            pairs.push((QUERY_PAGE_SIZE, size.to_string()));
        }
        if let Some(token) = self.page_token.as_deref().filter(|token| !token.is_empty()) {
            pairs.push((QUERY_PAGE_TOKEN, token.to_string()));
        }
        pairs
    }
}

/// Page metadata returned by list endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Pagination {
    /// Token of the next page, empty on the last page
    pub next_page_token: String,
    /// Token of the previous page, empty on the first page
    pub previous_page_token: String,
    /// Page size applied by the server
    pub page_size: u64,
    /// Total number of items across pages
    pub total_items: u64,
}

impl Pagination {
    /// Build from a header lookup function.
    ///
    /// `lookup` receives one of the `HEADER_*` names and returns the header
    /// value if present and readable.
    pub fn from_headers<'a, F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        let number = |name: &str| lookup(name).and_then(|v| v.trim().parse().ok()).unwrap_or(0);
        Self {
            next_page_token: lookup(HEADER_NEXT_PAGE_TOKEN).unwrap_or_default().to_string(),
            previous_page_token: lookup(HEADER_PREVIOUS_PAGE_TOKEN)
                .unwrap_or_default()
                .to_string(),
            page_size: number(HEADER_PAGE_SIZE),
            total_items: number(HEADER_TOTAL_ITEMS),
        }
    }

    /// Whether another page follows
    #[must_use]
    pub fn has_next(&self) -> bool {
        !self.next_page_token.is_empty()
    }

    /// Options selecting the next page, keeping the given size
    #[must_use]
    pub fn next_options(&self, page_size: Option<u32>) -> Option<PaginationOptions> {
        self.has_next().then(|| PaginationOptions {
            page_token: Some(self.next_page_token.clone()),
            page_size,
        })
    }
}
