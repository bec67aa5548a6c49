//! Sort and page parameters applied to already-fetched rows.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Upper bound on `per_page`, whatever the client asks for.
pub const MAX_PAGE_SIZE: u32 = 500;

/// Query parameters accepted by every table view.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct TableQuery {
    /// Column key, prefixed with `-` for descending order
    pub sort: Option<String>,
    /// Requested page number (1-indexed, default: 1)
    pub page: Option<u32>,
    /// Requested items per page
    pub per_page: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub key: String,
    pub descending: bool,
}

impl SortSpec {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (key, descending) = match raw.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (raw, false),
        };
        if key.is_empty() {
            return None;
        }
        Some(Self {
            key: key.to_string(),
            descending,
        })
    }

    /// Query value that reproduces this ordering.
    pub fn as_param(&self) -> String {
        if self.descending {
            format!("-{}", self.key)
        } else {
            self.key.clone()
        }
    }

    /// Value for a header link: toggles direction when already sorted on `key`.
    pub fn toggle_param(current: Option<&SortSpec>, key: &str) -> String {
        match current {
            Some(spec) if spec.key == key && !spec.descending => format!("-{}", key),
            _ => key.to_string(),
        }
    }
}

impl TableQuery {
    pub fn sort_spec(&self) -> Option<SortSpec> {
        self.sort.as_deref().and_then(SortSpec::parse)
    }

    pub fn per_page(&self, default: u32) -> u32 {
        self.per_page.unwrap_or(default).clamp(1, MAX_PAGE_SIZE)
    }
}

/// Pagination metadata for list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
    /// Total number of items across all pages
    pub total: u64,
    /// Total number of pages
    pub total_pages: u32,
}

impl Pagination {
    /// Resolve the requested page against `total`, clamping out-of-range pages.
    pub fn resolve(requested_page: Option<u32>, per_page: u32, total: usize) -> Self {
        let per_page = per_page.clamp(1, MAX_PAGE_SIZE);
        let total_pages = total.div_ceil(per_page as usize) as u32;
        let page = requested_page.unwrap_or(1).clamp(1, total_pages.max(1));
        Self {
            page,
            per_page,
            total: total as u64,
            total_pages,
        }
    }

    pub fn from_query(query: &TableQuery, default_per_page: u32, total: usize) -> Self {
        Self::resolve(query.page, query.per_page(default_per_page), total)
    }

    /// Index range of the current page within the full sequence.
    pub fn range(&self) -> std::ops::Range<usize> {
        let start = (self.page as usize - 1) * self.per_page as usize;
        let end = (start + self.per_page as usize).min(self.total as usize);
        start.min(end)..end
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Keep only the items on the current page.
    pub fn slice<T>(&self, mut items: Vec<T>) -> Vec<T> {
        let range = self.range();
        items.truncate(range.end);
        items.drain(..range.start);
        items
    }
}
