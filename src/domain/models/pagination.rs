//! Paging and free-text search primitives shared by list operations.

use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 1_000;

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Build a page request, falling back to defaults for missing values.
    ///
    /// `limit` is capped at [`MAX_LIMIT`] and the resulting offset must fit in an `i64`.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> DomainResult<Self> {
        let page = page.unwrap_or(DEFAULT_PAGE);
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        if page < 1 || limit < 1 {
            return Err(DomainError::validation("page and limit must be positive"));
        }
        if limit > MAX_LIMIT {
            return Err(DomainError::validation(format!("limit cannot exceed {MAX_LIMIT}")));
        }
        if (page - 1).checked_mul(limit).is_none() {
            return Err(DomainError::validation("page is out of range"));
        }
        Ok(Self { page, limit })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Pagination metadata attached to list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    #[serde(rename = "totalPage")]
    pub total_page: i64,
}

impl Pagination {
    pub fn new(request: PageRequest, total: i64) -> Self {
        let limit = request.limit.max(1);
        let total_page = if total <= 0 {
            0
        } else {
            total / limit + i64::from(total % limit != 0)
        };
        Self {
            page: request.page,
            limit: request.limit,
            total,
            total_page,
        }
    }
}

/// One page of results.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: i64) -> Self {
        Self {
            items,
            pagination: Pagination::new(request, total),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

/// Normalized free-text filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchFilter(Option<String>);

impl SearchFilter {
    pub fn new(raw: Option<&str>) -> Self {
        let value = raw.map(|v| v.trim().to_lowercase()).filter(|v| !v.is_empty());
        Self(value)
    }

    pub fn value(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// `%value%` pattern for `LIKE` matching.
    pub fn like_pattern(&self) -> Option<String> {
        self.0.as_ref().map(|v| format!("%{v}%"))
    }

    /// Build a `(lower(col) LIKE ? OR ...)` clause over the given columns.
    ///
    /// Returns `None` when the filter is empty. The caller binds
    /// [`Self::like_pattern`] once per column.
    pub fn clause(&self, columns: &[&str]) -> Option<String> {
        if self.0.is_none() || columns.is_empty() {
            return None;
        }
        let parts: Vec<String> = columns
            .iter()
            .map(|c| format!("LOWER(CAST({c} AS TEXT)) LIKE ?"))
            .collect();
        Some(format!("({})", parts.join(" OR ")))
    }
}
