//! Pagination types for list operations.

use serde::{Deserialize, Serialize};

use crate::config::ListingConfig;
use crate::error::AppError;
use crate::result::AppResult;

/// Request parameters for paginated queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (1-based).
    pub page: u64,
    /// Number of items per page.
    pub page_size: u64,
}

impl PageRequest {
    /// Build a page request, rejecting values outside the configured bounds.
    pub fn new(page: i64, page_size: i64, limits: &ListingConfig) -> AppResult<Self> {
        if page < 1 {
            return Err(AppError::validation(format!(
                "page must be greater than or equal to 1 (was {page})"
            )));
        }
        let min = limits.min_page_size as i64;
        let max = limits.max_page_size as i64;
        if page_size < min || page_size > max {
            return Err(AppError::validation(format!(
                "pageSize must be between {min} and {max} (was {page_size})"
            )));
        }
        Ok(Self {
            page: page as u64,
            page_size: page_size as u64,
        })
    }

    /// Calculate the SQL `OFFSET` value. Saturates for huge page numbers,
    /// which then fall past the last page.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }

    /// The `OFFSET` value as bound in SQL.
    pub fn sql_offset(&self) -> i64 {
        i64::try_from(self.offset()).unwrap_or(i64::MAX)
    }

    /// Return the SQL `LIMIT` value.
    pub fn limit(&self) -> u64 {
        self.page_size
    }
}

/// Paginated response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    /// The items on this page.
    pub items: Vec<T>,
    /// Current page number (1-based).
    pub page: u64,
    /// Number of items per page.
    pub page_size: u64,
    /// Total number of items across all pages.
    pub total_items: u64,
    /// Total number of pages. An empty result still has one (empty) page.
    pub total_pages: u64,
    /// Whether there is a next page.
    pub has_next: bool,
    /// Whether there is a previous page.
    pub has_previous: bool,
}

impl<T> PageResponse<T> {
    /// Create a new paginated response.
    pub fn new(items: Vec<T>, page: u64, page_size: u64, total_items: u64) -> Self {
        let total_pages = if total_items == 0 {
            1
        } else {
            total_items.div_ceil(page_size.max(1))
        };
        Self {
            items,
            page,
            page_size,
            total_items,
            total_pages,
            has_next: page < total_pages,
            has_previous: page > 1,
        }
    }

    /// Fail when the requested page lies beyond the last page.
    ///
    /// Only meaningful after the query ran, since the page count depends
    /// on the filtered total.
    pub fn ensure_page_in_range(self) -> AppResult<Self> {
        if self.page > self.total_pages {
            return Err(AppError::validation(format!(
                "page {} is out of range, there are {} page(s)",
                self.page, self.total_pages
            )));
        }
        Ok(self)
    }
}
