//! Paging defaults and bounds for list operations.

use serde::{Deserialize, Serialize};

use crate::types::sorting::SortDirection;

/// Listing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Page used when the caller does not ask for one.
    #[serde(default = "default_page")]
    pub default_page: u64,
    /// Page size used when the caller does not ask for one.
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
    /// Smallest accepted page size.
    #[serde(default = "default_min_page_size")]
    pub min_page_size: u64,
    /// Largest accepted page size.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,
    /// Sort direction used when the caller does not ask for one.
    #[serde(default)]
    pub default_sort_order: SortDirection,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            default_page: default_page(),
            default_page_size: default_page_size(),
            min_page_size: default_min_page_size(),
            max_page_size: default_max_page_size(),
            default_sort_order: SortDirection::Asc,
        }
    }
}

fn default_page() -> u64 {
    1
}

fn default_page_size() -> u64 {
    100
}

fn default_min_page_size() -> u64 {
    1
}

fn default_max_page_size() -> u64 {
    1000
}
