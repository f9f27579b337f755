//! List requests as received from a caller and their validated form.

use serde::{Deserialize, Serialize};

use super::filter::FilterField;
use super::pagination::PageRequest;
use super::sorting::{SortDirection, SortField, SortProperty};
use crate::config::ListingConfig;
use crate::result::AppResult;

/// Raw, unvalidated listing parameters.
///
/// Every field is optional; missing values fall back to [`ListingConfig`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListRequest {
    /// Requested page (1-based).
    pub page: Option<i64>,
    /// Requested page size.
    pub page_size: Option<i64>,
    /// Property to sort by.
    pub sort_property: Option<String>,
    /// `asc` or `desc`.
    pub sort_order: Option<String>,
    /// Equality filters as `(property, value)` pairs, combined with AND.
    #[serde(default)]
    pub filters: Vec<(String, String)>,
}

impl ListRequest {
    /// Add an equality filter.
    pub fn filter(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((property.into(), value.into()));
        self
    }

    /// Validate against the allowlists of `S` and `F` and the configured bounds.
    pub fn validate<S, F>(&self, limits: &ListingConfig) -> AppResult<ListQuery<S, F>>
    where
        S: SortProperty,
        F: FilterField,
    {
        let page = PageRequest::new(
            self.page.unwrap_or(limits.default_page as i64),
            self.page_size.unwrap_or(limits.default_page_size as i64),
            limits,
        )?;

        let field = match self.sort_property.as_deref() {
            Some(property) => property.parse::<S>()?,
            None => S::default(),
        };
        let direction = match self.sort_order.as_deref() {
            Some(order) => order.parse::<SortDirection>()?,
            None => limits.default_sort_order,
        };

        let filters = self
            .filters
            .iter()
            .map(|(property, value)| F::parse(property, value))
            .collect::<AppResult<Vec<F>>>()?;

        Ok(ListQuery {
            page,
            sort: SortField::new(field, direction),
            filters,
        })
    }
}

/// A validated listing query.
#[derive(Debug, Clone)]
pub struct ListQuery<S, F> {
    /// Page to fetch.
    pub page: PageRequest,
    /// Ordering of the result.
    pub sort: SortField<S>,
    /// Conjunctive equality filters.
    pub filters: Vec<F>,
}
