//! Sorting types for list operations.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending order.
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl SortDirection {
    /// Return the SQL keyword for this direction.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    /// Apply this direction to an ascending comparison result.
    pub fn apply(&self, ordering: std::cmp::Ordering) -> std::cmp::Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

impl FromStr for SortDirection {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(AppError::validation(format!(
                "sortOrder '{s}' is not supported, expected 'asc' or 'desc'"
            ))),
        }
    }
}

/// A sortable property of an entity.
///
/// Implemented by a closed enum per entity. `FromStr` parses the public
/// property name and rejects anything outside the allowlist.
pub trait SortProperty: Copy + Default + FromStr<Err = AppError> + Send + Sync {
    /// Public property name.
    fn property(&self) -> &'static str;

    /// Database column backing the property.
    fn column(&self) -> &'static str;
}

/// A sort specification consisting of a property and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortField<S> {
    /// Property to sort by.
    pub field: S,
    /// Sort direction.
    pub direction: SortDirection,
}

impl<S> SortField<S> {
    /// Create a new sort field.
    pub fn new(field: S, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Create an ascending sort on the given property.
    pub fn asc(field: S) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    /// Create a descending sort on the given property.
    pub fn desc(field: S) -> Self {
        Self::new(field, SortDirection::Desc)
    }
}
