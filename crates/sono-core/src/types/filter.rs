//! Equality filters for list operations.

use crate::result::AppResult;

/// An exact-match filter on one property of an entity.
///
/// Implemented by a closed enum per entity whose variants carry a typed
/// value. There are no range or substring operators.
pub trait FilterField: Sized + Send + Sync {
    /// Parse a `property = value` pair, rejecting unknown properties and
    /// values that do not fit the property's type.
    fn parse(property: &str, value: &str) -> AppResult<Self>;

    /// Public property name.
    fn property(&self) -> &'static str;

    /// Database column backing the property.
    fn column(&self) -> &'static str;
}

/// Parse a boolean filter value (`true`/`false`).
pub fn parse_bool(property: &str, value: &str) -> AppResult<bool> {
    value.parse::<bool>().map_err(|_| {
        crate::error::AppError::validation(format!(
            "filter '{property}' expects true or false (was '{value}')"
        ))
    })
}

/// Parse a tagged identifier filter value.
pub fn parse_id<T>(property: &str, value: &str) -> AppResult<T>
where
    T: std::str::FromStr<Err = crate::types::id::IdError>,
{
    value.parse::<T>().map_err(|e| {
        crate::error::AppError::validation(format!("filter '{property}' is incorrect: {e}"))
    })
}
