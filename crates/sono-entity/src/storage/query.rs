//! Sortable and filterable storage properties.

use std::cmp::Ordering;
use std::str::FromStr;

use sono_core::error::AppError;
use sono_core::result::AppResult;
use sono_core::types::filter::{FilterField, parse_id};
use sono_core::types::{SortProperty, StorageId, UserId};

use super::model::Storage;

/// Properties a storage listing can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageSortField {
    /// `id`
    Id,
    /// `user_id`
    UserId,
    /// `created`
    #[default]
    Created,
}

impl StorageSortField {
    /// Ascending comparison of two storages on this property.
    pub fn compare(&self, a: &Storage, b: &Storage) -> Ordering {
        match self {
            Self::Id => a.id.cmp(&b.id),
            Self::UserId => a.user_id.cmp(&b.user_id),
            Self::Created => a.created_at.cmp(&b.created_at),
        }
    }
}

impl SortProperty for StorageSortField {
    fn property(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::UserId => "user_id",
            Self::Created => "created",
        }
    }

    fn column(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::UserId => "user_id",
            Self::Created => "created_at",
        }
    }
}

impl FromStr for StorageSortField {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(Self::Id),
            "user_id" => Ok(Self::UserId),
            "created" => Ok(Self::Created),
            other => Err(AppError::validation(format!(
                "sortProperty '{other}' is not supported for storages"
            ))),
        }
    }
}

/// Equality filters a storage listing accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageFilter {
    /// `id = value`
    Id(StorageId),
    /// `user_id = value`
    UserId(UserId),
}

impl StorageFilter {
    /// Whether a storage satisfies this filter.
    pub fn matches(&self, storage: &Storage) -> bool {
        match self {
            Self::Id(id) => storage.id == *id,
            Self::UserId(user_id) => storage.user_id == *user_id,
        }
    }
}

impl FilterField for StorageFilter {
    fn parse(property: &str, value: &str) -> AppResult<Self> {
        match property {
            "id" => Ok(Self::Id(parse_id(property, value)?)),
            "user_id" => Ok(Self::UserId(parse_id(property, value)?)),
            other => Err(AppError::validation(format!(
                "filter property '{other}' is not supported for storages"
            ))),
        }
    }

    fn property(&self) -> &'static str {
        match self {
            Self::Id(_) => "id",
            Self::UserId(_) => "user_id",
        }
    }

    fn column(&self) -> &'static str {
        self.property()
    }
}
