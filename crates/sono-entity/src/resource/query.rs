//! Sortable and filterable resource properties.

use std::cmp::Ordering;
use std::str::FromStr;

use sono_core::error::AppError;
use sono_core::result::AppResult;
use sono_core::types::filter::{FilterField, parse_bool, parse_id};
use sono_core::types::{ParentRef, ResourceId, SortProperty, UserId};

use super::model::Resource;

/// Properties a resource listing can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResourceSortField {
    /// `id`
    Id,
    /// `parent_id`
    ParentId,
    /// `user_id`
    UserId,
    /// `name`
    Name,
    /// `extension`
    Extension,
    /// `type`, the media type
    MediaType,
    /// `bytes_count`
    BytesCount,
    /// `is_directory`
    IsDirectory,
    /// `is_trashed`
    IsTrashed,
    /// `created`
    #[default]
    Created,
    /// `last_updated`
    LastUpdated,
}

impl ResourceSortField {
    /// Ascending comparison of two resources on this property.
    ///
    /// Missing values sort after present ones, as PostgreSQL does for `ASC`.
    pub fn compare(&self, a: &Resource, b: &Resource) -> Ordering {
        match self {
            Self::Id => a.id.cmp(&b.id),
            Self::ParentId => a.parent_id.to_string().cmp(&b.parent_id.to_string()),
            Self::UserId => a.user_id.cmp(&b.user_id),
            Self::Name => a.name.cmp(&b.name),
            Self::Extension => nulls_last(&a.extension, &b.extension),
            Self::MediaType => nulls_last(&a.media_type, &b.media_type),
            Self::BytesCount => a.bytes_count.cmp(&b.bytes_count),
            Self::IsDirectory => a.is_directory.cmp(&b.is_directory),
            Self::IsTrashed => a.is_trashed.cmp(&b.is_trashed),
            Self::Created => a.created_at.cmp(&b.created_at),
            Self::LastUpdated => nulls_last(&a.last_updated_at, &b.last_updated_at),
        }
    }
}

fn nulls_last<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl SortProperty for ResourceSortField {
    fn property(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::ParentId => "parent_id",
            Self::UserId => "user_id",
            Self::Name => "name",
            Self::Extension => "extension",
            Self::MediaType => "type",
            Self::BytesCount => "bytes_count",
            Self::IsDirectory => "is_directory",
            Self::IsTrashed => "is_trashed",
            Self::Created => "created",
            Self::LastUpdated => "last_updated",
        }
    }

    fn column(&self) -> &'static str {
        match self {
            Self::MediaType => "media_type",
            Self::Created => "created_at",
            Self::LastUpdated => "last_updated_at",
            other => other.property(),
        }
    }
}

impl FromStr for ResourceSortField {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let field = match s {
            "id" => Self::Id,
            "parent_id" => Self::ParentId,
            "user_id" => Self::UserId,
            "name" => Self::Name,
            "extension" => Self::Extension,
            "type" => Self::MediaType,
            "bytes_count" => Self::BytesCount,
            "is_directory" => Self::IsDirectory,
            "is_trashed" => Self::IsTrashed,
            "created" => Self::Created,
            "last_updated" => Self::LastUpdated,
            other => {
                return Err(AppError::validation(format!(
                    "sortProperty '{other}' is not supported for resources"
                )));
            }
        };
        Ok(field)
    }
}

/// Equality filters a resource listing accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceFilter {
    /// `id = value`
    Id(ResourceId),
    /// `parent_id = value`
    ParentId(ParentRef),
    /// `user_id = value`
    UserId(UserId),
    /// `content_hash = value`
    ContentHash(String),
    /// `name = value`
    Name(String),
    /// `extension = value`
    Extension(String),
    /// `type = value`
    MediaType(String),
    /// `is_directory = value`
    IsDirectory(bool),
    /// `is_trashed = value`
    IsTrashed(bool),
    /// `version = value`
    Version(i32),
}

impl ResourceFilter {
    /// Whether a resource satisfies this filter.
    pub fn matches(&self, resource: &Resource) -> bool {
        match self {
            Self::Id(id) => resource.id == *id,
            Self::ParentId(parent) => resource.parent_id == *parent,
            Self::UserId(user_id) => resource.user_id == *user_id,
            Self::ContentHash(hash) => resource.content_hash.as_deref() == Some(hash.as_str()),
            Self::Name(name) => resource.name == *name,
            Self::Extension(ext) => resource.extension.as_deref() == Some(ext.as_str()),
            Self::MediaType(media) => resource.media_type.as_deref() == Some(media.as_str()),
            Self::IsDirectory(flag) => resource.is_directory == *flag,
            Self::IsTrashed(flag) => resource.is_trashed == *flag,
            Self::Version(version) => resource.version == *version,
        }
    }
}

impl FilterField for ResourceFilter {
    fn parse(property: &str, value: &str) -> AppResult<Self> {
        let filter = match property {
            "id" => Self::Id(parse_id(property, value)?),
            "parent_id" => Self::ParentId(parse_id(property, value)?),
            "user_id" => Self::UserId(parse_id(property, value)?),
            "content_hash" => Self::ContentHash(value.to_string()),
            "name" => Self::Name(value.to_string()),
            "extension" => Self::Extension(value.to_string()),
            "type" => Self::MediaType(value.to_string()),
            "is_directory" => Self::IsDirectory(parse_bool(property, value)?),
            "is_trashed" => Self::IsTrashed(parse_bool(property, value)?),
            "version" => Self::Version(value.parse().map_err(|_| {
                AppError::validation(format!("filter 'version' expects an integer (was '{value}')"))
            })?),
            other => {
                return Err(AppError::validation(format!(
                    "filter property '{other}' is not supported for resources"
                )));
            }
        };
        Ok(filter)
    }

    fn property(&self) -> &'static str {
        match self {
            Self::Id(_) => "id",
            Self::ParentId(_) => "parent_id",
            Self::UserId(_) => "user_id",
            Self::ContentHash(_) => "content_hash",
            Self::Name(_) => "name",
            Self::Extension(_) => "extension",
            Self::MediaType(_) => "type",
            Self::IsDirectory(_) => "is_directory",
            Self::IsTrashed(_) => "is_trashed",
            Self::Version(_) => "version",
        }
    }

    fn column(&self) -> &'static str {
        match self {
            Self::MediaType(_) => "media_type",
            other => other.property(),
        }
    }
}
