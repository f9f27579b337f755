//! Resource entity model.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use sono_core::types::{ParentRef, ResourceId, UserId};

/// A file or directory inside a user's storage.
///
/// The row mirrors a filesystem entry at `path`. For a live resource,
/// `path` is always the parent's path joined with `name`; for a trashed
/// resource it points into the storage's trash directory while
/// `parent_id` keeps the logical origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Resource {
    /// Unique resource identifier.
    pub id: ResourceId,
    /// The storage root or directory resource containing this resource.
    pub parent_id: ParentRef,
    /// The owning user.
    pub user_id: UserId,
    /// Uppercase hex SHA-512 of the file bytes. Always `None` for directories.
    pub content_hash: Option<String>,
    /// Display name, including any extension.
    pub name: String,
    /// Extension derived from `name`. Never empty; `None` for directories.
    pub extension: Option<String>,
    /// MIME type guessed from the extension.
    pub media_type: Option<String>,
    /// Absolute filesystem path.
    pub path: String,
    /// Size in bytes. For a directory, the sum of all files beneath it.
    pub bytes_count: i64,
    /// Fixed at creation.
    pub is_directory: bool,
    /// Whether the resource is in the trash.
    pub is_trashed: bool,
    /// Free-form description.
    pub description: Option<String>,
    /// Incremented on every update.
    pub version: i32,
    /// When the resource was created.
    pub created_at: DateTime<Utc>,
    /// When the resource was last updated.
    pub last_updated_at: Option<DateTime<Utc>>,
}

impl Resource {
    /// The filesystem path as a `Path`.
    pub fn fs_path(&self) -> &Path {
        Path::new(&self.path)
    }

    /// Whether the resource is a regular file.
    pub fn is_file(&self) -> bool {
        !self.is_directory
    }
}

/// Data required to create a new resource record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateResource {
    /// Pre-generated identifier, so children can reference it in the same batch.
    pub id: ResourceId,
    /// The parent storage or directory.
    pub parent_id: ParentRef,
    /// The owning user.
    pub user_id: UserId,
    /// Content hash, files only.
    pub content_hash: Option<String>,
    /// Display name.
    pub name: String,
    /// Derived extension.
    pub extension: Option<String>,
    /// Guessed MIME type.
    pub media_type: Option<String>,
    /// Absolute filesystem path.
    pub path: String,
    /// Size in bytes.
    pub bytes_count: i64,
    /// Directory flag.
    pub is_directory: bool,
    /// Free-form description.
    pub description: Option<String>,
}
