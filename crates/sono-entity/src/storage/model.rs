//! Storage entity model.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use sono_core::types::{StorageId, UserId};

/// The storage root owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Storage {
    /// Unique storage identifier.
    pub id: StorageId,
    /// The owning user. At most one storage exists per user.
    pub user_id: UserId,
    /// Absolute path of the storage directory.
    pub path: String,
    /// Incremented on every update.
    pub version: i32,
    /// When the storage was created.
    pub created_at: DateTime<Utc>,
    /// When the storage was last updated.
    pub last_updated_at: Option<DateTime<Utc>>,
}

impl Storage {
    /// The storage directory.
    pub fn root(&self) -> &Path {
        Path::new(&self.path)
    }

    /// A reserved subdirectory such as the trash.
    pub fn subdirectory(&self, name: &str) -> PathBuf {
        self.root().join(name)
    }
}

/// Data required to create a new storage record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStorage {
    /// Pre-generated identifier.
    pub id: StorageId,
    /// The owning user.
    pub user_id: UserId,
    /// Absolute path of the already created storage directory.
    pub path: String,
}
