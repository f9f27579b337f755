//! Physical storage layout configuration.

use serde::{Deserialize, Serialize};

/// Where and how per-user storages are laid out on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory under which every user storage directory is created.
    #[serde(default = "default_root_path")]
    pub root_path: String,
    /// Name of the trash subdirectory inside each storage.
    #[serde(default = "default_trash_directory")]
    pub trash_directory: String,
    /// Name of the scratch subdirectory inside each storage.
    #[serde(default = "default_temporary_directory")]
    pub temporary_directory: String,
    /// Deflate level used when building archives.
    #[serde(default = "default_compression_level")]
    pub compression_level: i64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_path: default_root_path(),
            trash_directory: default_trash_directory(),
            temporary_directory: default_temporary_directory(),
            compression_level: default_compression_level(),
        }
    }
}

fn default_root_path() -> String {
    "./data/storages".to_string()
}

fn default_trash_directory() -> String {
    "trash".to_string()
}

fn default_temporary_directory() -> String {
    "temporary".to_string()
}

fn default_compression_level() -> i64 {
    5
}
