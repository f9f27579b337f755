//! Read-only reconciliation sweep between disk and metadata.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

use sono_core::result::AppResult;
use sono_core::types::{ResourceId, StorageId};
use sono_storage::fs;

use super::service::StorageService;
use crate::validate;

/// Differences found between a storage directory and its resource records.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConsistencyReport {
    /// The inspected storage.
    pub storage_id: Option<StorageId>,
    /// Number of resource records inspected.
    pub checked_resources: usize,
    /// Records whose path does not exist on disk.
    pub missing_on_disk: Vec<ResourceId>,
    /// Paths on disk no record points to. The temporary directory is ignored.
    pub untracked_paths: Vec<PathBuf>,
}

impl ConsistencyReport {
    /// Whether disk and metadata agree.
    pub fn is_consistent(&self) -> bool {
        self.missing_on_disk.is_empty() && self.untracked_paths.is_empty()
    }
}

impl StorageService {
    /// Compares every resource record of a storage with the filesystem.
    ///
    /// Nothing is repaired; the report lists what diverged.
    pub async fn verify_storage(&self, id: &str) -> AppResult<ConsistencyReport> {
        let id: StorageId = validate::id("id", id)?;
        let storage = self.find(&id).await?;
        let resources = self.resources.find_by_user_id(&storage.user_id).await?;

        let mut report = ConsistencyReport {
            storage_id: Some(storage.id),
            checked_resources: resources.len(),
            ..Default::default()
        };

        let mut recorded = HashSet::with_capacity(resources.len());
        for resource in &resources {
            if !fs::exists(resource.fs_path()).await? {
                report.missing_on_disk.push(resource.id);
            }
            recorded.insert(PathBuf::from(&resource.path));
        }

        let trash = storage.subdirectory(&self.config.trash_directory);
        let temporary = storage.subdirectory(&self.config.temporary_directory);
        for entry in fs::list(storage.root(), true).await? {
            if entry == trash || entry.starts_with(&temporary) {
                continue;
            }
            if !recorded.contains(&entry) {
                report.untracked_paths.push(entry);
            }
        }

        if report.is_consistent() {
            info!(storage_id = %storage.id, checked = report.checked_resources, "Storage is consistent");
        } else {
            warn!(
                storage_id = %storage.id,
                missing = report.missing_on_disk.len(),
                untracked = report.untracked_paths.len(),
                "Storage diverges from its records"
            );
        }

        Ok(report)
    }
}
