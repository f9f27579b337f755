//! Storage creation, lookup, listing and removal.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info, warn};

use sono_core::config::{ListingConfig, StorageConfig};
use sono_core::error::AppError;
use sono_core::result::AppResult;
use sono_core::types::{ListRequest, PageResponse, StorageId, UserId};
use sono_database::{ResourceRepository, StorageRepository};
use sono_entity::storage::{CreateStorage, Storage, StorageFilter, StorageSortField};
use sono_storage::{FsError, fs, hash};

use crate::lock::StorageLocks;
use crate::validate;

/// Manages the single storage root of each user.
#[derive(Debug, Clone)]
pub struct StorageService {
    /// Storage records.
    pub(super) storages: Arc<dyn StorageRepository>,
    /// Resource records, cascaded on removal.
    pub(super) resources: Arc<dyn ResourceRepository>,
    /// Per-storage mutation locks, shared with the resource service.
    pub(super) locks: Arc<StorageLocks>,
    /// Physical layout settings.
    pub(super) config: StorageConfig,
    /// Paging defaults and bounds.
    listing: ListingConfig,
}

impl StorageService {
    /// Creates a new storage service.
    pub fn new(
        storages: Arc<dyn StorageRepository>,
        resources: Arc<dyn ResourceRepository>,
        locks: Arc<StorageLocks>,
        config: StorageConfig,
        listing: ListingConfig,
    ) -> Self {
        Self {
            storages,
            resources,
            locks,
            config,
            listing,
        }
    }

    /// Creates the storage of a user: its directory, the trash and
    /// temporary subdirectories, then the record.
    ///
    /// The directory is named after the SHA-512 of the user id.
    pub async fn create_storage(&self, user_id: &str) -> AppResult<Storage> {
        let user_id: UserId = validate::id("user_id", user_id)?;
        let _guard = self.locks.acquire(user_id).await;

        if self.storages.find_by_user_id(&user_id).await?.is_some() {
            return Err(AppError::conflict(format!(
                "Storage of user '{user_id}' already exists"
            )));
        }

        let base = PathBuf::from(&self.config.root_path);
        fs::create_directories(&base).await?;
        let base = std::path::absolute(&base).map_err(|e| FsError::io(&base, e))?;
        let root = base.join(hash::digest(user_id.to_string().as_bytes()));

        fs::create_directory(&root).await.map_err(|e| match e {
            FsError::AlreadyExists(path) => AppError::conflict(format!(
                "Storage directory '{}' already exists",
                path.display()
            )),
            other => other.into(),
        })?;
        if let Err(e) = self.create_layout(&root).await {
            discard_directory(&root).await;
            return Err(e);
        }

        let data = CreateStorage {
            id: StorageId::new(),
            user_id,
            path: root.to_string_lossy().into_owned(),
        };
        let storage = match self.storages.create(&data).await {
            Ok(storage) => storage,
            Err(e) => {
                error!(user_id = %user_id, error = %e, "Failed to persist storage record");
                discard_directory(&root).await;
                return Err(e);
            }
        };

        info!(
            storage_id = %storage.id,
            user_id = %storage.user_id,
            path = %storage.path,
            "Storage created"
        );

        Ok(storage)
    }

    /// Gets a storage by ID.
    pub async fn get_storage(&self, id: &str) -> AppResult<Storage> {
        let id: StorageId = validate::id("id", id)?;
        self.find(&id).await
    }

    /// Gets the storage of a user.
    pub async fn get_storage_by_user(&self, user_id: &str) -> AppResult<Storage> {
        let user_id: UserId = validate::id("user_id", user_id)?;
        self.storages
            .find_by_user_id(&user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Storage of user '{user_id}' not found")))
    }

    /// Filtered, sorted, paged listing of storages.
    pub async fn list_storages(&self, req: &ListRequest) -> AppResult<PageResponse<Storage>> {
        let query = req.validate::<StorageSortField, StorageFilter>(&self.listing)?;
        self.storages.find_page(&query).await?.ensure_page_in_range()
    }

    /// Deletes a storage: the whole directory tree, every resource of the
    /// user, then the storage record.
    pub async fn remove_storage(&self, id: &str) -> AppResult<()> {
        let id: StorageId = validate::id("id", id)?;
        let owner = self.find(&id).await?.user_id;
        let guard = self.locks.acquire(owner).await;
        let storage = self.find(&id).await?;

        match fs::remove(storage.root()).await {
            Ok(()) | Err(FsError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        let resources = self.resources.delete_by_user_id(&storage.user_id).await?;
        self.storages.delete(&storage.id).await?;
        drop(guard);
        self.locks.release(owner);

        info!(
            storage_id = %storage.id,
            user_id = %storage.user_id,
            resources,
            "Storage removed"
        );

        Ok(())
    }

    /// Empties the temporary directory of a storage. Returns how many
    /// entries were removed.
    pub async fn clear_temporary(&self, id: &str) -> AppResult<usize> {
        let id: StorageId = validate::id("id", id)?;
        let owner = self.find(&id).await?.user_id;
        let _guard = self.locks.acquire(owner).await;
        let storage = self.find(&id).await?;

        let temporary = storage.subdirectory(&self.config.temporary_directory);
        let entries = fs::list(&temporary, false).await?;
        for entry in &entries {
            fs::remove(entry).await?;
        }

        info!(storage_id = %storage.id, removed = entries.len(), "Temporary directory cleared");

        Ok(entries.len())
    }

    pub(super) async fn find(&self, id: &StorageId) -> AppResult<Storage> {
        self.storages
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Storage '{id}' not found")))
    }

    async fn create_layout(&self, root: &Path) -> AppResult<()> {
        fs::create_directory(&root.join(&self.config.trash_directory)).await?;
        fs::create_directory(&root.join(&self.config.temporary_directory)).await?;
        Ok(())
    }
}

/// Best-effort removal of a half-created storage directory.
async fn discard_directory(root: &Path) {
    if let Err(e) = fs::remove(root).await {
        warn!(path = %root.display(), error = %e, "Failed to clean up storage directory");
    }
}
