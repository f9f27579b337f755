//! Shared test helpers for service integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use sono_core::config::{ListingConfig, StorageConfig};
use sono_database::memory::{InMemoryResourceRepository, InMemoryStorageRepository};
use sono_entity::resource::Resource;
use sono_entity::storage::Storage;
use sono_service::{CreateResourceRequest, ResourceService, StorageLocks, StorageService};
use sono_storage::stream_bytes;

/// Test application context backed by in-memory repositories and a
/// temporary storage root.
pub struct TestApp {
    /// Keeps the storage root alive for the duration of the test.
    pub root: TempDir,
    /// Storage lifecycle service.
    pub storages: StorageService,
    /// Resource tree engine.
    pub resources: ResourceService,
    /// Direct access to resource records.
    pub resource_repo: Arc<InMemoryResourceRepository>,
}

impl TestApp {
    /// Create a new test application.
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("Failed to create storage root");
        let config = StorageConfig {
            root_path: root.path().to_string_lossy().into_owned(),
            ..StorageConfig::default()
        };
        let listing = ListingConfig::default();

        let storage_repo = Arc::new(InMemoryStorageRepository::new());
        let resource_repo = Arc::new(InMemoryResourceRepository::new());
        let locks = Arc::new(StorageLocks::new());

        let storages = StorageService::new(
            storage_repo.clone(),
            resource_repo.clone(),
            locks.clone(),
            config.clone(),
            listing.clone(),
        );
        let resources = ResourceService::new(
            storage_repo,
            resource_repo.clone(),
            locks,
            config,
            listing,
        );

        Self {
            root,
            storages,
            resources,
            resource_repo,
        }
    }

    /// Create a storage for a fresh user.
    pub async fn create_storage(&self) -> Storage {
        self.storages
            .create_storage(&sono_core::types::UserId::new().to_string())
            .await
            .expect("Failed to create storage")
    }

    /// Create a directory under `parent_id`.
    pub async fn mkdir(&self, storage: &Storage, parent_id: &str, name: &str) -> Resource {
        self.resources
            .create_resource(request(storage, parent_id, name, true), None)
            .await
            .expect("Failed to create directory")
    }

    /// Create a file with `content` under `parent_id`.
    pub async fn write(
        &self,
        storage: &Storage,
        parent_id: &str,
        name: &str,
        content: &'static str,
    ) -> Resource {
        self.resources
            .create_resource(
                request(storage, parent_id, name, false),
                Some(stream_bytes(content)),
            )
            .await
            .expect("Failed to create file")
    }

    /// Reload a resource record.
    pub async fn reload(&self, resource: &Resource) -> Resource {
        self.resources
            .get_resource(&resource.id.to_string())
            .await
            .expect("Failed to reload resource")
    }
}

/// A create request owned by the storage's user.
pub fn request(storage: &Storage, parent_id: &str, name: &str, is_directory: bool) -> CreateResourceRequest {
    CreateResourceRequest {
        parent_id: parent_id.to_string(),
        user_id: storage.user_id.to_string(),
        name: name.to_string(),
        is_directory,
        description: None,
    }
}

/// Whether a path exists on disk.
pub fn exists(path: impl AsRef<Path>) -> bool {
    path.as_ref().exists()
}
