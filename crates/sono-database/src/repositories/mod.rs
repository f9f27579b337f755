//! Repository abstraction over the `storages` and `resources` tables.
//!
//! Services depend on these traits only; [`storage::PgStorageRepository`]
//! and [`resource::PgResourceRepository`] are the PostgreSQL
//! implementations, [`crate::memory`] holds the in-memory ones.

pub mod resource;
pub mod storage;

use async_trait::async_trait;

use sono_core::error::AppError;
use sono_core::result::AppResult;
use sono_core::types::{ListQuery, PageResponse, ParentRef, ResourceId, StorageId, UserId};
use sono_entity::resource::{CreateResource, Resource, ResourceFilter, ResourceSortField};
use sono_entity::storage::{CreateStorage, Storage, StorageFilter, StorageSortField};

/// Validated listing query over storages.
pub type StorageQuery = ListQuery<StorageSortField, StorageFilter>;

/// Validated listing query over resources.
pub type ResourceQuery = ListQuery<ResourceSortField, ResourceFilter>;

/// Persistence of storage records.
#[async_trait]
pub trait StorageRepository: Send + Sync + std::fmt::Debug + 'static {
    /// Find a storage by ID.
    async fn find_by_id(&self, id: &StorageId) -> AppResult<Option<Storage>>;

    /// Find the storage of a user.
    async fn find_by_user_id(&self, user_id: &UserId) -> AppResult<Option<Storage>>;

    /// Filtered, sorted, paged listing.
    async fn find_page(&self, query: &StorageQuery) -> AppResult<PageResponse<Storage>>;

    /// Insert a storage. A second storage for the same user is a conflict.
    async fn create(&self, data: &CreateStorage) -> AppResult<Storage>;

    /// Delete a storage. Returns `true` if a row was removed.
    async fn delete(&self, id: &StorageId) -> AppResult<bool>;
}

/// Persistence of resource records.
///
/// Batch writes are atomic: either every row of the batch is written or
/// none is. Among non-trashed rows, `(parent_id, name, is_directory)` is
/// unique; a write that would break this fails with a conflict.
#[async_trait]
pub trait ResourceRepository: Send + Sync + std::fmt::Debug + 'static {
    /// Find a resource by ID.
    async fn find_by_id(&self, id: &ResourceId) -> AppResult<Option<Resource>>;

    /// Find every resource whose ID is listed. Unknown IDs are skipped.
    async fn find_by_ids(&self, ids: &[ResourceId]) -> AppResult<Vec<Resource>>;

    /// Immediate children of a storage or directory, trashed ones included.
    async fn find_children(&self, parent_id: &ParentRef) -> AppResult<Vec<Resource>>;

    /// Every resource owned by a user.
    async fn find_by_user_id(&self, user_id: &UserId) -> AppResult<Vec<Resource>>;

    /// Filtered, sorted, paged listing.
    async fn find_page(&self, query: &ResourceQuery) -> AppResult<PageResponse<Resource>>;

    /// Insert a batch of resources with version 1 and no last-updated time.
    async fn create_many(&self, items: &[CreateResource]) -> AppResult<Vec<Resource>>;

    /// Write back a batch of modified resources, bumping each version and
    /// last-updated time. `id`, `user_id`, `is_directory` and `created_at`
    /// are never changed.
    async fn update_many(&self, items: &[Resource]) -> AppResult<Vec<Resource>>;

    /// Delete a batch of resources. Returns the number of rows removed.
    async fn delete_many(&self, ids: &[ResourceId]) -> AppResult<u64>;

    /// Delete every resource owned by a user. Returns the number of rows removed.
    async fn delete_by_user_id(&self, user_id: &UserId) -> AppResult<u64>;

    /// Insert a single resource.
    async fn create(&self, data: &CreateResource) -> AppResult<Resource> {
        self.create_many(std::slice::from_ref(data))
            .await?
            .pop()
            .ok_or_else(|| AppError::internal("Insert returned no row"))
    }

    /// Write back a single resource.
    async fn update(&self, resource: &Resource) -> AppResult<Resource> {
        self.update_many(std::slice::from_ref(resource))
            .await?
            .pop()
            .ok_or_else(|| AppError::internal("Update returned no row"))
    }
}
