//! In-memory repositories.
//!
//! Same filtering, sorting, paging, uniqueness and batch-atomicity
//! semantics as the PostgreSQL repositories, without a database.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use sono_core::error::AppError;
use sono_core::result::AppResult;
use sono_core::types::{PageResponse, ParentRef, ResourceId, StorageId, UserId};
use sono_entity::resource::{CreateResource, Resource};
use sono_entity::storage::{CreateStorage, Storage};

use crate::repositories::{ResourceQuery, ResourceRepository, StorageQuery, StorageRepository};

/// Slice one page out of an already filtered and sorted list.
fn paginate<T>(items: Vec<T>, page: u64, page_size: u64, offset: u64) -> PageResponse<T> {
    let total = items.len() as u64;
    let items = items
        .into_iter()
        .skip(usize::try_from(offset).unwrap_or(usize::MAX))
        .take(page_size as usize)
        .collect();
    PageResponse::new(items, page, page_size, total)
}

/// In-memory [`StorageRepository`].
#[derive(Debug, Default)]
pub struct InMemoryStorageRepository {
    rows: RwLock<BTreeMap<StorageId, Storage>>,
}

impl InMemoryStorageRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageRepository for InMemoryStorageRepository {
    async fn find_by_id(&self, id: &StorageId) -> AppResult<Option<Storage>> {
        Ok(self.rows.read().await.get(id).cloned())
    }

    async fn find_by_user_id(&self, user_id: &UserId) -> AppResult<Option<Storage>> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .find(|s| s.user_id == *user_id)
            .cloned())
    }

    async fn find_page(&self, query: &StorageQuery) -> AppResult<PageResponse<Storage>> {
        let mut items: Vec<Storage> = self
            .rows
            .read()
            .await
            .values()
            .filter(|s| query.filters.iter().all(|f| f.matches(s)))
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            query
                .sort
                .direction
                .apply(query.sort.field.compare(a, b))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(paginate(
            items,
            query.page.page,
            query.page.page_size,
            query.page.offset(),
        ))
    }

    async fn create(&self, data: &CreateStorage) -> AppResult<Storage> {
        let mut rows = self.rows.write().await;
        if rows.values().any(|s| s.user_id == data.user_id) {
            return Err(AppError::conflict(format!(
                "Storage for user '{}' already exists",
                data.user_id
            )));
        }
        if rows.contains_key(&data.id) {
            return Err(AppError::conflict(format!(
                "Storage '{}' already exists",
                data.id
            )));
        }
        let storage = Storage {
            id: data.id,
            user_id: data.user_id,
            path: data.path.clone(),
            version: 1,
            created_at: Utc::now(),
            last_updated_at: None,
        };
        rows.insert(storage.id, storage.clone());
        Ok(storage)
    }

    async fn delete(&self, id: &StorageId) -> AppResult<bool> {
        Ok(self.rows.write().await.remove(id).is_some())
    }
}

/// In-memory [`ResourceRepository`].
#[derive(Debug, Default)]
pub struct InMemoryResourceRepository {
    rows: RwLock<BTreeMap<ResourceId, Resource>>,
}

impl InMemoryResourceRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored resources.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    /// Whether the repository holds no resources.
    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

/// Fail if `candidate` collides with another live sibling in `rows`.
fn ensure_live_name_free(
    rows: &BTreeMap<ResourceId, Resource>,
    candidate: &Resource,
) -> AppResult<()> {
    if candidate.is_trashed {
        return Ok(());
    }
    let clash = rows.values().any(|r| {
        r.id != candidate.id
            && !r.is_trashed
            && r.parent_id == candidate.parent_id
            && r.name == candidate.name
            && r.is_directory == candidate.is_directory
    });
    if clash {
        return Err(AppError::conflict(format!(
            "Resource '{}' already exists in this location",
            candidate.name
        )));
    }
    Ok(())
}

#[async_trait]
impl ResourceRepository for InMemoryResourceRepository {
    async fn find_by_id(&self, id: &ResourceId) -> AppResult<Option<Resource>> {
        Ok(self.rows.read().await.get(id).cloned())
    }

    async fn find_by_ids(&self, ids: &[ResourceId]) -> AppResult<Vec<Resource>> {
        let rows = self.rows.read().await;
        Ok(ids.iter().filter_map(|id| rows.get(id).cloned()).collect())
    }

    async fn find_children(&self, parent_id: &ParentRef) -> AppResult<Vec<Resource>> {
        let mut children: Vec<Resource> = self
            .rows
            .read()
            .await
            .values()
            .filter(|r| r.parent_id == *parent_id)
            .cloned()
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(children)
    }

    async fn find_by_user_id(&self, user_id: &UserId) -> AppResult<Vec<Resource>> {
        let mut owned: Vec<Resource> = self
            .rows
            .read()
            .await
            .values()
            .filter(|r| r.user_id == *user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(owned)
    }

    async fn find_page(&self, query: &ResourceQuery) -> AppResult<PageResponse<Resource>> {
        let mut items: Vec<Resource> = self
            .rows
            .read()
            .await
            .values()
            .filter(|r| query.filters.iter().all(|f| f.matches(r)))
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            query
                .sort
                .direction
                .apply(query.sort.field.compare(a, b))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(paginate(
            items,
            query.page.page,
            query.page.page_size,
            query.page.offset(),
        ))
    }

    async fn create_many(&self, items: &[CreateResource]) -> AppResult<Vec<Resource>> {
        let mut rows = self.rows.write().await;
        let mut staged = rows.clone();
        let now = Utc::now();

        let mut created = Vec::with_capacity(items.len());
        for data in items {
            if staged.contains_key(&data.id) {
                return Err(AppError::conflict(format!(
                    "Resource '{}' already exists",
                    data.id
                )));
            }
            let resource = Resource {
                id: data.id,
                parent_id: data.parent_id,
                user_id: data.user_id,
                content_hash: data.content_hash.clone(),
                name: data.name.clone(),
                extension: data.extension.clone(),
                media_type: data.media_type.clone(),
                path: data.path.clone(),
                bytes_count: data.bytes_count,
                is_directory: data.is_directory,
                is_trashed: false,
                description: data.description.clone(),
                version: 1,
                created_at: now,
                last_updated_at: None,
            };
            staged.insert(resource.id, resource.clone());
            created.push(resource);
        }

        for resource in &created {
            ensure_live_name_free(&staged, resource)?;
        }

        *rows = staged;
        Ok(created)
    }

    async fn update_many(&self, items: &[Resource]) -> AppResult<Vec<Resource>> {
        let mut rows = self.rows.write().await;
        let mut staged = rows.clone();
        let now = Utc::now();

        let mut updated = Vec::with_capacity(items.len());
        for item in items {
            let current = staged
                .get(&item.id)
                .ok_or_else(|| AppError::not_found(format!("Resource '{}' not found", item.id)))?;
            let resource = Resource {
                id: current.id,
                user_id: current.user_id,
                is_directory: current.is_directory,
                created_at: current.created_at,
                version: current.version + 1,
                last_updated_at: Some(now),
                parent_id: item.parent_id,
                content_hash: item.content_hash.clone(),
                name: item.name.clone(),
                extension: item.extension.clone(),
                media_type: item.media_type.clone(),
                path: item.path.clone(),
                bytes_count: item.bytes_count,
                is_trashed: item.is_trashed,
                description: item.description.clone(),
            };
            staged.insert(resource.id, resource.clone());
            updated.push(resource);
        }

        for resource in &updated {
            ensure_live_name_free(&staged, resource)?;
        }

        *rows = staged;
        Ok(updated)
    }

    async fn delete_many(&self, ids: &[ResourceId]) -> AppResult<u64> {
        let mut rows = self.rows.write().await;
        Ok(ids.iter().filter(|id| rows.remove(*id).is_some()).count() as u64)
    }

    async fn delete_by_user_id(&self, user_id: &UserId) -> AppResult<u64> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|_, r| r.user_id != *user_id);
        Ok((before - rows.len()) as u64)
    }
}
