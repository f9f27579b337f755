//! Resource creation, lookup, listing, removal and content access.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::OwnedMutexGuard;
use tracing::{error, info, warn};

use sono_core::config::{ListingConfig, StorageConfig};
use sono_core::error::{AppError, ErrorKind};
use sono_core::result::AppResult;
use sono_core::types::{ListRequest, PageResponse, ParentRef, ResourceId, UserId};
use sono_database::{ResourceRepository, StorageRepository};
use sono_entity::resource::{CreateResource, Resource, ResourceFilter, ResourceSortField};
use sono_entity::storage::Storage;
use sono_storage::{ByteStream, FsError, archive, fs, hash};

use super::cascade::{descendants, is_below, path_string};
use crate::lock::StorageLocks;
use crate::{naming, validate};

/// Executes structural operations on the resource tree.
///
/// Every mutation changes the filesystem first and the metadata second,
/// while holding the lock of the owning storage.
#[derive(Debug, Clone)]
pub struct ResourceService {
    /// Storage records, used to resolve storage parents and trash roots.
    pub(super) storages: Arc<dyn StorageRepository>,
    /// Resource records.
    pub(super) resources: Arc<dyn ResourceRepository>,
    /// Per-storage mutation locks, shared with the storage service.
    pub(super) locks: Arc<StorageLocks>,
    /// Physical layout settings.
    pub(super) config: StorageConfig,
    /// Paging defaults and bounds.
    listing: ListingConfig,
}

/// Request to create a file or directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateResourceRequest {
    /// Storage or directory resource to create the resource in.
    pub parent_id: String,
    /// Owner of the new resource.
    pub user_id: String,
    /// Display name.
    pub name: String,
    /// Whether to create a directory.
    pub is_directory: bool,
    /// Optional free-form description.
    pub description: Option<String>,
}

/// A readable handle on a resource's bytes.
#[derive(Debug, Clone)]
pub struct ResourceContent {
    /// File to stream.
    pub path: PathBuf,
    /// Name to present to the reader.
    pub name: String,
    /// Size of the file.
    pub bytes_count: u64,
    /// Media type, if known.
    pub media_type: Option<String>,
    /// Set when the file is a scratch archive the caller may delete after use.
    pub temporary: bool,
}

impl ResourceContent {
    /// Open the file as a byte stream.
    pub async fn stream(&self) -> AppResult<ByteStream> {
        let file = tokio::fs::File::open(&self.path)
            .await
            .map_err(|e| FsError::io(&self.path, e))?;
        Ok(sono_storage::stream_file(file))
    }
}

/// A resolved place new or moved resources can live in.
#[derive(Debug, Clone)]
pub(super) struct Destination {
    /// The parent reference children will record.
    pub parent_id: ParentRef,
    /// Owner of the destination.
    pub user_id: UserId,
    /// Directory on disk.
    pub path: PathBuf,
}

impl Destination {
    pub fn ensure_owned_by(&self, user_id: UserId) -> AppResult<()> {
        if self.user_id != user_id {
            return Err(AppError::conflict(format!(
                "Destination '{}' belongs to another user",
                self.parent_id
            )));
        }
        Ok(())
    }
}

impl ResourceService {
    /// Creates a new resource service.
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

    /// Creates a directory, or a file filled from `content`.
    pub async fn create_resource(
        &self,
        req: CreateResourceRequest,
        content: Option<ByteStream>,
    ) -> AppResult<Resource> {
        let parent_id: ParentRef = validate::id("parent_id", &req.parent_id)?;
        let user_id: UserId = validate::id("user_id", &req.user_id)?;
        validate::name("name", &req.name)?;
        let description = validate::description(req.description)?;
        let content = match (req.is_directory, content) {
            (false, None) => {
                return Err(AppError::validation("content is required to create a file"));
            }
            (true, _) => None,
            (false, content) => content,
        };

        let _guard = self.locks.acquire(user_id).await;

        let destination = self.resolve_destination(&parent_id).await?;
        destination.ensure_owned_by(user_id)?;
        self.ensure_name_free(&parent_id, &req.name, req.is_directory)
            .await?;

        let path = destination.path.join(&req.name);
        let (content_hash, bytes_count) = match content {
            Some(content) => {
                let written = fs::create_file(&path, content).await?;
                (Some(hash::content_hash(&path).await?), written)
            }
            None => {
                fs::create_directory(&path).await?;
                (None, 0)
            }
        };

        let data = CreateResource {
            id: ResourceId::new(),
            parent_id,
            user_id,
            content_hash,
            extension: naming::extension(&req.name, req.is_directory),
            media_type: naming::media_type(&req.name, req.is_directory),
            name: req.name,
            path: path_string(&path),
            bytes_count: bytes_count as i64,
            is_directory: req.is_directory,
            description,
        };
        let resource = self.persist_new_one(data, "create").await?;

        info!(
            resource_id = %resource.id,
            parent_id = %resource.parent_id,
            path = %resource.path,
            "Resource created"
        );

        Ok(resource)
    }

    /// Gets a resource by ID.
    pub async fn get_resource(&self, id: &str) -> AppResult<Resource> {
        let id: ResourceId = validate::id("id", id)?;
        self.find(&id).await
    }

    /// Filtered, sorted, paged listing of resources.
    pub async fn list_resources(&self, req: &ListRequest) -> AppResult<PageResponse<Resource>> {
        let query = req.validate::<ResourceSortField, ResourceFilter>(&self.listing)?;
        self.resources.find_page(&query).await?.ensure_page_in_range()
    }

    /// Deletes a resource, its subtree on disk and every descendant record.
    pub async fn remove_resource(&self, id: &str) -> AppResult<()> {
        let id: ResourceId = validate::id("id", id)?;
        let (_guard, resource) = self.lock_resource(&id).await?;

        let below = descendants(self.resources.as_ref(), &resource).await?;

        remove_tolerant(resource.fs_path()).await?;
        // Descendants trashed on their own sit outside the subtree.
        for child in &below {
            if !is_below(child.fs_path(), resource.fs_path()) {
                remove_tolerant(child.fs_path()).await?;
            }
        }

        let mut ids: Vec<ResourceId> = below.iter().map(|r| r.id).collect();
        ids.push(resource.id);
        let removed = self.resources.delete_many(&ids).await.inspect_err(|e| {
            error!(
                resource_id = %resource.id,
                error = %e,
                "Resource removed from disk but its records were not deleted"
            );
        })?;

        info!(resource_id = %resource.id, records = removed, "Resource removed");

        Ok(())
    }

    /// Sets or clears the description of a live resource.
    pub async fn update_description(
        &self,
        id: &str,
        description: Option<String>,
    ) -> AppResult<Resource> {
        let id: ResourceId = validate::id("id", id)?;
        let description = validate::description(description)?;
        let (_guard, mut resource) = self.lock_resource(&id).await?;
        ensure_live(&resource)?;

        resource.description = description;
        let resource = self.resources.update(&resource).await?;

        info!(resource_id = %resource.id, "Resource description updated");

        Ok(resource)
    }

    /// Resolves the bytes of a resource for reading.
    ///
    /// A directory is zipped into the storage's temporary directory first.
    pub async fn open_content(&self, id: &str) -> AppResult<ResourceContent> {
        let id: ResourceId = validate::id("id", id)?;
        let resource = self.find(&id).await?;
        ensure_live(&resource)?;

        if resource.is_file() {
            return Ok(ResourceContent {
                path: PathBuf::from(&resource.path),
                bytes_count: resource.bytes_count.max(0) as u64,
                media_type: resource.media_type.clone(),
                name: resource.name,
                temporary: false,
            });
        }

        let _guard = self.locks.acquire(resource.user_id).await;
        let storage = self.storage_of(resource.user_id).await?;
        let name = format!("{} {}.zip", resource.name, naming::timestamp_nanos());
        let target = storage.subdirectory(&self.config.temporary_directory).join(&name);

        archive::compress(
            vec![PathBuf::from(&resource.path)],
            target.clone(),
            self.config.compression_level,
        )
        .await?;
        let bytes_count = fs::bytes_count(&target).await?;

        info!(resource_id = %resource.id, archive = %target.display(), "Directory archived for reading");

        Ok(ResourceContent {
            path: target,
            name,
            bytes_count,
            media_type: sono_storage::media::media_type("zip"),
            temporary: true,
        })
    }

    // ── Shared helpers ──────────────────────────────────────────────

    pub(super) async fn find(&self, id: &ResourceId) -> AppResult<Resource> {
        self.resources
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Resource '{id}' not found")))
    }

    /// Lock the storage owning `id` and load the resource under the lock.
    pub(super) async fn lock_resource(
        &self,
        id: &ResourceId,
    ) -> AppResult<(OwnedMutexGuard<()>, Resource)> {
        let owner = self.find(id).await?.user_id;
        let guard = self.locks.acquire(owner).await;
        let resource = self.find(id).await?;
        Ok((guard, resource))
    }

    pub(super) async fn storage_of(&self, user_id: UserId) -> AppResult<Storage> {
        self.storages
            .find_by_user_id(&user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Storage of user '{user_id}' not found")))
    }

    /// Resolve a parent reference to a live directory.
    pub(super) async fn resolve_destination(&self, parent_id: &ParentRef) -> AppResult<Destination> {
        match parent_id {
            ParentRef::Storage(id) => {
                let storage = self
                    .storages
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| AppError::not_found(format!("Storage '{id}' not found")))?;
                Ok(Destination {
                    parent_id: *parent_id,
                    user_id: storage.user_id,
                    path: PathBuf::from(storage.path),
                })
            }
            ParentRef::Resource(id) => {
                let parent = self.find(id).await?;
                if parent.is_trashed {
                    return Err(AppError::conflict(format!("Resource '{id}' is in the trash")));
                }
                if !parent.is_directory {
                    return Err(AppError::conflict(format!(
                        "Resource '{id}' is not a directory"
                    )));
                }
                Ok(Destination {
                    parent_id: *parent_id,
                    user_id: parent.user_id,
                    path: PathBuf::from(parent.path),
                })
            }
        }
    }

    /// Live children of `parent_id`.
    pub(super) async fn live_children(&self, parent_id: &ParentRef) -> AppResult<Vec<Resource>> {
        let mut children = self.resources.find_children(parent_id).await?;
        children.retain(|c| !c.is_trashed);
        Ok(children)
    }

    /// Fail if a live sibling already holds `(name, is_directory)`.
    pub(super) async fn ensure_name_free(
        &self,
        parent_id: &ParentRef,
        name: &str,
        is_directory: bool,
    ) -> AppResult<()> {
        let taken = self
            .live_children(parent_id)
            .await?
            .iter()
            .any(|c| c.name == name && c.is_directory == is_directory);
        if taken {
            return Err(AppError::conflict(format!("'{name}' already exists")));
        }
        Ok(())
    }

    /// Describe a freshly created filesystem subtree as resource rows.
    ///
    /// `root` becomes a child of `parent_id`; everything below it is
    /// parented to its enclosing directory's new id. Rows are ordered
    /// parents first.
    pub(super) async fn describe_tree(
        &self,
        root: &Path,
        parent_id: ParentRef,
        user_id: UserId,
    ) -> AppResult<Vec<CreateResource>> {
        let root_row = describe_entry(root, parent_id, user_id).await?;
        let mut directories = HashMap::from([(root.to_path_buf(), root_row.id)]);
        let is_directory = root_row.is_directory;
        let mut rows = vec![root_row];

        if is_directory {
            for entry in fs::list(root, true).await? {
                let parent = entry
                    .parent()
                    .and_then(|p| directories.get(p))
                    .copied()
                    .ok_or_else(|| {
                        AppError::internal(format!("No parent recorded for '{}'", entry.display()))
                    })?;
                let row = describe_entry(&entry, ParentRef::Resource(parent), user_id).await?;
                if row.is_directory {
                    directories.insert(entry, row.id);
                }
                rows.push(row);
            }
        }
        Ok(rows)
    }

    /// Insert rows for entries already on disk, logging the divergence on failure.
    pub(super) async fn persist_new(
        &self,
        rows: &[CreateResource],
        operation: &'static str,
    ) -> AppResult<Vec<Resource>> {
        self.resources.create_many(rows).await.inspect_err(|e| {
            error!(
                operation,
                paths = ?rows.iter().map(|r| r.path.as_str()).collect::<Vec<_>>(),
                error = %e,
                "Filesystem changed but resource records were not created"
            );
        })
    }

    pub(super) async fn persist_new_one(
        &self,
        row: CreateResource,
        operation: &'static str,
    ) -> AppResult<Resource> {
        self.persist_new(std::slice::from_ref(&row), operation)
            .await?
            .pop()
            .ok_or_else(|| AppError::internal("Insert returned no row"))
    }

    /// Write back moved rows, logging the divergence on failure.
    ///
    /// The first row is the resource the operation targeted.
    pub(super) async fn persist_moved(
        &self,
        rows: Vec<Resource>,
        operation: &'static str,
    ) -> AppResult<Resource> {
        let updated = self.resources.update_many(&rows).await.inspect_err(|e| {
            error!(
                operation,
                resource_id = ?rows.first().map(|r| r.id),
                error = %e,
                "Filesystem changed but resource records were not updated"
            );
        })?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| AppError::internal("Update returned no row"))
    }
}

/// Fail with a conflict if the resource is trashed.
pub(super) fn ensure_live(resource: &Resource) -> AppResult<()> {
    if resource.is_trashed {
        return Err(AppError::conflict(format!(
            "Resource '{}' is in the trash",
            resource.id
        )));
    }
    Ok(())
}

async fn describe_entry(
    path: &Path,
    parent_id: ParentRef,
    user_id: UserId,
) -> AppResult<CreateResource> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| AppError::internal(format!("'{}' has no file name", path.display())))?;
    let is_directory = fs::is_directory(path).await?;
    let content_hash = if is_directory {
        None
    } else {
        Some(hash::content_hash(path).await?)
    };

    Ok(CreateResource {
        id: ResourceId::new(),
        parent_id,
        user_id,
        content_hash,
        extension: naming::extension(&name, is_directory),
        media_type: naming::media_type(&name, is_directory),
        path: path_string(path),
        bytes_count: fs::bytes_count(path).await? as i64,
        is_directory,
        description: None,
        name,
    })
}

/// Remove a path, treating an already missing one as done.
async fn remove_tolerant(path: &Path) -> AppResult<()> {
    match fs::remove(path).await {
        Ok(()) => Ok(()),
        Err(FsError::NotFound(_)) => {
            warn!(path = %path.display(), "Resource path already missing on disk");
            Ok(())
        }
        Err(e) => Err(AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to remove '{}'", path.display()),
            e,
        )),
    }
}
