//! Structural moves of existing resources: trash, restore, copy, move, rename.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::info;

use sono_core::error::{AppError, ErrorKind};
use sono_core::result::AppResult;
use sono_core::types::{ParentRef, ResourceId};
use sono_entity::resource::Resource;
use sono_storage::fs;

use super::cascade::{descendants, path_string, rebase};
use super::service::{ResourceService, ensure_live};
use crate::{naming, validate};

impl ResourceService {
    /// Moves a resource into its storage's trash.
    ///
    /// The record keeps its name and parent; only the physical entry is
    /// relocated, with a timestamp suffix if the trash already holds that
    /// name. The suffixed name exists only on disk, in `path`.
    pub async fn trash_resource(&self, id: &str) -> AppResult<Resource> {
        let id: ResourceId = validate::id("id", id)?;
        let (_guard, mut resource) = self.lock_resource(&id).await?;
        if resource.is_trashed {
            return Err(AppError::conflict(format!(
                "Resource '{id}' is already in the trash"
            )));
        }

        let storage = self.storage_of(resource.user_id).await?;
        let trash = storage.subdirectory(&self.config.trash_directory);
        let mut target = trash.join(&resource.name);
        while fs::exists(&target).await? {
            let name = naming::trash_name(
                &resource.name,
                resource.is_directory,
                naming::timestamp_nanos(),
            );
            target = trash.join(name);
        }

        let below = descendants(self.resources.as_ref(), &resource).await?;
        let old_path = PathBuf::from(&resource.path);
        fs::move_entry(&old_path, &target).await?;

        resource.path = path_string(&target);
        resource.is_trashed = true;
        let mut rows = vec![resource];
        rows.extend(rebase(below, &old_path, &target, Some(true)));
        let resource = self.persist_moved(rows, "trash").await?;

        info!(resource_id = %resource.id, path = %resource.path, "Resource trashed");

        Ok(resource)
    }

    /// Moves a trashed resource back under its recorded parent.
    pub async fn restore_resource(&self, id: &str) -> AppResult<Resource> {
        let id: ResourceId = validate::id("id", id)?;
        let (_guard, mut resource) = self.lock_resource(&id).await?;
        if !resource.is_trashed {
            return Err(AppError::conflict(format!("Resource '{id}' is not in the trash")));
        }

        let destination = self
            .resolve_destination(&resource.parent_id)
            .await
            .map_err(|e| {
                if e.is(ErrorKind::NotFound) {
                    AppError::conflict(format!(
                        "Destination '{}' no longer exists",
                        resource.parent_id
                    ))
                } else {
                    e
                }
            })?;
        self.ensure_name_free(&resource.parent_id, &resource.name, resource.is_directory)
            .await?;

        let below = descendants(self.resources.as_ref(), &resource).await?;
        let old_path = PathBuf::from(&resource.path);
        let target = destination.path.join(&resource.name);
        fs::move_entry(&old_path, &target).await?;

        resource.path = path_string(&target);
        resource.is_trashed = false;
        let mut rows = vec![resource];
        rows.extend(rebase(below, &old_path, &target, Some(false)));
        let resource = self.persist_moved(rows, "restore").await?;

        info!(resource_id = %resource.id, path = %resource.path, "Resource restored");

        Ok(resource)
    }

    /// Duplicates a resource next to itself as `<name> copy`, `<name> copy 2`, ...
    ///
    /// The copy and every copied descendant are new entities: fresh ids,
    /// recomputed hashes, no description.
    pub async fn copy_resource(&self, id: &str) -> AppResult<Resource> {
        let id: ResourceId = validate::id("id", id)?;
        let (_guard, resource) = self.lock_resource(&id).await?;
        ensure_live(&resource)?;

        let parent_path = resource
            .fs_path()
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| AppError::internal(format!("Resource '{id}' has no parent path")))?;
        let siblings: HashSet<String> = self
            .live_children(&resource.parent_id)
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect();

        let mut attempt = 1;
        let (name, target) = loop {
            let name = naming::copy_name(&resource.name, resource.is_directory, attempt);
            let target = parent_path.join(&name);
            if !siblings.contains(&name) && !fs::exists(&target).await? {
                break (name, target);
            }
            attempt += 1;
        };

        fs::copy(resource.fs_path(), &target).await?;

        let rows = self
            .describe_tree(&target, resource.parent_id, resource.user_id)
            .await?;
        let copy = self
            .persist_new(&rows, "copy")
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::internal("Insert returned no row"))?;

        info!(
            resource_id = %resource.id,
            copy_id = %copy.id,
            name = %name,
            records = rows.len(),
            "Resource copied"
        );

        Ok(copy)
    }

    /// Moves a resource under another storage root or directory.
    pub async fn move_resource(&self, id: &str, new_parent_id: &str) -> AppResult<Resource> {
        let id: ResourceId = validate::id("id", id)?;
        let new_parent_id: ParentRef = validate::id("parent_id", new_parent_id)?;
        if new_parent_id == ParentRef::Resource(id) {
            return Err(AppError::conflict(format!(
                "Resource '{id}' cannot be moved into itself"
            )));
        }

        let (_guard, mut resource) = self.lock_resource(&id).await?;
        ensure_live(&resource)?;

        let destination = self.resolve_destination(&new_parent_id).await?;
        destination.ensure_owned_by(resource.user_id)?;

        let below = descendants(self.resources.as_ref(), &resource).await?;
        if below
            .iter()
            .any(|d| ParentRef::Resource(d.id) == new_parent_id)
        {
            return Err(AppError::conflict(format!(
                "Resource '{id}' cannot be moved into one of its descendants"
            )));
        }
        self.ensure_name_free(&new_parent_id, &resource.name, resource.is_directory)
            .await?;

        let old_path = PathBuf::from(&resource.path);
        let target = destination.path.join(&resource.name);
        fs::move_entry(&old_path, &target).await?;

        resource.parent_id = new_parent_id;
        resource.path = path_string(&target);
        let mut rows = vec![resource];
        rows.extend(rebase(below, &old_path, &target, None));
        let resource = self.persist_moved(rows, "move").await?;

        info!(
            resource_id = %resource.id,
            parent_id = %resource.parent_id,
            path = %resource.path,
            "Resource moved"
        );

        Ok(resource)
    }

    /// Renames a resource in place. Extension and media type follow the new name.
    pub async fn rename_resource(&self, id: &str, new_name: &str) -> AppResult<Resource> {
        let id: ResourceId = validate::id("id", id)?;
        validate::name("name", new_name)?;

        let (_guard, mut resource) = self.lock_resource(&id).await?;
        ensure_live(&resource)?;
        self.ensure_name_free(&resource.parent_id, new_name, resource.is_directory)
            .await?;

        let below = descendants(self.resources.as_ref(), &resource).await?;
        let old_path = PathBuf::from(&resource.path);
        let target = fs::rename(&old_path, new_name).await?;

        resource.name = new_name.to_string();
        resource.extension = naming::extension(new_name, resource.is_directory);
        resource.media_type = naming::media_type(new_name, resource.is_directory);
        resource.path = path_string(&target);
        let mut rows = vec![resource];
        rows.extend(rebase(below, &old_path, &target, None));
        let resource = self.persist_moved(rows, "rename").await?;

        info!(resource_id = %resource.id, name = %resource.name, "Resource renamed");

        Ok(resource)
    }
}
