//! Archive operations: compressing resources and extracting archives.

use std::collections::HashSet;
use std::path::PathBuf;

use tracing::info;

use sono_core::error::AppError;
use sono_core::result::AppResult;
use sono_core::types::{ParentRef, ResourceId};
use sono_entity::resource::Resource;
use sono_storage::{FsError, archive};

use super::service::{ResourceService, ensure_live};
use crate::validate;

impl ResourceService {
    /// Compresses resources into a new zip file resource named `name`
    /// under `parent_id`.
    pub async fn compress_resources(
        &self,
        ids: &[String],
        parent_id: &str,
        name: &str,
    ) -> AppResult<Resource> {
        if ids.is_empty() {
            return Err(AppError::validation("resource_ids cannot be empty"));
        }
        let ids = ids
            .iter()
            .map(|id| validate::id::<ResourceId>("resource_ids", id))
            .collect::<AppResult<Vec<_>>>()?;
        let parent_id: ParentRef = validate::id("parent_id", parent_id)?;
        validate::name("name", name)?;
        if let ParentRef::Resource(parent) = parent_id {
            if ids.contains(&parent) {
                return Err(AppError::conflict(
                    "parent_id cannot be one of the compressed resources",
                ));
            }
        }

        let owner = self.find(&ids[0]).await?.user_id;
        let _guard = self.locks.acquire(owner).await;

        let mut inputs = Vec::with_capacity(ids.len());
        let mut seen_names = HashSet::new();
        for id in &ids {
            let resource = self.find(id).await?;
            ensure_live(&resource)?;
            if resource.user_id != owner {
                return Err(AppError::conflict(format!(
                    "Resource '{id}' belongs to another user"
                )));
            }
            if !seen_names.insert(resource.name.clone()) {
                return Err(AppError::conflict(format!(
                    "More than one resource is named '{}'",
                    resource.name
                )));
            }
            inputs.push(resource);
        }

        let destination = self.resolve_destination(&parent_id).await?;
        destination.ensure_owned_by(owner)?;
        if inputs
            .iter()
            .any(|input| destination.path.starts_with(input.fs_path()))
        {
            return Err(AppError::conflict(
                "The archive cannot be placed inside a resource being compressed",
            ));
        }
        self.ensure_name_free(&parent_id, name, false).await?;

        let target = destination.path.join(name);
        let paths: Vec<PathBuf> = inputs.iter().map(|r| PathBuf::from(&r.path)).collect();
        archive::compress(paths, target.clone(), self.config.compression_level).await?;

        let rows = self.describe_tree(&target, parent_id, owner).await?;
        let resource = self
            .persist_new(&rows, "compress")
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::internal("Insert returned no row"))?;

        info!(
            resource_id = %resource.id,
            inputs = inputs.len(),
            bytes = resource.bytes_count,
            "Resources compressed"
        );

        Ok(resource)
    }

    /// Extracts a zip file resource under `parent_id`, returning the
    /// top-level resources it produced.
    pub async fn extract_resource(&self, id: &str, parent_id: &str) -> AppResult<Vec<Resource>> {
        let id: ResourceId = validate::id("id", id)?;
        let parent_id: ParentRef = validate::id("parent_id", parent_id)?;

        let (_guard, resource) = self.lock_resource(&id).await?;
        ensure_live(&resource)?;
        if resource.is_directory || !archive::is_archive(PathBuf::from(&resource.path)).await? {
            return Err(AppError::validation(format!("Resource '{id}' is not an archive")));
        }

        let destination = self.resolve_destination(&parent_id).await?;
        destination.ensure_owned_by(resource.user_id)?;

        let live: HashSet<String> = self
            .live_children(&parent_id)
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect();
        for entry in archive::top_level_names(PathBuf::from(&resource.path)).await? {
            if live.contains(&entry) {
                return Err(AppError::conflict(format!("'{entry}' already exists")));
            }
        }

        let created = archive::extract(PathBuf::from(&resource.path), destination.path.clone())
            .await
            .map_err(|e| match e {
                FsError::AlreadyExists(path) => AppError::conflict(format!(
                    "Archive entry '{}' collides with an existing entry",
                    path.display()
                )),
                other => other.into(),
            })?;

        let mut rows = Vec::new();
        let mut top_level = HashSet::new();
        for root in &created {
            let tree = self
                .describe_tree(root, parent_id, resource.user_id)
                .await?;
            if let Some(first) = tree.first() {
                top_level.insert(first.id);
            }
            rows.extend(tree);
        }
        let extracted: Vec<Resource> = self
            .persist_new(&rows, "extract")
            .await?
            .into_iter()
            .filter(|r| top_level.contains(&r.id))
            .collect();

        info!(
            resource_id = %resource.id,
            parent_id = %parent_id,
            entries = rows.len(),
            "Archive extracted"
        );

        Ok(extracted)
    }
}
