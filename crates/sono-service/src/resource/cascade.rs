//! Descendant traversal and path rebasing after structural changes.

use std::collections::VecDeque;
use std::path::Path;

use sono_core::result::AppResult;
use sono_core::types::ParentRef;
use sono_database::ResourceRepository;
use sono_entity::resource::Resource;

/// Every resource below `root`, parents before children.
///
/// Walks the metadata tree breadth-first with an explicit queue, so depth
/// is bounded only by memory.
pub(crate) async fn descendants(
    resources: &dyn ResourceRepository,
    root: &Resource,
) -> AppResult<Vec<Resource>> {
    let mut result = Vec::new();
    if !root.is_directory {
        return Ok(result);
    }

    let mut pending = VecDeque::from([root.id]);
    while let Some(id) = pending.pop_front() {
        for child in resources.find_children(&ParentRef::Resource(id)).await? {
            if child.is_directory {
                pending.push_back(child.id);
            }
            result.push(child);
        }
    }
    Ok(result)
}

/// Move every descendant recorded under `old_root` to the same relative
/// position under `new_root`, optionally setting the trashed flag.
///
/// Descendants living elsewhere (trashed on their own earlier) are left
/// out of the result.
pub(crate) fn rebase(
    descendants: Vec<Resource>,
    old_root: &Path,
    new_root: &Path,
    trashed: Option<bool>,
) -> Vec<Resource> {
    descendants
        .into_iter()
        .filter_map(|mut resource| {
            let relative = Path::new(&resource.path).strip_prefix(old_root).ok()?;
            resource.path = path_string(&new_root.join(relative));
            if let Some(trashed) = trashed {
                resource.is_trashed = trashed;
            }
            Some(resource)
        })
        .collect()
}

/// Whether `path` lies strictly below `root`.
pub(crate) fn is_below(path: &Path, root: &Path) -> bool {
    path != root && path.starts_with(root)
}

pub(crate) fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
