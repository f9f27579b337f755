use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{enclosed, open, top_level};
use crate::error::{FsError, FsResult};

/// Blocking body of [`super::extract`].
///
/// Every top-level name in the archive is checked against `destination`
/// before anything is written, so a colliding archive leaves the
/// filesystem untouched.
pub fn extract_blocking(archive_path: &Path, destination: &Path) -> FsResult<Vec<PathBuf>> {
    let mut archive = open(archive_path)?;

    let roots = top_level(&mut archive)?;
    for root in &roots {
        let path = destination.join(root);
        if path.symlink_metadata().is_ok() {
            return Err(FsError::AlreadyExists(path));
        }
    }

    fs::create_dir_all(destination).map_err(|e| FsError::io(destination, e))?;

    for index in 0..archive.len() {
        let Some(relative) = enclosed(&mut archive, index)? else {
            continue;
        };
        if relative.as_os_str().is_empty() {
            continue;
        }
        let out_path = destination.join(&relative);
        let mut entry = archive.by_index(index)?;

        if entry.is_dir() {
            if out_path.exists() && !out_path.is_dir() {
                return Err(FsError::AlreadyExists(out_path));
            }
            fs::create_dir_all(&out_path).map_err(|e| FsError::io(&out_path, e))?;
            continue;
        }

        // Duplicate file entries within one archive.
        if out_path.symlink_metadata().is_ok() {
            return Err(FsError::AlreadyExists(out_path));
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(|e| FsError::io(parent, e))?;
        }
        let mut out_file = File::create(&out_path).map_err(|e| FsError::io(&out_path, e))?;
        io::copy(&mut entry, &mut out_file).map_err(|e| FsError::io(&out_path, e))?;
        debug!(path = %out_path.display(), "Extracted archive entry");
    }

    Ok(roots
        .into_iter()
        .map(|root| destination.join(root))
        .filter(|path| path.exists())
        .collect())
}
