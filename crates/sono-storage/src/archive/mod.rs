//! Zip archive codec.
//!
//! The `zip` crate is synchronous, so every entry point hands its work to
//! the blocking pool.

mod compress;
mod extract;

use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Component, Path, PathBuf};

use tracing::warn;
use zip::ZipArchive;

use crate::error::{FsError, FsResult};

pub use compress::compress_blocking;
pub use extract::extract_blocking;

/// Compress `entries` into a new zip archive at `destination`.
///
/// Each entry is stored under its own name, directories recursively.
pub async fn compress(entries: Vec<PathBuf>, destination: PathBuf, level: i64) -> FsResult<()> {
    tokio::task::spawn_blocking(move || compress_blocking(&entries, &destination, level)).await?
}

/// Extract `archive` into `destination`, returning the top-level paths
/// that were created.
pub async fn extract(archive: PathBuf, destination: PathBuf) -> FsResult<Vec<PathBuf>> {
    tokio::task::spawn_blocking(move || extract_blocking(&archive, &destination)).await?
}

/// Whether `path` can be opened as a zip archive.
pub async fn is_archive(path: PathBuf) -> FsResult<bool> {
    tokio::task::spawn_blocking(move || {
        let file = File::open(&path).map_err(|e| FsError::io(&path, e))?;
        Ok(ZipArchive::new(file).is_ok())
    })
    .await?
}

/// Distinct first path components of the archive's entries, in entry order.
pub async fn top_level_names(path: PathBuf) -> FsResult<Vec<String>> {
    tokio::task::spawn_blocking(move || {
        let mut archive = open(&path)?;
        top_level(&mut archive)
    })
    .await?
}

fn open(path: &Path) -> FsResult<ZipArchive<File>> {
    let file = File::open(path).map_err(|e| FsError::io(path, e))?;
    ZipArchive::new(file).map_err(|source| FsError::InvalidArchive {
        path: path.to_path_buf(),
        source,
    })
}

/// Entry path confined to the extraction root, or `None` for entries that
/// would escape it.
fn enclosed<R: Read + Seek>(archive: &mut ZipArchive<R>, index: usize) -> FsResult<Option<PathBuf>> {
    let entry = archive.by_index(index)?;
    match entry.enclosed_name() {
        Some(path) => Ok(Some(path.to_path_buf())),
        None => {
            warn!(entry = entry.name(), "Skipping archive entry outside the extraction root");
            Ok(None)
        }
    }
}

fn top_level<R: Read + Seek>(archive: &mut ZipArchive<R>) -> FsResult<Vec<String>> {
    let mut names: Vec<String> = Vec::new();
    for index in 0..archive.len() {
        let Some(path) = enclosed(archive, index)? else {
            continue;
        };
        if let Some(Component::Normal(first)) = path.components().next() {
            let first = first.to_string_lossy().into_owned();
            if !names.contains(&first) {
                names.push(first);
            }
        }
    }
    Ok(names)
}
