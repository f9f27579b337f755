//! Invariant-checked filesystem primitives.
//!
//! Every mutating call checks its preconditions first: sources must
//! exist, targets must be free, and target parents must be existing
//! directories. Directory walks are iterative and yield parents before
//! their children.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::warn;

use crate::ByteStream;
use crate::error::{FsError, FsResult};

/// Cross-device link error (`EXDEV`).
const CROSS_DEVICE_ERRNO: i32 = 18;

/// Whether anything exists at `path`.
pub async fn exists(path: &Path) -> FsResult<bool> {
    fs::try_exists(path).await.map_err(|e| FsError::io(path, e))
}

/// Whether `path` is an existing directory.
pub async fn is_directory(path: &Path) -> FsResult<bool> {
    let meta = fs::metadata(path).await.map_err(|e| FsError::io(path, e))?;
    Ok(meta.is_dir())
}

/// Fail unless `path` is an existing directory.
pub async fn ensure_directory(path: &Path) -> FsResult<()> {
    if is_directory(path).await? {
        Ok(())
    } else {
        Err(FsError::NotADirectory(path.to_path_buf()))
    }
}

async fn ensure_present(path: &Path) -> FsResult<()> {
    if exists(path).await? {
        Ok(())
    } else {
        Err(FsError::NotFound(path.to_path_buf()))
    }
}

async fn ensure_absent(path: &Path) -> FsResult<()> {
    if exists(path).await? {
        Err(FsError::AlreadyExists(path.to_path_buf()))
    } else {
        Ok(())
    }
}

async fn ensure_target(path: &Path) -> FsResult<()> {
    ensure_absent(path).await?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_directory(parent).await?;
    }
    Ok(())
}

/// List the entries under `directory`.
///
/// With `recursive`, the whole subtree is returned breadth-first so every
/// directory precedes its contents. Entries within a directory are sorted
/// by name.
pub async fn list(directory: &Path, recursive: bool) -> FsResult<Vec<PathBuf>> {
    ensure_directory(directory).await?;

    let mut result = Vec::new();
    let mut pending = VecDeque::from([directory.to_path_buf()]);

    while let Some(current) = pending.pop_front() {
        let mut children = Vec::new();
        let mut entries = fs::read_dir(&current)
            .await
            .map_err(|e| FsError::io(&current, e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| FsError::io(&current, e))?
        {
            let is_dir = entry
                .file_type()
                .await
                .map_err(|e| FsError::io(entry.path(), e))?
                .is_dir();
            children.push((entry.path(), is_dir));
        }
        children.sort();

        for (path, is_dir) in children {
            if recursive && is_dir {
                pending.push_back(path.clone());
            }
            result.push(path);
        }
    }

    Ok(result)
}

/// Create a single directory. The parent must already exist.
pub async fn create_directory(path: &Path) -> FsResult<()> {
    ensure_target(path).await?;
    fs::create_dir(path).await.map_err(|e| FsError::io(path, e))
}

/// Create a directory and any missing ancestors. Existing directories are
/// left untouched.
pub async fn create_directories(path: &Path) -> FsResult<()> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| FsError::io(path, e))
}

/// Write `content` to a new file at `path`, returning the bytes written.
///
/// A partially written file is removed when the stream fails.
pub async fn create_file(path: &Path, content: ByteStream) -> FsResult<u64> {
    ensure_target(path).await?;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .map_err(|e| FsError::io(path, e))?;

    let result = write_stream(&mut file, path, content).await;
    drop(file);

    if result.is_err() {
        if let Err(e) = fs::remove_file(path).await {
            warn!(path = %path.display(), error = %e, "Failed to remove partial file");
        }
    }
    result
}

async fn write_stream(file: &mut fs::File, path: &Path, mut content: ByteStream) -> FsResult<u64> {
    let mut written = 0u64;
    while let Some(chunk) = content.next().await {
        let chunk = chunk.map_err(|e| FsError::io(path, e))?;
        file.write_all(&chunk)
            .await
            .map_err(|e| FsError::io(path, e))?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(|e| FsError::io(path, e))?;
    Ok(written)
}

/// Remove a file or a whole directory tree.
pub async fn remove(path: &Path) -> FsResult<()> {
    let meta = fs::symlink_metadata(path)
        .await
        .map_err(|e| FsError::io(path, e))?;
    let result = if meta.is_dir() {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    };
    result.map_err(|e| FsError::io(path, e))
}

/// Copy a file or directory tree from `source` to the free path `target`.
pub async fn copy(source: &Path, target: &Path) -> FsResult<()> {
    ensure_present(source).await?;
    ensure_target(target).await?;

    if !is_directory(source).await? {
        fs::copy(source, target)
            .await
            .map_err(|e| FsError::io(source, e))?;
        return Ok(());
    }

    let mut pending = vec![(source.to_path_buf(), target.to_path_buf())];
    while let Some((from, to)) = pending.pop() {
        fs::create_dir(&to).await.map_err(|e| FsError::io(&to, e))?;
        let mut entries = fs::read_dir(&from)
            .await
            .map_err(|e| FsError::io(&from, e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| FsError::io(&from, e))?
        {
            let child_to = to.join(entry.file_name());
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| FsError::io(entry.path(), e))?;
            if file_type.is_dir() {
                pending.push((entry.path(), child_to));
            } else {
                fs::copy(entry.path(), &child_to)
                    .await
                    .map_err(|e| FsError::io(entry.path(), e))?;
            }
        }
    }
    Ok(())
}

/// Move `source` to the free path `target`.
///
/// Falls back to copy-then-remove when the rename crosses filesystems.
pub async fn move_entry(source: &Path, target: &Path) -> FsResult<()> {
    ensure_present(source).await?;
    ensure_target(target).await?;

    match fs::rename(source, target).await {
        Ok(()) => Ok(()),
        Err(e) if e.raw_os_error() == Some(CROSS_DEVICE_ERRNO) => {
            copy(source, target).await?;
            remove(source).await
        }
        Err(e) => Err(FsError::io(source, e)),
    }
}

/// Rename `source` within its own directory, returning the new path.
pub async fn rename(source: &Path, new_name: &str) -> FsResult<PathBuf> {
    let target = match source.parent() {
        Some(parent) => parent.join(new_name),
        None => PathBuf::from(new_name),
    };
    move_entry(source, &target).await?;
    Ok(target)
}

/// Size in bytes of a file, or the summed size of every file under a
/// directory.
pub async fn bytes_count(path: &Path) -> FsResult<u64> {
    let meta = fs::metadata(path).await.map_err(|e| FsError::io(path, e))?;
    if !meta.is_dir() {
        return Ok(meta.len());
    }

    let mut total = 0u64;
    for entry in list(path, true).await? {
        let meta = fs::metadata(&entry)
            .await
            .map_err(|e| FsError::io(&entry, e))?;
        if meta.is_file() {
            total += meta.len();
        }
    }
    Ok(total)
}
