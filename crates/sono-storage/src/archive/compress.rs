use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::{FsError, FsResult};

/// Blocking body of [`super::compress`].
pub fn compress_blocking(entries: &[PathBuf], destination: &Path, level: i64) -> FsResult<()> {
    for entry in entries {
        if !entry.exists() {
            return Err(FsError::NotFound(entry.clone()));
        }
    }
    if destination.exists() {
        return Err(FsError::AlreadyExists(destination.to_path_buf()));
    }
    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.is_dir() {
            return Err(FsError::NotADirectory(parent.to_path_buf()));
        }
    }

    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(destination)
        .map_err(|e| FsError::io(destination, e))?;

    let result = write_archive(file, entries, level);
    if result.is_err() {
        if let Err(e) = fs::remove_file(destination) {
            warn!(path = %destination.display(), error = %e, "Failed to remove partial archive");
        }
    }
    result
}

fn write_archive(file: File, entries: &[PathBuf], level: i64) -> FsResult<()> {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(level));
    let mut writer = ZipWriter::new(file);

    for entry in entries {
        let name = entry
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut pending = vec![(entry.clone(), name)];
        while let Some((path, name)) = pending.pop() {
            if path.is_dir() {
                writer.add_directory(format!("{name}/"), options)?;
                let mut children = Vec::new();
                for child in fs::read_dir(&path).map_err(|e| FsError::io(&path, e))? {
                    let child = child.map_err(|e| FsError::io(&path, e))?;
                    children.push(child.path());
                }
                children.sort();
                // Reversed so the stack pops children in name order.
                for child in children.into_iter().rev() {
                    let child_name = child
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    pending.push((child, format!("{name}/{child_name}")));
                }
            } else {
                writer.start_file(name.as_str(), options)?;
                let mut source = File::open(&path).map_err(|e| FsError::io(&path, e))?;
                io::copy(&mut source, &mut writer).map_err(|e| FsError::io(&path, e))?;
                debug!(entry = %name, "Added file to archive");
            }
        }
    }

    writer.finish()?;
    Ok(())
}
