//! SHA-512 content addressing.

use std::path::Path;

use sha2::{Digest, Sha512};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, BufReader};

use crate::error::{FsError, FsResult};

const BUFFER_SIZE: usize = 8 * 1024;

/// Uppercase hex SHA-512 of a file's contents, streamed in fixed-size chunks.
pub async fn content_hash(path: &Path) -> FsResult<String> {
    let file = File::open(path).await.map_err(|e| FsError::io(path, e))?;
    let mut reader = BufReader::with_capacity(BUFFER_SIZE, file);
    let mut hasher = Sha512::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let read = reader
            .read(&mut buffer)
            .await
            .map_err(|e| FsError::io(path, e))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hex::encode_upper(hasher.finalize()))
}

/// Uppercase hex SHA-512 of an in-memory value.
pub fn digest(bytes: &[u8]) -> String {
    hex::encode_upper(Sha512::digest(bytes))
}
