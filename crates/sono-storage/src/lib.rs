//! # sono-storage
//!
//! Physical side of Sono: invariant-checked filesystem primitives,
//! SHA-512 content addressing, zip compression/extraction, and media
//! type detection. Nothing in this crate knows about resource metadata.

pub mod archive;
pub mod error;
pub mod fs;
pub mod hash;
pub mod media;

use std::io;
use std::pin::Pin;

use bytes::Bytes;
use futures::Stream;

pub use error::{FsError, FsResult};

/// A byte stream used to feed file contents in and out.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, io::Error>> + Send>>;

/// Stream the contents of an open file.
pub fn stream_file(file: tokio::fs::File) -> ByteStream {
    Box::pin(tokio_util::io::ReaderStream::new(file))
}

/// A stream yielding a single in-memory chunk.
pub fn stream_bytes(data: impl Into<Bytes>) -> ByteStream {
    Box::pin(futures::stream::once(futures::future::ready(Ok(data.into()))))
}
