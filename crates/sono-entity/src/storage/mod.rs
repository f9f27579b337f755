//! Storage domain entities.

pub mod model;
pub mod query;

pub use model::{CreateStorage, Storage};
pub use query::{StorageFilter, StorageSortField};
