//! # sono-service
//!
//! Business logic for Sono. [`StorageService`] owns the per-user storage
//! roots and [`ResourceService`] executes every structural operation on
//! the resource tree, keeping the filesystem and the metadata store in
//! step.
//!
//! Services follow constructor injection: repositories, the shared
//! [`StorageLocks`] and configuration are handed in at construction time.

pub mod lock;
pub mod naming;
pub mod resource;
pub mod storage;
pub mod validate;

pub use lock::StorageLocks;
pub use resource::{CreateResourceRequest, ResourceContent, ResourceService};
pub use storage::{ConsistencyReport, StorageService};
