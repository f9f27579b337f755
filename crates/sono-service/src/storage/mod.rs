//! Storage lifecycle management.

pub mod service;
pub mod verify;

pub use service::StorageService;
pub use verify::ConsistencyReport;
