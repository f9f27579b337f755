//! # sono-database
//!
//! PostgreSQL connection management, migrations, and the repository
//! abstraction over the `storages` and `resources` tables. An in-memory
//! implementation of the same repositories backs tests and tooling.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
pub use repositories::{ResourceRepository, StorageRepository};
