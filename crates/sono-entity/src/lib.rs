//! # sono-entity
//!
//! Entity models for Sono. `Storage` and `Resource` are database rows and
//! derive `sqlx::FromRow`; each entity also defines the closed set of
//! properties it can be sorted and filtered by.

pub mod resource;
pub mod storage;
