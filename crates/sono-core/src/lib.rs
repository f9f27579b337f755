//! # sono-core
//!
//! Core crate for Sono. Contains configuration schemas, type-tagged
//! identifiers, pagination/sorting/filter types, and the unified error
//! system.
//!
//! This crate has **no** internal dependencies on other Sono crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
