//! Core type definitions used across the Sono workspace.

pub mod filter;
pub mod id;
pub mod pagination;
pub mod query;
pub mod sorting;

pub use filter::FilterField;
pub use id::*;
pub use pagination::{PageRequest, PageResponse};
pub use query::{ListQuery, ListRequest};
pub use sorting::{SortDirection, SortField, SortProperty};
