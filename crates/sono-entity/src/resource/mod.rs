//! Resource domain entities.

pub mod model;
pub mod query;

pub use model::{CreateResource, Resource};
pub use query::{ResourceFilter, ResourceSortField};
