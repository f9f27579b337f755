//! The resource tree engine.

mod archive;
mod cascade;
pub mod service;
mod tree;

pub use service::{CreateResourceRequest, ResourceContent, ResourceService};
