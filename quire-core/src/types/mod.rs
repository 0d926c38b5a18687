//! Core types shared by the conversion pipeline

mod chapter;
mod metadata;
mod resource;
mod source;

pub use chapter::Chapter;
pub use metadata::{BookMetadata, ResolvedMetadata, UNKNOWN_AUTHOR};
pub use resource::{EmbeddedResource, ResourceMap};
pub use source::{OutputTarget, SourceItem};
