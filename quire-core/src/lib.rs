//! Quire Core Library
//!
//! Batch conversion of EPUB books into paginated, print-styled documents.
//! Each book is extracted, assembled into one self-contained HTML document
//! with its images inlined, and handed to a [`render::Renderer`]. The
//! [`batch`] driver mirrors a source tree into an output tree and skips
//! books whose output is already up to date.

pub mod assemble;
pub mod batch;
pub mod config;
pub mod error;
pub mod extract;
pub mod render;
pub mod staleness;
pub mod types;

pub use batch::{convert_all, convert_one, discover, ItemReport, Outcome, ProgressSink, RunReport, RunSummary};
pub use config::{ConverterConfig, ExtractOptions, RendererConfig, StyleConfig};
pub use error::{
    ConfigError, ContainerParseError, ConvertError, FilesystemError, QuireError, RenderError, Result,
    RunError,
};
pub use types::{BookMetadata, Chapter, EmbeddedResource, OutputTarget, ResourceMap, SourceItem};
