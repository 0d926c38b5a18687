//! Error types for Quire Core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using QuireError
pub type Result<T> = std::result::Result<T, QuireError>;

/// Top-level error type for all Quire operations
#[derive(Debug, Error)]
pub enum QuireError {
    #[error("Conversion failed: {0}")]
    Convert(#[from] ConvertError),

    #[error("Run aborted: {0}")]
    Run(#[from] RunError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Book-local failure: recorded against one source file, never stops a batch
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("container parse error: {0}")]
    ContainerParse(#[from] ContainerParseError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("filesystem error: {0}")]
    Filesystem(#[from] FilesystemError),
}

/// Errors that occur while reading the EPUB container
#[derive(Debug, Error)]
pub enum ContainerParseError {
    #[error("invalid EPUB: {0}")]
    InvalidEpub(String),

    #[error("reading order is empty")]
    EmptyReadingOrder,

    #[error("none of the {0} reading-order entries resolve to content")]
    NoReadableChapters(usize),
}

/// Errors reported by the rendering stage
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to launch renderer `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("renderer `{program}` exited with {status}: {stderr}")]
    EngineFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("renderer `{program}` produced no output")]
    EmptyOutput { program: String },

    #[error("renderer I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors touching the source file or the output tree for one book
#[derive(Debug, Error)]
pub enum FilesystemError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Fatal errors that abort a whole run before or between items
#[derive(Debug, Error)]
pub enum RunError {
    #[error("cannot read source root {}: {source}", path.display())]
    SourceRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot create output root {}: {source}", path.display())]
    CreateOutputRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("output root {} is not writable: {source}", path.display())]
    OutputRootNotWritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors in loading or validating a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),
}
