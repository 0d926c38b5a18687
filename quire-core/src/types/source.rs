//! Located input files and the output paths derived from them

use serde::Serialize;
use std::path::{Path, PathBuf};

/// An input file found under the source root
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SourceItem {
    /// Absolute path of the file
    pub path: PathBuf,

    /// Path relative to the source root
    pub relative: PathBuf,
}

impl SourceItem {
    pub fn new(path: impl Into<PathBuf>, relative: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            relative: relative.into(),
        }
    }

    /// File name without extension, the title of last resort
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Where a source item's rendered output goes
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OutputTarget {
    pub path: PathBuf,
}

impl OutputTarget {
    /// Mirror the item's relative path under `output_root`, swapping the extension
    pub fn for_item(item: &SourceItem, output_root: &Path, extension: &str) -> Self {
        Self {
            path: output_root.join(&item.relative).with_extension(extension),
        }
    }

    /// Directory that must exist before the output can be written
    pub fn parent(&self) -> Option<&Path> {
        self.path.parent()
    }
}
