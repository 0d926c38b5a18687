//! Chapter type representing one reading-order document of a book

use serde::{Deserialize, Serialize};

/// A single content document, in reading order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chapter {
    /// Index of the entry in the container's spine
    pub position: usize,

    /// Manifest identifier of the document
    pub id: String,

    /// Path of the document inside the archive, `/`-separated
    pub href: String,

    /// Raw (X)HTML markup
    pub content: String,
}

impl Chapter {
    /// Create a new chapter
    pub fn new(
        position: usize,
        id: impl Into<String>,
        href: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            position,
            id: id.into(),
            href: href.into(),
            content: content.into(),
        }
    }

    /// Directory of the document inside the archive, used to resolve relative references
    pub fn base_dir(&self) -> &str {
        match self.href.rfind('/') {
            Some(idx) => &self.href[..idx],
            None => "",
        }
    }
}
