//! Book metadata as declared by the container (Dublin Core subset)

use serde::{Deserialize, Serialize};

/// Author shown on the title page when the container declares none
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// Metadata declared by the container; every field may be absent
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookMetadata {
    /// `dc:title`
    pub title: Option<String>,

    /// First `dc:creator`
    pub author: Option<String>,

    /// `dc:language`
    pub language: Option<String>,
}

impl BookMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the author
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set the language
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Fill in the fallbacks: title from the file stem, author from a placeholder.
    /// Blank values count as absent.
    pub fn resolve(&self, file_stem: &str) -> ResolvedMetadata {
        ResolvedMetadata {
            title: non_blank(&self.title).unwrap_or_else(|| file_stem.to_string()),
            author: non_blank(&self.author).unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            language: non_blank(&self.language),
        }
    }
}

/// Metadata with every fallback applied, ready for the title page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedMetadata {
    pub title: String,
    pub author: String,
    pub language: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
