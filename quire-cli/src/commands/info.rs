//! Info command implementation

use anyhow::{Context, Result};
use quire_core::extract::{extract, SkippedEntry};
use quire_core::types::SourceItem;
use serde::Serialize;
use std::path::Path;

/// Book info output
#[derive(Serialize)]
struct BookInfo {
    title: String,
    author: String,
    language: Option<String>,
    chapters: usize,
    resources: usize,
    resource_bytes: usize,
    skipped_entries: Vec<SkippedEntry>,
}

/// Display information about an EPUB file
pub fn info(input: &Path, config_file: Option<&Path>, json: bool) -> Result<()> {
    let config = super::load_config(config_file)?;

    let extraction = extract(input, &config.extract)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let stem = SourceItem::new(input, input).stem();
    let metadata = extraction.metadata.resolve(&stem);

    let info = BookInfo {
        title: metadata.title,
        author: metadata.author,
        language: metadata.language,
        chapters: extraction.chapters.len(),
        resources: extraction.resources.len(),
        resource_bytes: extraction.resources.total_bytes(),
        skipped_entries: extraction.skipped,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("Title:       {}", info.title);
        println!("Author:      {}", info.author);
        if let Some(language) = &info.language {
            println!("Language:    {}", language);
        }
        println!("Chapters:    {}", info.chapters);
        println!("Resources:   {} ({} bytes)", info.resources, info.resource_bytes);
        if !info.skipped_entries.is_empty() {
            println!("Skipped:     {} spine entries", info.skipped_entries.len());
        }
    }

    Ok(())
}
