//! Validate command implementation

use anyhow::{bail, Result};
use quire_core::assemble::assemble;
use quire_core::extract::extract;
use quire_core::types::SourceItem;
use std::path::Path;

/// Extract and assemble an EPUB without rendering it
pub fn validate(input: &Path, config_file: Option<&Path>) -> Result<()> {
    let config = super::load_config(config_file)?;

    let extraction = match extract(input, &config.extract) {
        Ok(extraction) => extraction,
        Err(e) => {
            eprintln!("Invalid EPUB file: {}", e);
            bail!("Validation failed for {}", input.display());
        }
    };

    let stem = SourceItem::new(input, input).stem();
    let metadata = extraction.metadata.resolve(&stem);
    let document = assemble(
        &metadata,
        &extraction.chapters,
        &extraction.resources,
        &config.style,
    );

    println!("Valid EPUB file");
    println!("  Title: {}", metadata.title);
    println!("  Chapters: {}", document.chapter_count);
    println!("  Inlined references: {}", document.inlined_references);

    for entry in &extraction.skipped {
        println!(
            "  skipped spine entry {} ({}): {:?}",
            entry.position, entry.idref, entry.reason
        );
    }
    for warning in &document.warnings {
        println!("  warning: {}", warning);
    }

    Ok(())
}
