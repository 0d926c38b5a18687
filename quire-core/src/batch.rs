//! Batch driver
//!
//! Walks the source tree, gates each EPUB on the staleness check, and runs
//! extract → assemble → render for the stale ones. Every item ends in exactly
//! one [`Outcome`]; only problems with the roots themselves abort a run.

use crate::assemble::{assemble, MissingResourceWarning};
use crate::config::ConverterConfig;
use crate::error::{ConvertError, FilesystemError, RenderError, RunError};
use crate::extract::{self, SkippedEntry};
use crate::render::Renderer;
use crate::staleness;
use crate::types::{OutputTarget, SourceItem};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

/// Extension of convertible files, matched case-insensitively
pub const SOURCE_EXTENSION: &str = "epub";

/// What happened to one source item
#[derive(Debug)]
pub enum Outcome {
    /// Rendered and written to the target
    Converted {
        warnings: Vec<MissingResourceWarning>,
        skipped_entries: Vec<SkippedEntry>,
    },
    /// Target already up to date
    Skipped,
    /// Book-local failure; the batch carried on
    Failed(ConvertError),
}

impl Outcome {
    pub fn is_converted(&self) -> bool {
        matches!(self, Outcome::Converted { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    /// Short label for display
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Converted { .. } => "converted",
            Outcome::Skipped => "skipped",
            Outcome::Failed(_) => "failed",
        }
    }
}

/// Outcome of one source item together with where its output belongs
#[derive(Debug)]
pub struct ItemReport {
    pub item: SourceItem,
    pub target: OutputTarget,
    pub outcome: Outcome,
}

/// Every item of a run, in discovery order
#[derive(Debug)]
pub struct RunReport {
    pub items: Vec<ItemReport>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn discovered(&self) -> usize {
        self.items.len()
    }

    pub fn converted(&self) -> usize {
        self.items.iter().filter(|r| r.outcome.is_converted()).count()
    }

    pub fn skipped(&self) -> usize {
        self.items.iter().filter(|r| r.outcome.is_skipped()).count()
    }

    pub fn failed(&self) -> usize {
        self.items.iter().filter(|r| r.outcome.is_failed()).count()
    }

    /// Failed items with their errors
    pub fn failures(&self) -> impl Iterator<Item = (&SourceItem, &ConvertError)> {
        self.items.iter().filter_map(|r| match &r.outcome {
            Outcome::Failed(err) => Some((&r.item, err)),
            _ => None,
        })
    }

    /// Serializable counts and failure reasons
    pub fn summary(&self) -> RunSummary {
        let warnings = self
            .items
            .iter()
            .map(|r| match &r.outcome {
                Outcome::Converted { warnings, .. } => warnings.len(),
                _ => 0,
            })
            .sum();

        RunSummary {
            discovered: self.discovered(),
            converted: self.converted(),
            skipped: self.skipped(),
            failed: self.failed(),
            warnings,
            failures: self
                .failures()
                .map(|(item, err)| FailureSummary {
                    path: item.relative.clone(),
                    reason: err.to_string(),
                })
                .collect(),
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }
}

/// Counts of a finished run
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RunSummary {
    pub discovered: usize,
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Missing-resource warnings across converted books
    pub warnings: usize,
    pub failures: Vec<FailureSummary>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// One failed item: relative path and human-readable reason
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FailureSummary {
    pub path: PathBuf,
    pub reason: String,
}

/// Observer notified as a run progresses
pub trait ProgressSink {
    /// Discovery finished with `total` items
    fn discovered(&mut self, _total: usize) {}

    /// One item reached its final state
    fn finished(&mut self, _report: &ItemReport) {}
}

impl ProgressSink for () {}

/// Convert every EPUB under the configured source root
pub fn convert_all(
    config: &ConverterConfig,
    renderer: &dyn Renderer,
    progress: &mut dyn ProgressSink,
) -> Result<RunReport, RunError> {
    let started_at = Utc::now();

    let items = discover(&config.source_root)?;
    prepare_output_root(&config.output_root)?;

    tracing::info!(
        "Found {} EPUB files under {}",
        items.len(),
        config.source_root.display()
    );
    progress.discovered(items.len());

    let mut reports = Vec::with_capacity(items.len());
    for item in items {
        let report = process_item(config, renderer, item);
        progress.finished(&report);
        reports.push(report);
    }

    Ok(RunReport {
        items: reports,
        started_at,
        finished_at: Utc::now(),
    })
}

/// Convert a single file. Its relative path comes from the source root when the
/// file lies under it, otherwise the output lands directly in the output root.
pub fn convert_one(
    config: &ConverterConfig,
    renderer: &dyn Renderer,
    source: &Path,
) -> Result<ItemReport, RunError> {
    prepare_output_root(&config.output_root)?;
    let item = source_item_for(&config.source_root, source);
    Ok(process_item(config, renderer, item))
}

/// Recursively list `*.epub` files (any case) under `source_root`, sorted pre-order
pub fn discover(source_root: &Path) -> Result<Vec<SourceItem>, RunError> {
    let root_error = |source: std::io::Error| RunError::SourceRoot {
        path: source_root.to_path_buf(),
        source,
    };

    let root = fs::canonicalize(source_root).map_err(root_error)?;
    if !root.is_dir() {
        return Err(root_error(std::io::Error::other("not a directory")));
    }

    let mut items = Vec::new();
    for entry in WalkDir::new(&root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(root_error(e.into())),
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_file() || !has_source_extension(entry.path()) {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(&root)
            .unwrap_or(entry.path())
            .to_path_buf();
        items.push(SourceItem::new(entry.path(), relative));
    }

    Ok(items)
}

fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(SOURCE_EXTENSION))
        .unwrap_or(false)
}

/// Create the output root and make sure files can be written into it
fn prepare_output_root(output_root: &Path) -> Result<(), RunError> {
    fs::create_dir_all(output_root).map_err(|source| RunError::CreateOutputRoot {
        path: output_root.to_path_buf(),
        source,
    })?;
    tempfile::tempfile_in(output_root).map_err(|source| RunError::OutputRootNotWritable {
        path: output_root.to_path_buf(),
        source,
    })?;
    Ok(())
}

fn source_item_for(source_root: &Path, source: &Path) -> SourceItem {
    let path = fs::canonicalize(source)
        .or_else(|_| std::path::absolute(source))
        .unwrap_or_else(|_| source.to_path_buf());

    let relative = fs::canonicalize(source_root)
        .ok()
        .and_then(|root| path.strip_prefix(root).ok().map(Path::to_path_buf))
        .or_else(|| source.strip_prefix(source_root).ok().map(Path::to_path_buf))
        .filter(|rel| !rel.as_os_str().is_empty())
        .unwrap_or_else(|| {
            source
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| source.to_path_buf())
        });

    SourceItem::new(path, relative)
}

fn process_item(config: &ConverterConfig, renderer: &dyn Renderer, item: SourceItem) -> ItemReport {
    let target = OutputTarget::for_item(&item, &config.output_root, renderer.file_extension());

    let outcome = if !config.force && !staleness::should_convert(&item.path, &target.path) {
        tracing::info!("Skipping up-to-date {}", item.relative.display());
        Outcome::Skipped
    } else {
        match convert_item(config, renderer, &item, &target) {
            Ok(outcome) => {
                tracing::info!(
                    "Converted {} -> {}",
                    item.relative.display(),
                    target.path.display()
                );
                outcome
            }
            Err(e) => {
                tracing::error!("Failed to convert {}: {}", item.relative.display(), e);
                Outcome::Failed(e)
            }
        }
    };

    ItemReport {
        item,
        target,
        outcome,
    }
}

fn convert_item(
    config: &ConverterConfig,
    renderer: &dyn Renderer,
    item: &SourceItem,
    target: &OutputTarget,
) -> Result<Outcome, ConvertError> {
    let extraction = extract::extract(&item.path, &config.extract)?;
    let metadata = extraction.metadata.resolve(&item.stem());
    tracing::info!("Processing '{}' by {}", metadata.title, metadata.author);

    let document = assemble(
        &metadata,
        &extraction.chapters,
        &extraction.resources,
        &config.style,
    );

    write_atomically(&target.path, |writer| renderer.render(&document, writer))?;

    Ok(Outcome::Converted {
        warnings: document.warnings,
        skipped_entries: extraction.skipped,
    })
}

/// Render into a temporary file next to `target` and move it into place only
/// on success, so a failed render never leaves a partial output behind.
fn write_atomically<F>(target: &Path, render: F) -> Result<(), ConvertError>
where
    F: FnOnce(&mut dyn Write) -> Result<(), RenderError>,
{
    let parent = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    fs::create_dir_all(parent).map_err(|source| FilesystemError::CreateDir {
        path: parent.to_path_buf(),
        source,
    })?;

    let write_error = |source: std::io::Error| FilesystemError::Write {
        path: target.to_path_buf(),
        source,
    };

    let mut temp = output_temp_file(parent).map_err(write_error)?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        render(&mut writer)?;
        writer.flush().map_err(write_error)?;
    }
    temp.persist(target).map_err(|e| write_error(e.error))?;

    Ok(())
}

/// A temporary file that gets the mode `File::create` would give, not 0600
fn output_temp_file(dir: &Path) -> std::io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".quire-");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // Masked by the process umask like any other new file
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}
