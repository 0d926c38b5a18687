//! End-to-end batch conversion tests
//!
//! A stub renderer stands in for the external PDF program: it writes a PDF
//! marker followed by the assembled markup, so tests can check both that an
//! output exists and what went into it.

mod common;

use common::{sample_book, touch_forward, write_corrupt, EpubFixture};
use quire_core::assemble::AssembledDocument;
use quire_core::batch::{convert_all, convert_one, ItemReport, Outcome, ProgressSink};
use quire_core::error::{ContainerParseError, ConvertError, FilesystemError, RenderError, RunError};
use quire_core::render::{HtmlRenderer, Renderer};
use quire_core::ConverterConfig;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

const STUB_MARKER: &[u8] = b"%PDF-1.4 stub\n";

struct StubRenderer;

impl Renderer for StubRenderer {
    fn render(&self, document: &AssembledDocument, writer: &mut dyn Write) -> Result<(), RenderError> {
        writer.write_all(STUB_MARKER)?;
        writer.write_all(document.as_str().as_bytes())?;
        Ok(())
    }

    fn format_name(&self) -> &str {
        "PDF"
    }

    fn file_extension(&self) -> &str {
        "pdf"
    }
}

/// Writes a few bytes and then gives up
struct FailingRenderer;

impl Renderer for FailingRenderer {
    fn render(&self, _document: &AssembledDocument, writer: &mut dyn Write) -> Result<(), RenderError> {
        writer.write_all(b"%PDF-1.4 partial")?;
        Err(RenderError::EngineFailed {
            program: "stub".to_string(),
            status: "exit status: 1".to_string(),
            stderr: "layout exploded".to_string(),
        })
    }

    fn format_name(&self) -> &str {
        "PDF"
    }

    fn file_extension(&self) -> &str {
        "pdf"
    }
}

#[derive(Default)]
struct RecordingSink {
    total: Option<usize>,
    finished: Vec<(PathBuf, &'static str)>,
}

impl ProgressSink for RecordingSink {
    fn discovered(&mut self, total: usize) {
        self.total = Some(total);
    }

    fn finished(&mut self, report: &ItemReport) {
        self.finished
            .push((report.item.relative.clone(), report.outcome.label()));
    }
}

struct Workspace {
    _dir: TempDir,
    source: PathBuf,
    output: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source_book");
        let output = dir.path().join("output_book");
        fs::create_dir_all(&source).unwrap();
        Self {
            _dir: dir,
            source,
            output,
        }
    }

    fn config(&self) -> ConverterConfig {
        ConverterConfig::new(&self.source, &self.output)
    }

    fn source(&self, relative: &str) -> PathBuf {
        self.source.join(relative)
    }

    fn output(&self, relative: &str) -> PathBuf {
        self.output.join(relative)
    }
}

fn read_output(path: &Path) -> String {
    let bytes = fs::read(path).unwrap();
    assert!(bytes.starts_with(STUB_MARKER), "output lacks renderer marker");
    String::from_utf8(bytes[STUB_MARKER.len()..].to_vec()).unwrap()
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_convert_skip_then_touch() {
    let ws = Workspace::new();
    sample_book().write_to(&ws.source("a.epub"));

    let first = convert_all(&ws.config(), &StubRenderer, &mut ()).unwrap();
    assert_eq!((first.converted(), first.skipped(), first.failed()), (1, 0, 0));

    let html = read_output(&ws.output("a.pdf"));
    assert!(html.contains("<title>T</title>"));
    assert!(html.contains("<h1>One</h1>"));
    assert!(html.contains("src=\"data:image/png;base64,"));
    assert!(!html.contains("../images/a.png"));

    let second = convert_all(&ws.config(), &StubRenderer, &mut ()).unwrap();
    assert_eq!((second.converted(), second.skipped(), second.failed()), (0, 1, 0));

    touch_forward(&ws.source("a.epub"), Duration::from_secs(60));
    let third = convert_all(&ws.config(), &StubRenderer, &mut ()).unwrap();
    assert_eq!((third.converted(), third.skipped(), third.failed()), (1, 0, 0));
}

#[test]
fn test_touch_reconverts_only_that_file() {
    let ws = Workspace::new();
    sample_book().write_to(&ws.source("a.epub"));
    sample_book().title("B").write_to(&ws.source("b.epub"));
    sample_book().title("C").write_to(&ws.source("c.epub"));

    let first = convert_all(&ws.config(), &StubRenderer, &mut ()).unwrap();
    assert_eq!(first.converted(), 3);

    touch_forward(&ws.source("b.epub"), Duration::from_secs(60));
    let second = convert_all(&ws.config(), &StubRenderer, &mut ()).unwrap();

    let converted: Vec<_> = second
        .items
        .iter()
        .filter(|r| r.outcome.is_converted())
        .map(|r| r.item.relative.clone())
        .collect();
    assert_eq!(converted, vec![PathBuf::from("b.epub")]);
    assert_eq!(second.skipped(), 2);
}

#[test]
fn test_corrupt_book_fails_alone() {
    let ws = Workspace::new();
    sample_book().write_to(&ws.source("a.epub"));
    write_corrupt(&ws.source("bad.epub"));
    sample_book().write_to(&ws.source("c.epub"));

    let report = convert_all(&ws.config(), &StubRenderer, &mut ()).unwrap();
    assert_eq!((report.converted(), report.skipped(), report.failed()), (2, 0, 1));

    let (item, err) = report.failures().next().unwrap();
    assert_eq!(item.relative, PathBuf::from("bad.epub"));
    assert!(matches!(
        err,
        ConvertError::ContainerParse(ContainerParseError::InvalidEpub(_))
    ));

    assert!(ws.output("a.pdf").exists());
    assert!(ws.output("c.pdf").exists());
    assert!(!ws.output("bad.pdf").exists());

    let summary = report.summary();
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].path, PathBuf::from("bad.epub"));
    assert!(summary.failures[0].reason.starts_with("container parse error"));
}

#[test]
fn test_nested_layout_is_mirrored() {
    let ws = Workspace::new();
    sample_book().write_to(&ws.source("sub/dir/b.epub"));
    sample_book().write_to(&ws.source("Upper.EPUB"));
    fs::write(ws.source("sub/readme.txt"), "not a book").unwrap();

    let report = convert_all(&ws.config(), &StubRenderer, &mut ()).unwrap();
    assert_eq!(report.discovered(), 2);
    assert_eq!(report.converted(), 2);

    assert!(ws.output("sub/dir/b.pdf").exists());
    assert!(ws.output("Upper.pdf").exists());
    assert!(!ws.output("sub/readme.pdf").exists());
}

#[test]
fn test_failed_render_leaves_no_output() {
    let ws = Workspace::new();
    sample_book().write_to(&ws.source("sub/a.epub"));

    let report = convert_all(&ws.config(), &FailingRenderer, &mut ()).unwrap();
    assert_eq!(report.failed(), 1);
    assert!(matches!(
        report.items[0].outcome,
        Outcome::Failed(ConvertError::Render(RenderError::EngineFailed { .. }))
    ));

    assert!(!ws.output("sub/a.pdf").exists());
    let leftovers: Vec<_> = fs::read_dir(ws.output("sub")).unwrap().collect();
    assert!(leftovers.is_empty(), "temporary files left behind: {:?}", leftovers);

    // Still stale, so the next run tries again
    let retry = convert_all(&ws.config(), &StubRenderer, &mut ()).unwrap();
    assert_eq!(retry.converted(), 1);
}

#[test]
fn test_force_reconverts_everything() {
    let ws = Workspace::new();
    sample_book().write_to(&ws.source("a.epub"));
    sample_book().write_to(&ws.source("b.epub"));

    convert_all(&ws.config(), &StubRenderer, &mut ()).unwrap();
    let forced = convert_all(&ws.config().with_force(true), &StubRenderer, &mut ()).unwrap();
    assert_eq!((forced.converted(), forced.skipped()), (2, 0));
}

#[test]
fn test_output_extension_follows_renderer() {
    let ws = Workspace::new();
    sample_book().write_to(&ws.source("a.epub"));

    let report = convert_all(&ws.config(), &HtmlRenderer::new(), &mut ()).unwrap();
    assert_eq!(report.converted(), 1);

    let html = fs::read_to_string(ws.output("a.html")).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("max-width: 100%"));
}

#[test]
fn test_progress_sink_sees_every_item() {
    let ws = Workspace::new();
    sample_book().write_to(&ws.source("a.epub"));
    write_corrupt(&ws.source("b.epub"));

    let mut sink = RecordingSink::default();
    convert_all(&ws.config(), &StubRenderer, &mut sink).unwrap();

    assert_eq!(sink.total, Some(2));
    assert_eq!(
        sink.finished,
        vec![
            (PathBuf::from("a.epub"), "converted"),
            (PathBuf::from("b.epub"), "failed"),
        ]
    );
}

#[test]
fn test_missing_resource_is_a_warning() {
    let ws = Workspace::new();
    EpubFixture::new()
        .title("Gaps")
        .chapter("c1", r#"<p>Before</p><img src="../images/gone.png"/>"#)
        .write_to(&ws.source("gaps.epub"));

    let report = convert_all(&ws.config(), &StubRenderer, &mut ()).unwrap();
    assert_eq!(report.converted(), 1);

    match &report.items[0].outcome {
        Outcome::Converted { warnings, .. } => {
            assert_eq!(warnings.len(), 1);
            assert_eq!(warnings[0].reference, "../images/gone.png");
            assert_eq!(warnings[0].chapter, "OEBPS/text/c1.xhtml");
        }
        other => panic!("expected conversion, got {:?}", other),
    }
    assert_eq!(report.summary().warnings, 1);

    let html = read_output(&ws.output("gaps.pdf"));
    assert!(html.contains("data-missing-src=\"../images/gone.png\""));
}

#[test]
fn test_metadata_fallbacks() {
    let ws = Workspace::new();
    EpubFixture::new()
        .chapter("c1", "<p>Anonymous</p>")
        .write_to(&ws.source("untitled-book.epub"));

    convert_all(&ws.config(), &StubRenderer, &mut ()).unwrap();
    let html = read_output(&ws.output("untitled-book.pdf"));
    assert!(html.contains("<title>untitled-book</title>"));
    assert!(html.contains("<div class=\"author\">Unknown Author</div>"));
}

// =============================================================================
// Single-file conversion
// =============================================================================

#[test]
fn test_convert_one_under_source_root() {
    let ws = Workspace::new();
    sample_book().write_to(&ws.source("nested/a.epub"));

    let report = convert_one(&ws.config(), &StubRenderer, &ws.source("nested/a.epub")).unwrap();
    assert!(report.outcome.is_converted());
    assert_eq!(report.target.path, ws.output("nested/a.pdf"));
    assert!(ws.output("nested/a.pdf").exists());
}

#[test]
fn test_convert_one_outside_source_root() {
    let ws = Workspace::new();
    let elsewhere = tempfile::tempdir().unwrap();
    let book = elsewhere.path().join("loose.epub");
    sample_book().write_to(&book);

    let report = convert_one(&ws.config(), &StubRenderer, &book).unwrap();
    assert!(report.outcome.is_converted());
    assert!(ws.output("loose.pdf").exists());
}

#[test]
fn test_convert_one_missing_file() {
    let ws = Workspace::new();
    let report = convert_one(&ws.config(), &StubRenderer, &ws.source("ghost.epub")).unwrap();
    assert!(matches!(
        report.outcome,
        Outcome::Failed(ConvertError::Filesystem(FilesystemError::Read { .. }))
    ));
}

// =============================================================================
// Run-level errors
// =============================================================================

#[test]
fn test_missing_source_root_aborts() {
    let ws = Workspace::new();
    let config = ConverterConfig::new(ws.source("does-not-exist"), &ws.output);

    let err = convert_all(&config, &StubRenderer, &mut ()).unwrap_err();
    assert!(matches!(err, RunError::SourceRoot { .. }));
}

#[test]
fn test_output_root_blocked_by_file_aborts() {
    let ws = Workspace::new();
    sample_book().write_to(&ws.source("a.epub"));
    fs::write(&ws.output, b"a file where a directory should be").unwrap();

    let err = convert_all(&ws.config(), &StubRenderer, &mut ()).unwrap_err();
    assert!(matches!(err, RunError::CreateOutputRoot { .. }));
}

#[test]
fn test_empty_source_root() {
    let ws = Workspace::new();
    let report = convert_all(&ws.config(), &StubRenderer, &mut ()).unwrap();
    assert_eq!(report.discovered(), 0);
    assert!(ws.output.is_dir());
    assert!(report.finished_at >= report.started_at);
}
