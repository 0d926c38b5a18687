//! Whole-tree conversion command implementation

use super::ConvertOptions;
use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use quire_core::batch::{convert_all, ItemReport, ProgressSink, RunReport};
use std::path::Path;

/// Progress bar over the discovered items
struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    fn new(hidden: bool) -> Result<Self> {
        let bar = if hidden {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(0)
        };
        bar.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")?
                .progress_chars("##-"),
        );
        Ok(Self { bar })
    }
}

impl ProgressSink for ProgressReporter {
    fn discovered(&mut self, total: usize) {
        self.bar.set_length(total as u64);
    }

    fn finished(&mut self, report: &ItemReport) {
        self.bar.set_message(report.item.relative.display().to_string());
        self.bar.inc(1);
    }
}

/// Convert every EPUB under the source root
pub fn all(options: &ConvertOptions, config_file: Option<&Path>, json: bool) -> Result<()> {
    let config = options.resolve(config_file)?;
    let renderer = options.renderer(&config)?;

    tracing::info!(
        "Converting {} into {} as {}",
        config.source_root.display(),
        config.output_root.display(),
        renderer.format_name()
    );
    tracing::debug!(
        "Renderer: {} {}",
        config.renderer.program,
        config.renderer.args.join(" ")
    );

    let mut progress = ProgressReporter::new(json)?;
    let report = convert_all(&config, renderer.as_ref(), &mut progress)
        .with_context(|| format!("Conversion of {} aborted", config.source_root.display()))?;
    progress.bar.finish_and_clear();

    tracing::info!(
        "Run finished: {} converted, {} skipped, {} failed",
        report.converted(),
        report.skipped(),
        report.failed()
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&report.summary())?);
    } else if report.discovered() == 0 {
        println!("No EPUB files found in {}", config.source_root.display());
    } else {
        print_summary(&report);
    }

    if report.failed() > 0 {
        bail!(
            "{} of {} books failed to convert",
            report.failed(),
            report.discovered()
        );
    }

    Ok(())
}

fn print_summary(report: &RunReport) {
    let summary = report.summary();

    println!("Conversion complete:");
    println!("  Discovered: {}", summary.discovered);
    println!("  Converted:  {}", summary.converted);
    println!("  Skipped:    {}", summary.skipped);
    println!("  Failed:     {}", summary.failed);
    if summary.warnings > 0 {
        println!("  Warnings:   {}", summary.warnings);
    }

    if !summary.failures.is_empty() {
        println!("\nFailures:");
        for failure in &summary.failures {
            println!("  {}: {}", failure.path.display(), failure.reason);
        }
    }
}
