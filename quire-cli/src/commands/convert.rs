//! Convert command implementation

use super::ConvertOptions;
use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use quire_core::batch::{convert_one, Outcome};
use serde_json::json;
use std::path::Path;
use std::time::Duration;

/// Convert a single EPUB into the output tree
pub fn convert(
    input: &Path,
    options: &ConvertOptions,
    config_file: Option<&Path>,
    json: bool,
) -> Result<()> {
    let config = options.resolve(config_file)?;
    let renderer = options.renderer(&config)?;
    tracing::info!("Converting {} as {}", input.display(), renderer.format_name());

    // Set up progress spinner
    let pb = if json {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Converting {} to {}...", input.display(), renderer.format_name()));

    let report = convert_one(&config, renderer.as_ref(), input)
        .with_context(|| format!("Failed to prepare {}", config.output_root.display()))?;
    pb.finish_and_clear();

    if json {
        let value = match &report.outcome {
            Outcome::Converted {
                warnings,
                skipped_entries,
            } => json!({
                "input": report.item.path,
                "output": report.target.path,
                "outcome": report.outcome.label(),
                "warnings": warnings,
                "skipped_entries": skipped_entries,
            }),
            Outcome::Skipped => json!({
                "input": report.item.path,
                "output": report.target.path,
                "outcome": report.outcome.label(),
            }),
            Outcome::Failed(err) => json!({
                "input": report.item.path,
                "output": report.target.path,
                "outcome": report.outcome.label(),
                "reason": err.to_string(),
            }),
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
    }

    match &report.outcome {
        Outcome::Converted {
            warnings,
            skipped_entries,
        } => {
            tracing::info!("Wrote {}", report.target.path.display());
            if !json {
                println!(
                    "Converted {} -> {}",
                    input.display(),
                    report.target.path.display()
                );
                for warning in warnings {
                    println!("  warning: {}", warning);
                }
                if !skipped_entries.is_empty() {
                    println!("  skipped {} unreadable spine entries", skipped_entries.len());
                }
            }
            Ok(())
        }
        Outcome::Skipped => {
            if !json {
                println!("Up to date: {}", report.target.path.display());
            }
            Ok(())
        }
        Outcome::Failed(err) => {
            tracing::error!("Conversion of {} failed: {}", input.display(), err);
            bail!("Failed to convert {}: {}", input.display(), err)
        }
    }
}
