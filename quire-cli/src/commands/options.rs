//! Flags shared by the converting commands

use anyhow::{Context, Result};
use clap::Args;
use quire_core::config::RendererConfig;
use quire_core::render::{renderer_for_format, Renderer};
use quire_core::ConverterConfig;
use std::path::{Path, PathBuf};

#[derive(Args, Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Directory scanned for EPUB files [default: source_book]
    #[arg(long, value_name = "DIR")]
    pub source: Option<PathBuf>,

    /// Directory receiving converted files [default: output_book]
    #[arg(long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Convert even when the output is up to date
    #[arg(long)]
    pub force: bool,

    /// Skip up-to-date outputs even if the configuration file sets `force`
    #[arg(long, conflicts_with = "force")]
    pub no_force: bool,

    /// Output format (pdf, html)
    #[arg(long, default_value = "pdf")]
    pub format: String,

    /// HTML-to-PDF program [default: weasyprint]. `weasyprint` and `wkhtmltopdf`
    /// bring their own arguments; any other program keeps the configured ones
    #[arg(long, value_name = "PROGRAM")]
    pub renderer: Option<String>,

    /// Argument passed to the renderer; `{input}` and `{output}` are substituted (repeatable)
    #[arg(long = "renderer-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub renderer_args: Vec<String>,

    /// CSS font-family list for body text
    #[arg(long)]
    pub font_family: Option<String>,

    /// Body font size in points
    #[arg(long, value_name = "PT")]
    pub font_size: Option<f32>,

    /// Line height multiplier
    #[arg(long)]
    pub line_height: Option<f32>,

    /// Page margin (CSS length)
    #[arg(long)]
    pub margin: Option<String>,

    /// Page size (e.g., A4, letter)
    #[arg(long)]
    pub page_size: Option<String>,

    /// Omit page numbers
    #[arg(long)]
    pub no_page_numbers: bool,

    /// Let chapters run on without page breaks
    #[arg(long)]
    pub no_chapter_breaks: bool,
}

impl ConvertOptions {
    /// Layer the flags over the configuration file (or defaults) and validate
    pub fn resolve(&self, config_file: Option<&Path>) -> Result<ConverterConfig> {
        let mut config = super::load_config(config_file)?;
        self.apply(&mut config);
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    fn apply(&self, config: &mut ConverterConfig) {
        if let Some(source) = &self.source {
            config.source_root = source.clone();
        }
        if let Some(output) = &self.output {
            config.output_root = output.clone();
        }
        if self.force {
            config.force = true;
        } else if self.no_force {
            config.force = false;
        }

        if let Some(program) = &self.renderer {
            config.renderer = match (program.as_str(), self.renderer_args.is_empty()) {
                ("weasyprint", true) => RendererConfig::weasyprint(),
                ("wkhtmltopdf", true) => RendererConfig::wkhtmltopdf(),
                (_, true) => RendererConfig::new(program.clone(), config.renderer.args.clone()),
                (_, false) => RendererConfig::new(program.clone(), self.renderer_args.clone()),
            };
        } else if !self.renderer_args.is_empty() {
            config.renderer.args = self.renderer_args.clone();
        }

        let style = &mut config.style;
        if let Some(family) = &self.font_family {
            style.font_family = family.clone();
        }
        if let Some(size) = self.font_size {
            style.font_size_pt = size;
        }
        if let Some(height) = self.line_height {
            style.line_height = height;
        }
        if let Some(margin) = &self.margin {
            style.page_margin = margin.clone();
        }
        if let Some(size) = &self.page_size {
            style.page_size = size.clone();
        }
        if self.no_page_numbers {
            style.page_numbers = false;
        }
        if self.no_chapter_breaks {
            style.chapter_page_breaks = false;
        }
    }

    /// Renderer for the requested format
    pub fn renderer(&self, config: &ConverterConfig) -> Result<Box<dyn Renderer>> {
        renderer_for_format(&self.format, &config.renderer)
            .with_context(|| format!("No renderer available for {} format", self.format))
    }
}
