//! Conversion configuration
//!
//! A [`ConverterConfig`] is an ordinary value: callers build one (from defaults,
//! a JSON file, or command-line flags) and pass it to each batch entry point.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default directory scanned for EPUB files
pub const DEFAULT_SOURCE_ROOT: &str = "source_book";

/// Default directory receiving rendered files
pub const DEFAULT_OUTPUT_ROOT: &str = "output_book";

/// Everything one conversion run needs to know
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConverterConfig {
    /// Directory scanned for input files
    pub source_root: PathBuf,

    /// Directory mirroring the source tree with rendered files
    pub output_root: PathBuf,

    /// Convert even when the output is up to date
    pub force: bool,

    /// Layout options for the assembled document
    pub style: StyleConfig,

    /// Limits applied while reading containers
    pub extract: ExtractOptions,

    /// External rendering program
    pub renderer: RendererConfig,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from(DEFAULT_SOURCE_ROOT),
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            force: false,
            style: StyleConfig::default(),
            extract: ExtractOptions::default(),
            renderer: RendererConfig::default(),
        }
    }
}

impl ConverterConfig {
    /// Create a configuration for the given roots with default options
    pub fn new(source_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            output_root: output_root.into(),
            ..Self::default()
        }
    }

    /// Load a configuration from a JSON file. Omitted fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Set the force flag
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Set the style options
    pub fn with_style(mut self, style: StyleConfig) -> Self {
        self.style = style;
        self
    }

    /// Set the renderer program
    pub fn with_renderer(mut self, renderer: RendererConfig) -> Self {
        self.renderer = renderer;
        self
    }

    /// Reject values that would produce a broken document or a useless run
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.style.validate()?;
        self.renderer.validate()?;
        if self.extract.max_resources == 0 {
            return Err(ConfigError::InvalidValue {
                field: "extract.max_resources",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Layout options carried by the document's style block
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StyleConfig {
    /// CSS font-family list; pick glyph coverage for the book's script
    pub font_family: String,

    /// Body text size in points
    pub font_size_pt: f32,

    /// Line height multiplier
    pub line_height: f32,

    /// Page margin on all four sides (CSS length)
    pub page_margin: String,

    /// CSS page size (e.g., "A4", "letter", "148mm 210mm")
    pub page_size: String,

    /// Centered page number in the footer
    pub page_numbers: bool,

    /// Start every chapter on a new page
    pub chapter_page_breaks: bool,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            font_family: r#""SimSun", "Songti SC", serif"#.to_string(),
            font_size_pt: 12.0,
            line_height: 1.6,
            page_margin: "2cm".to_string(),
            page_size: "A4".to_string(),
            page_numbers: true,
            chapter_page_breaks: true,
        }
    }
}

impl StyleConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.font_size_pt.is_finite() && self.font_size_pt > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "style.font_size_pt",
                reason: format!("{} is not a positive size", self.font_size_pt),
            });
        }
        if !(self.line_height.is_finite() && self.line_height > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "style.line_height",
                reason: format!("{} is not a positive multiplier", self.line_height),
            });
        }
        if self.page_margin.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "style.page_margin",
                reason: "must not be empty".to_string(),
            });
        }
        if self.page_size.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "style.page_size",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Limits applied while collecting manifest resources
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExtractOptions {
    /// Maximum number of resources kept per book
    pub max_resources: usize,

    /// Maximum size of a single resource in bytes
    pub max_resource_bytes: u64,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_resources: 500,
            max_resource_bytes: 5 * 1024 * 1024,
        }
    }
}

/// External HTML-to-PDF program and its argument template.
/// `{input}` and `{output}` in arguments are replaced with file paths.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RendererConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self::weasyprint()
    }
}

impl RendererConfig {
    /// Placeholder for the HTML input path
    pub const INPUT: &'static str = "{input}";

    /// Placeholder for the PDF output path
    pub const OUTPUT: &'static str = "{output}";

    /// Create a renderer configuration
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// `weasyprint {input} {output}`
    pub fn weasyprint() -> Self {
        Self::new("weasyprint", vec![Self::INPUT.to_string(), Self::OUTPUT.to_string()])
    }

    /// `wkhtmltopdf --quiet --disable-local-file-access {input} {output}`
    pub fn wkhtmltopdf() -> Self {
        Self::new(
            "wkhtmltopdf",
            vec![
                "--quiet".to_string(),
                "--disable-local-file-access".to_string(),
                Self::INPUT.to_string(),
                Self::OUTPUT.to_string(),
            ],
        )
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.program.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "renderer.program",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
