//! Renderers turning an assembled document into paginated output

mod command;
mod html;

pub use command::CommandRenderer;
pub use html::HtmlRenderer;

use crate::assemble::AssembledDocument;
use crate::config::RendererConfig;
use crate::error::{ConfigError, RenderError};
use std::io::Write;

/// Print rules every renderer applies on top of the document's style block:
/// images fit the content width and sit centered on their own line. No rule
/// touches the page counter, so numbering runs from 1 on the first page.
pub const PRINT_RULES: &str = r#"img, svg {
  max-width: 100%;
  height: auto;
  display: block;
  margin: 1em auto;
}
"#;

/// Trait for rendering assembled documents to output files
pub trait Renderer: Send + Sync {
    /// Render a document to a writer
    fn render(&self, document: &AssembledDocument, writer: &mut dyn Write) -> Result<(), RenderError>;

    /// Format name (e.g., "PDF")
    fn format_name(&self) -> &str;

    /// File extension for this format
    fn file_extension(&self) -> &str;
}

/// Get a renderer by format name
pub fn renderer_for_format(
    format: &str,
    config: &RendererConfig,
) -> Result<Box<dyn Renderer>, ConfigError> {
    match format.to_lowercase().as_str() {
        "pdf" => Ok(Box::new(CommandRenderer::from_config(config))),
        "html" | "htm" => Ok(Box::new(HtmlRenderer::new())),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}
