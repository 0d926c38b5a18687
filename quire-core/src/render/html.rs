//! HTML renderer: writes the print-ready document instead of a PDF

use super::{Renderer, PRINT_RULES};
use crate::assemble::AssembledDocument;
use crate::error::RenderError;
use std::io::Write;

/// Writes the assembled document with print rules applied.
/// Handy for inspecting layout in a browser's print preview.
pub struct HtmlRenderer;

impl HtmlRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for HtmlRenderer {
    fn render(&self, document: &AssembledDocument, writer: &mut dyn Write) -> Result<(), RenderError> {
        writer.write_all(document.with_stylesheet(PRINT_RULES).as_bytes())?;
        Ok(())
    }

    fn format_name(&self) -> &str {
        "HTML"
    }

    fn file_extension(&self) -> &str {
        "html"
    }
}
