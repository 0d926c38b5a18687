//! PDF renderer backed by an external HTML-to-PDF program
//!
//! The document (with print rules applied) is written to a private temporary
//! directory, the program is run there with `{input}`/`{output}` substituted
//! into its argument template, and the produced file is copied to the writer.
//! The directory is removed on every exit path.

use super::{Renderer, PRINT_RULES};
use crate::assemble::AssembledDocument;
use crate::config::RendererConfig;
use crate::error::RenderError;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::process::{Command, Stdio};

/// Number of stderr lines kept in error messages
const STDERR_TAIL_LINES: usize = 5;

/// Renderer delegating pagination to an external program (WeasyPrint by default)
pub struct CommandRenderer {
    program: String,
    args: Vec<String>,
}

impl CommandRenderer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &RendererConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
    }

    /// Substitute the placeholders in the argument template
    fn expand_args(&self, input: &Path, output: &Path) -> Vec<String> {
        let input = input.to_string_lossy();
        let output = output.to_string_lossy();
        self.args
            .iter()
            .map(|arg| {
                arg.replace(RendererConfig::INPUT, &input)
                    .replace(RendererConfig::OUTPUT, &output)
            })
            .collect()
    }
}

impl Default for CommandRenderer {
    fn default() -> Self {
        Self::from_config(&RendererConfig::default())
    }
}

impl Renderer for CommandRenderer {
    fn render(&self, document: &AssembledDocument, writer: &mut dyn Write) -> Result<(), RenderError> {
        let workdir = tempfile::tempdir()?;
        let input = workdir.path().join("document.html");
        let output = workdir.path().join("document.pdf");

        fs::write(&input, document.with_stylesheet(PRINT_RULES))?;

        let args = self.expand_args(&input, &output);
        tracing::debug!("Running {} {}", self.program, args.join(" "));

        let result = Command::new(&self.program)
            .args(&args)
            .current_dir(workdir.path())
            .stdin(Stdio::null())
            .output()
            .map_err(|source| RenderError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !result.status.success() {
            return Err(RenderError::EngineFailed {
                program: self.program.clone(),
                status: result.status.to_string(),
                stderr: stderr_tail(&result.stderr),
            });
        }

        let bytes = match fs::read(&output) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        if bytes.is_empty() {
            return Err(RenderError::EmptyOutput {
                program: self.program.clone(),
            });
        }

        writer.write_all(&bytes)?;
        Ok(())
    }

    fn format_name(&self) -> &str {
        "PDF"
    }

    fn file_extension(&self) -> &str {
        "pdf"
    }
}

/// Last few lines of the program's stderr
fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if lines.is_empty() {
        return "(no stderr)".to_string();
    }
    lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join(" | ")
}
