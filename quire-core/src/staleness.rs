//! Up-to-date check between a source file and its rendered output

use std::fs;
use std::path::Path;
use std::time::SystemTime;

/// Whether `source` must be (re)converted into `output`.
///
/// Returns `false` only when `output` exists and was modified no earlier than
/// `source`. Any error reading either timestamp means "convert": a real
/// problem will surface during conversion itself.
pub fn should_convert(source: &Path, output: &Path) -> bool {
    let (Some(source_mtime), Some(output_mtime)) = (modified(source), modified(output)) else {
        return true;
    };
    output_mtime < source_mtime
}

fn modified(path: &Path) -> Option<SystemTime> {
    match fs::metadata(path).and_then(|m| m.modified()) {
        Ok(time) => Some(time),
        Err(e) => {
            tracing::debug!("No timestamp for {}: {}", path.display(), e);
            None
        }
    }
}
