//! CLI command implementations

mod all;
mod convert;
mod info;
mod options;
mod validate;

pub use all::all;
pub use convert::convert;
pub use info::info;
pub use options::ConvertOptions;
pub use validate::validate;

use anyhow::{Context, Result};
use quire_core::ConverterConfig;
use std::path::Path;

/// Configuration from the `--config` file, or defaults
fn load_config(config_file: Option<&Path>) -> Result<ConverterConfig> {
    match config_file {
        Some(path) => ConverterConfig::from_json_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Ok(ConverterConfig::default()),
    }
}
