//! CLI command implementations

pub mod generate;
pub mod history;
pub mod status;

use anyhow::Result;
use atelier_pipeline::AtelierConfig;
use std::path::PathBuf;

/// Resolve config from an explicit file or the layered default chain,
/// with an optional data-dir override.
pub fn load_config(config_path: Option<String>, data_dir: Option<String>) -> Result<AtelierConfig> {
    let mut config = match config_path {
        Some(path) => AtelierConfig::load_from_file(std::path::Path::new(&path))?,
        None => AtelierConfig::load()?,
    };
    if let Some(dir) = data_dir {
        config.storage.data_dir = PathBuf::from(dir);
    }
    Ok(config)
}
