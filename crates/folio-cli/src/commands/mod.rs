//! CLI subcommands.

pub mod classify;
pub mod config;
pub mod extract;
pub mod train;

use std::path::Path;

use tracing::{debug, warn};

use folio_core::models::config::{FolioConfig, OcrConfig};
use folio_core::{NoOcr, OcrAdapter, PureOcrEngine};

/// Load `--config` if given, else the user config file if present, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<FolioConfig> {
    if let Some(path) = config_path {
        return Ok(FolioConfig::from_file(Path::new(path))?);
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        debug!("Using config from {}", default_path.display());
        Ok(FolioConfig::from_file(&default_path)?)
    } else {
        Ok(FolioConfig::default())
    }
}

/// Build the OCR adapter, degrading to no OCR when models cannot be loaded.
pub fn ocr_engine(config: &OcrConfig, text_only: bool) -> Box<dyn OcrAdapter> {
    if text_only {
        return Box::new(NoOcr);
    }
    match PureOcrEngine::from_config(config) {
        Ok(engine) => Box::new(engine),
        Err(e) => {
            warn!("OCR unavailable, scanned pages will be empty: {}", e);
            Box::new(NoOcr)
        }
    }
}
