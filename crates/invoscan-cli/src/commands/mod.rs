//! Subcommand implementations.

pub mod batch;
pub mod config;
pub mod process;

use std::path::Path;

use invoscan_core::{InvoiceScanner, ScanConfig};

/// Load the configuration named on the command line, or the defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<ScanConfig> {
    match config_path {
        Some(path) => ScanConfig::from_file(Path::new(path))
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", path, e)),
        None => Ok(ScanConfig::default()),
    }
}

/// Scanner built from the loaded configuration.
pub fn build_scanner(config: &ScanConfig) -> anyhow::Result<InvoiceScanner> {
    Ok(InvoiceScanner::from_config(config)?)
}
