//! Structured loader for `.cartridge.yml`.
use serde::Deserialize;
use std::path::Path;

use super::{DirectoryInfo, LayoutKind, LegacyLoader, non_empty};
use crate::error::LegacyError;

/// Keys of `.cartridge.yml` that describe the directory layout.
#[derive(Debug, Default, Deserialize)]
struct CartridgeOpts {
    #[serde(rename = "log-dir")]
    log_dir: Option<String>,
    #[serde(rename = "run-dir")]
    run_dir: Option<String>,
    #[serde(rename = "data-dir")]
    data_dir: Option<String>,
}

/// Reads a cartridge application config.
///
/// The single data directory feeds the WAL, vinyl and memtx paths alike.
#[derive(Debug, Default, Clone, Copy)]
pub struct CartridgeLoader;

impl LegacyLoader for CartridgeLoader {
    fn load(&self, path: &Path) -> Result<DirectoryInfo, LegacyError> {
        let content = std::fs::read_to_string(path).map_err(|source| LegacyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let value: serde_yaml::Value =
            serde_yaml::from_str(&content).map_err(LegacyError::Cartridge)?;
        let opts: CartridgeOpts = if value.is_null() {
            CartridgeOpts::default()
        } else {
            serde_yaml::from_value(value).map_err(LegacyError::Cartridge)?
        };

        let data_dir = opts.data_dir.and_then(non_empty);
        Ok(DirectoryInfo {
            run_dir: opts.run_dir.and_then(non_empty),
            log_dir: opts.log_dir.and_then(non_empty),
            wal_dir: data_dir.clone(),
            vinyl_dir: data_dir.clone(),
            memtx_dir: data_dir,
            layout: LayoutKind::Cartridge,
            ..DirectoryInfo::default()
        })
    }
}
