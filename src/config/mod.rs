//! Canonical environment configuration (`tt.yaml`).
//!
//! The schema mirrors what downstream tooling consumes: a single `tt` root
//! holding module, application, repository and template settings.  Every
//! section deserializes with `#[serde(default)]`, so a partial file is
//! completed from [`Config::defaults`].
pub mod app_dir;

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Preferred canonical config file name.
pub const CONFIG_FILE_NAME: &str = "tt.yaml";

/// Alternative spelling accepted when it already exists.
const CONFIG_FILE_ALT_NAME: &str = "tt.yml";

/// Instances-enabled directory used when the working directory is a bare
/// environment root rather than a single application.
pub const INSTANCES_ENABLED_DIR_NAME: &str = "instances.enabled";

/// Root of the canonical config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Environment settings.
    #[serde(default)]
    pub tt: CliOpts,
}

/// Environment settings under the `tt` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliOpts {
    /// External modules location.
    pub modules: ModulesOpts,
    /// Application directory layout.
    pub app: AppOpts,
    /// Package repositories.
    pub repo: RepoOpts,
    /// Template search paths for `tt create`.
    pub templates: Vec<TemplateOpts>,
}

/// External modules settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModulesOpts {
    /// Directory holding external modules.
    pub directory: String,
}

/// Application directory layout and runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppOpts {
    /// Directory holding enabled instances (one entry per application).
    pub instances_enabled: String,
    /// PID and control socket directory.
    pub run_dir: String,
    /// Log directory.
    pub log_dir: String,
    /// Maximum log file size in megabytes before rotation.
    pub log_maxsize: u32,
    /// Maximum number of days to retain rotated logs.
    pub log_maxage: u32,
    /// Maximum number of rotated logs to keep.
    pub log_maxbackups: u32,
    /// Restart instances that exit unexpectedly.
    pub restart_on_failure: bool,
    /// Write-ahead log directory.
    pub wal_dir: String,
    /// Secondary (vinyl) storage directory.
    pub vinyl_dir: String,
    /// Primary (memtx) snapshot directory.
    pub memtx_dir: String,
    /// Directory for installed binaries.
    pub bin_dir: String,
    /// Directory for installed headers.
    pub inc_dir: String,
    /// Preserve the directory naming used by the legacy control utility.
    pub tarantoolctl_layout: bool,
}

/// Package repository settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoOpts {
    /// Rocks repository path or URL.
    pub rocks: String,
    /// Directory for downloaded distribution files.
    pub distfiles: String,
}

/// One template search path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateOpts {
    /// Directory holding application templates.
    pub path: String,
}

impl Default for CliOpts {
    fn default() -> Self {
        Self {
            modules: ModulesOpts::default(),
            app: AppOpts::default(),
            repo: RepoOpts::default(),
            templates: vec![TemplateOpts {
                path: "templates".to_string(),
            }],
        }
    }
}

impl Default for ModulesOpts {
    fn default() -> Self {
        Self {
            directory: "modules".to_string(),
        }
    }
}

impl Default for AppOpts {
    fn default() -> Self {
        Self {
            instances_enabled: ".".to_string(),
            run_dir: "var/run".to_string(),
            log_dir: "var/log".to_string(),
            log_maxsize: 100,
            log_maxage: 8,
            log_maxbackups: 10,
            restart_on_failure: false,
            wal_dir: "var/lib".to_string(),
            vinyl_dir: "var/lib".to_string(),
            memtx_dir: "var/lib".to_string(),
            bin_dir: "bin".to_string(),
            inc_dir: "include".to_string(),
            tarantoolctl_layout: false,
        }
    }
}

impl Default for RepoOpts {
    fn default() -> Self {
        Self {
            rocks: String::new(),
            distfiles: "distfiles".to_string(),
        }
    }
}

impl Config {
    /// Build a config populated with system defaults.
    #[must_use]
    pub fn defaults() -> Self {
        Self::default()
    }

    /// Directories the environment expects to exist, relative to its root.
    ///
    /// Empty entries are dropped.
    #[must_use]
    pub fn managed_directories(&self) -> Vec<&str> {
        let tt = &self.tt;
        [
            tt.app.instances_enabled.as_str(),
            tt.modules.directory.as_str(),
            tt.app.inc_dir.as_str(),
            tt.app.bin_dir.as_str(),
            tt.repo.distfiles.as_str(),
        ]
        .into_iter()
        .chain(tt.templates.iter().map(|t| t.path.as_str()))
        .filter(|d| !d.is_empty())
        .collect()
    }
}

/// Return the config file path to use in `dir`.
///
/// An existing `tt.yaml` or `tt.yml` is returned as is; when neither exists
/// the preferred `tt.yaml` path is returned.
///
/// # Errors
///
/// Returns [`ConfigError::Conflict`] when both spellings exist.
pub fn resolve_file_name(dir: &Path) -> Result<PathBuf, ConfigError> {
    let primary = dir.join(CONFIG_FILE_NAME);
    let alternative = dir.join(CONFIG_FILE_ALT_NAME);
    match (primary.exists(), alternative.exists()) {
        (true, true) => Err(ConfigError::Conflict {
            first: CONFIG_FILE_NAME.to_string(),
            second: CONFIG_FILE_ALT_NAME.to_string(),
        }),
        (false, true) => Ok(alternative),
        _ => Ok(primary),
    }
}

/// Locate and load the canonical config of the environment rooted at `dir`.
///
/// # Errors
///
/// Returns an error if no config exists, both spellings exist, or the file
/// cannot be read or parsed.
pub fn load_from_dir(dir: &Path) -> Result<(PathBuf, Config)> {
    let path = resolve_file_name(dir)?;
    if !path.exists() {
        return Err(ConfigError::NotFound {
            dir: dir.display().to_string(),
        }
        .into());
    }
    let config = load(&path)?;
    Ok((path, config))
}

/// Load a canonical config file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid for the schema.
pub fn load(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(Config::defaults());
    }
    serde_yaml::from_str(&content).map_err(|source| {
        ConfigError::Parse {
            path: path.display().to_string(),
            source,
        }
        .into()
    })
}

/// Serialize `config` to `path`, replacing any existing file.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write(path: &Path, config: &Config) -> Result<()> {
    let content = serde_yaml::to_string(config).map_err(ConfigError::from)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config file: {}", path.display()))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn defaults_reference_expected_directories() {
        let config = Config::defaults();
        assert_eq!(
            config.managed_directories(),
            vec![".", "modules", "include", "bin", "distfiles", "templates"]
        );
        assert!(!config.tt.app.tarantoolctl_layout);
    }

    #[test]
    fn managed_directories_skip_empty_paths() {
        let mut config = Config::defaults();
        config.tt.app.inc_dir = String::new();
        config.tt.templates.push(TemplateOpts {
            path: String::new(),
        });
        assert!(!config.managed_directories().contains(&""));
        assert_eq!(config.managed_directories().len(), 5);
    }

    #[test]
    fn resolve_prefers_existing_alternative_spelling() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            resolve_file_name(dir.path()).unwrap(),
            dir.path().join("tt.yaml")
        );
        std::fs::write(dir.path().join("tt.yml"), "").unwrap();
        assert_eq!(
            resolve_file_name(dir.path()).unwrap(),
            dir.path().join("tt.yml")
        );
    }

    #[test]
    fn resolve_rejects_both_spellings() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tt.yaml"), "").unwrap();
        std::fs::write(dir.path().join("tt.yml"), "").unwrap();
        assert!(matches!(
            resolve_file_name(dir.path()),
            Err(ConfigError::Conflict { .. })
        ));
    }

    #[test]
    fn write_then_load_preserves_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let mut config = Config::defaults();
        config.tt.app.wal_dir = "/var/lib/tarantool".to_string();
        config.tt.app.tarantoolctl_layout = true;

        write(&path, &config).unwrap();
        assert_eq!(load(&path).unwrap(), config);
    }

    #[test]
    fn partial_file_is_completed_from_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "tt:\n  app:\n    run_dir: /run/app\n").unwrap();

        let config = load(&path).unwrap();
        assert_eq!(config.tt.app.run_dir, "/run/app");
        assert_eq!(config.tt.app.log_dir, "var/log");
        assert_eq!(config.tt.modules.directory, "modules");
        assert_eq!(config.tt.templates[0].path, "templates");
    }

    #[test]
    fn load_reports_parse_errors_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "tt:\n  app: [unterminated\n").unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Parse { .. })
        ));
        assert!(err.to_string().contains("tt.yaml"));
    }

    #[test]
    fn load_from_dir_requires_config() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_from_dir(dir.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::NotFound { .. })
        ));
    }

    #[test]
    fn emitted_yaml_has_tt_root_and_layout_flag() {
        let yaml = serde_yaml::to_string(&Config::defaults()).unwrap();
        assert!(yaml.starts_with("tt:\n"), "{yaml}");
        assert!(yaml.contains("tarantoolctl_layout: false"), "{yaml}");
        assert!(yaml.contains("instances_enabled:"), "{yaml}");
        assert!(yaml.contains("- path: templates"), "{yaml}");
    }
}
