//! Domain-specific error types for environment bootstrap and packaging.
//!
//! Internal modules return these typed errors (wrapped in [`anyhow::Error`]
//! where a step also carries I/O context) and the CLI boundary inspects them
//! with `downcast_ref` when the exit status depends on the kind of failure.
//!
//! # Error hierarchy
//!
//! ```text
//! ArgError       : bad command-line input (usage is printed, exit 2)
//! ConfigError    : canonical config file resolution and parsing
//! LegacyError    : present-but-unusable legacy sources
//! InitError      : bootstrap prompt and directory creation
//! PackError      : package assembly and build-tool failures
//! PlatformError  : architecture detection
//! ```
use thiserror::Error;

use crate::pack::PackFormat;

/// Invalid command-line input.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct ArgError(pub String);

/// Errors that arise while locating, reading or writing the canonical config.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Both spellings of the config file exist; neither can be preferred.
    #[error("both {first} and {second} exist; remove one of them")]
    Conflict {
        /// First candidate found.
        first: String,
        /// Second candidate found.
        second: String,
    },

    /// No canonical config exists where one is required.
    #[error("environment config not found in {dir}; run `tt init` first")]
    NotFound {
        /// Directory that was searched.
        dir: String,
    },

    /// The config file exists but is not valid YAML for the schema.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// Path of the offending file.
        path: String,
        /// Underlying YAML error.
        source: serde_yaml::Error,
    },

    /// The config could not be rendered as YAML.
    #[error("failed to serialize environment config: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

/// Errors raised by legacy configuration loaders.
///
/// A present legacy source that cannot be used aborts the bootstrap; the
/// loader chain never falls through to the next source.
#[derive(Error, Debug)]
pub enum LegacyError {
    /// The script-evaluated loader needs an interpreter and none is configured.
    #[error("tarantool executable is not set")]
    InterpreterNotConfigured,

    /// The legacy file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path of the legacy file.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The structured legacy file is not valid for its schema.
    #[error("failed to parse cartridge app configuration: {0}")]
    Cartridge(#[source] serde_yaml::Error),

    /// The interpreter failed (spawn error or non-zero exit).
    #[error("tarantoolctl config loading error: {0}")]
    Interpreter(String),

    /// The interpreter produced output that is not a YAML mapping.
    #[error("failed to parse YAML: {0}")]
    Output(String),

    /// A recognised key holds something other than a string or null.
    #[error("unexpected value for '{key}' in tarantoolctl config: expected a string")]
    InvalidField {
        /// Key that carried the bad value.
        key: String,
    },
}

/// Errors that arise during environment bootstrap itself.
#[derive(Error, Debug)]
pub enum InitError {
    /// The confirmation prompt reached end of input without an answer.
    #[error("no answer received: input stream closed")]
    PromptClosed,

    /// A directory referenced by the config could not be created.
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        /// Directory that could not be created.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors that arise while assembling a package.
#[derive(Error, Debug)]
pub enum PackError {
    /// The format-specific build tool failed.
    #[error("failed to create {format} package: {message}")]
    BuildFailed {
        /// Package format being built.
        format: PackFormat,
        /// Tool error including its captured output.
        message: String,
    },

    /// A runtime copy was requested but no interpreter executable is known.
    #[error("tarantool executable is not found; pass --tarantool or use --without-binaries")]
    RuntimeNotFound,

    /// A bundle pre-build hook failed.
    #[error("pre-build hook {hook} failed: {message}")]
    HookFailed {
        /// Hook file name.
        hook: String,
        /// Hook error including its captured output.
        message: String,
    },

    /// A custom service unit template could not be rendered.
    #[error("failed to render service unit template: {0}")]
    Template(#[from] minijinja::Error),
}

/// Errors that arise from platform-specific queries.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// The architecture has no package naming convention.
    #[error("unsupported architecture '{0}'")]
    UnsupportedArch(String),
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io;

    #[test]
    fn config_conflict_display() {
        let e = ConfigError::Conflict {
            first: "tt.yaml".to_string(),
            second: "tt.yml".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "both tt.yaml and tt.yml exist; remove one of them"
        );
    }

    #[test]
    fn config_not_found_mentions_init() {
        let e = ConfigError::NotFound {
            dir: "/srv/env".to_string(),
        };
        assert!(e.to_string().contains("/srv/env"));
        assert!(e.to_string().contains("tt init"));
    }

    #[test]
    fn legacy_interpreter_not_configured_display() {
        assert_eq!(
            LegacyError::InterpreterNotConfigured.to_string(),
            "tarantool executable is not set"
        );
    }

    #[test]
    fn legacy_io_has_source() {
        let e = LegacyError::Io {
            path: ".tarantoolctl".to_string(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        };
        assert!(e.source().is_some());
    }

    #[test]
    fn legacy_invalid_field_display() {
        let e = LegacyError::InvalidField {
            key: "wal_dir".to_string(),
        };
        assert!(e.to_string().contains("'wal_dir'"));
    }

    #[test]
    fn init_create_dir_display() {
        let e = InitError::CreateDir {
            path: "modules".to_string(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        };
        assert_eq!(
            e.to_string(),
            "failed to create directory modules: permission denied"
        );
    }

    #[test]
    fn pack_build_failed_names_format() {
        let e = PackError::BuildFailed {
            format: PackFormat::Rpm,
            message: "rpmbuild failed (exit 1): bad spec".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "failed to create RPM package: rpmbuild failed (exit 1): bad spec"
        );
    }

    #[test]
    fn arg_error_is_transparent() {
        assert_eq!(ArgError("bad --name".to_string()).to_string(), "bad --name");
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn all_error_types_are_send_sync() {
        assert_send_sync::<ArgError>();
        assert_send_sync::<ConfigError>();
        assert_send_sync::<LegacyError>();
        assert_send_sync::<InitError>();
        assert_send_sync::<PackError>();
        assert_send_sync::<PlatformError>();
    }

    #[test]
    fn typed_errors_survive_anyhow_round_trip() {
        let e: anyhow::Error = LegacyError::InterpreterNotConfigured.into();
        assert!(e.downcast_ref::<LegacyError>().is_some());
    }
}
