//! Discovery of directory settings from legacy configuration sources.
//!
//! A [`LoaderChain`] holds an ordered list of `(source file, loader)`
//! entries.  The first source present in the working directory is loaded and
//! the chain stops there; a source that is present but unusable fails the
//! whole run instead of falling through to the next entry.
pub mod cartridge;
pub mod tarantoolctl;

use std::io;
use std::path::{Path, PathBuf};

use crate::error::LegacyError;
use crate::exec::Executor;
use crate::logging::Log;

pub use cartridge::CartridgeLoader;
pub use tarantoolctl::TarantoolctlLoader;

/// Legacy source handled by [`CartridgeLoader`].
pub const CARTRIDGE_SOURCE: &str = ".cartridge.yml";

/// Legacy source handled by [`TarantoolctlLoader`].
pub const TARANTOOLCTL_SOURCE: &str = ".tarantoolctl";

/// Which legacy directory-naming convention was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutKind {
    /// No legacy source was used.
    #[default]
    None,
    /// Cartridge application layout.
    Cartridge,
    /// Layout of the legacy control utility (`tarantoolctl`).
    Tarantoolctl,
}

/// Directory paths discovered from a legacy source.
///
/// `None` means the source did not set the path; empty strings are never
/// stored.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DirectoryInfo {
    /// Directory holding enabled instances.
    pub instances_enabled: Option<String>,
    /// Log directory.
    pub log_dir: Option<String>,
    /// PID and control socket directory.
    pub run_dir: Option<String>,
    /// Write-ahead log directory.
    pub wal_dir: Option<String>,
    /// Vinyl storage directory.
    pub vinyl_dir: Option<String>,
    /// Memtx snapshot directory.
    pub memtx_dir: Option<String>,
    /// Which legacy layout the paths came from.
    pub layout: LayoutKind,
}

/// Drop empty strings so "unset" has a single representation.
pub(crate) fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

/// Reads one kind of legacy source into [`DirectoryInfo`].
#[cfg_attr(test, mockall::automock)]
pub trait LegacyLoader {
    /// Load the legacy source at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read or interpreted.
    fn load(&self, path: &Path) -> Result<DirectoryInfo, LegacyError>;
}

/// Result of running a [`LoaderChain`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainOutcome {
    /// None of the chain's sources exist.
    NoSource,
    /// A source was found and loaded; its data may still be empty.
    Loaded {
        /// Full path of the source that was loaded.
        source: PathBuf,
        /// Directory settings it provided.
        info: DirectoryInfo,
    },
}

impl ChainOutcome {
    /// Directory settings to bootstrap from (empty when no source matched).
    #[must_use]
    pub fn into_directory_info(self) -> DirectoryInfo {
        match self {
            Self::NoSource => DirectoryInfo::default(),
            Self::Loaded { info, .. } => info,
        }
    }
}

struct ChainEntry<'a> {
    source: String,
    loader: Box<dyn LegacyLoader + 'a>,
}

/// Ordered list of legacy sources, tried first to last.
#[derive(Default)]
pub struct LoaderChain<'a> {
    entries: Vec<ChainEntry<'a>>,
}

impl std::fmt::Debug for LoaderChain<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| e.source.as_str()))
            .finish()
    }
}

impl<'a> LoaderChain<'a> {
    /// Create an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard chain: `.cartridge.yml`, then `.tarantoolctl`.
    #[must_use]
    pub fn standard(executor: &'a dyn Executor, interpreter: Option<&'a Path>) -> Self {
        Self::new()
            .with(CARTRIDGE_SOURCE, CartridgeLoader)
            .with(
                TARANTOOLCTL_SOURCE,
                TarantoolctlLoader::new(executor, interpreter),
            )
    }

    /// Append a source to the end of the chain.
    #[must_use]
    pub fn with(mut self, source: &str, loader: impl LegacyLoader + 'a) -> Self {
        self.entries.push(ChainEntry {
            source: source.to_string(),
            loader: Box::new(loader),
        });
        self
    }

    /// Source file names in the order they are tried.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.source.as_str())
    }

    /// Try each source in `dir` in order, stopping at the first one present.
    ///
    /// A missing source is skipped silently; a source whose existence cannot
    /// be checked is reported as a warning and skipped.
    ///
    /// # Errors
    ///
    /// Returns the loader's error when a present source cannot be loaded.
    pub fn run(&self, dir: &Path, log: &dyn Log) -> Result<ChainOutcome, LegacyError> {
        for entry in &self.entries {
            let path = dir.join(&entry.source);
            match std::fs::metadata(&path) {
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => {
                    log.warn(&format!("Failed to get info of '{}': {e}", entry.source));
                    continue;
                }
            }

            log.info(&format!("Found existing config '{}'", entry.source));
            let info = entry.loader.load(&path)?;
            return Ok(ChainOutcome::Loaded { source: path, info });
        }
        Ok(ChainOutcome::NoSource)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::exec::test_helpers::MockExecutor;
    use crate::logging::Level;
    use crate::logging::test_helpers::MemoryLog;

    fn info_with_run_dir(run_dir: &str) -> DirectoryInfo {
        DirectoryInfo {
            run_dir: Some(run_dir.to_string()),
            ..DirectoryInfo::default()
        }
    }

    #[test]
    fn standard_chain_order() {
        let executor = MockExecutor::default();
        let chain = LoaderChain::standard(&executor, None);
        assert_eq!(
            chain.sources().collect::<Vec<_>>(),
            vec![".cartridge.yml", ".tarantoolctl"]
        );
    }

    #[test]
    fn no_source_present_is_distinct_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let mut first = MockLegacyLoader::new();
        first.expect_load().never();

        let chain = LoaderChain::new().with("first.yml", first);
        let outcome = chain.run(dir.path(), &MemoryLog::new()).unwrap();
        assert_eq!(outcome, ChainOutcome::NoSource);
        assert_eq!(outcome.into_directory_info(), DirectoryInfo::default());
    }

    #[test]
    fn first_present_source_stops_the_chain() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("first.yml"), "").unwrap();
        std::fs::write(dir.path().join("second.yml"), "").unwrap();

        let mut first = MockLegacyLoader::new();
        first
            .expect_load()
            .times(1)
            .returning(|_| Ok(info_with_run_dir("from-first")));
        let mut second = MockLegacyLoader::new();
        second.expect_load().never();

        let chain = LoaderChain::new()
            .with("first.yml", first)
            .with("second.yml", second);
        let outcome = chain.run(dir.path(), &MemoryLog::new()).unwrap();

        assert_eq!(
            outcome,
            ChainOutcome::Loaded {
                source: dir.path().join("first.yml"),
                info: info_with_run_dir("from-first"),
            }
        );
    }

    #[test]
    fn missing_source_falls_through_to_next() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("second.yml"), "").unwrap();

        let mut first = MockLegacyLoader::new();
        first.expect_load().never();
        let mut second = MockLegacyLoader::new();
        second
            .expect_load()
            .withf(|p| p.ends_with("second.yml"))
            .times(1)
            .returning(|_| Ok(info_with_run_dir("from-second")));

        let chain = LoaderChain::new()
            .with("first.yml", first)
            .with("second.yml", second);
        let info = chain
            .run(dir.path(), &MemoryLog::new())
            .unwrap()
            .into_directory_info();
        assert_eq!(info.run_dir.as_deref(), Some("from-second"));
    }

    #[test]
    fn loader_error_aborts_without_trying_next() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("first.yml"), "").unwrap();
        std::fs::write(dir.path().join("second.yml"), "").unwrap();

        let mut first = MockLegacyLoader::new();
        first
            .expect_load()
            .times(1)
            .returning(|_| Err(LegacyError::Output("garbage".to_string())));
        let mut second = MockLegacyLoader::new();
        second.expect_load().never();

        let chain = LoaderChain::new()
            .with("first.yml", first)
            .with("second.yml", second);
        let err = chain.run(dir.path(), &MemoryLog::new()).unwrap_err();
        assert!(matches!(err, LegacyError::Output(_)));
    }

    #[test]
    fn loaded_empty_data_is_not_no_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("first.yml"), "").unwrap();

        let mut first = MockLegacyLoader::new();
        first
            .expect_load()
            .returning(|_| Ok(DirectoryInfo::default()));

        let chain = LoaderChain::new().with("first.yml", first);
        let outcome = chain.run(dir.path(), &MemoryLog::new()).unwrap();
        assert!(matches!(outcome, ChainOutcome::Loaded { .. }));
    }

    #[test]
    fn unreadable_source_is_warned_and_skipped() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file used as a directory component makes the existence
        // check fail with something other than "not found".
        std::fs::write(dir.path().join("plain"), "").unwrap();
        std::fs::write(dir.path().join("second.yml"), "").unwrap();

        let mut first = MockLegacyLoader::new();
        first.expect_load().never();
        let mut second = MockLegacyLoader::new();
        second
            .expect_load()
            .times(1)
            .returning(|_| Ok(info_with_run_dir("from-second")));

        let log = MemoryLog::new();
        let chain = LoaderChain::new()
            .with("plain/first.yml", first)
            .with("second.yml", second);
        let info = chain.run(dir.path(), &log).unwrap().into_directory_info();

        assert_eq!(info.run_dir.as_deref(), Some("from-second"));
        let warnings = log.messages(Level::Warn);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("plain/first.yml"), "{warnings:?}");
    }

    #[test]
    fn found_source_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".cartridge.yml"), "run-dir: run\n").unwrap();

        let executor = MockExecutor::default();
        let log = MemoryLog::new();
        let info = LoaderChain::standard(&executor, None)
            .run(dir.path(), &log)
            .unwrap()
            .into_directory_info();

        assert_eq!(info.layout, LayoutKind::Cartridge);
        assert_eq!(
            log.messages(Level::Info),
            vec!["Found existing config '.cartridge.yml'"]
        );
        assert!(executor.calls().is_empty());
    }

    #[test]
    fn non_empty_drops_empty_strings() {
        assert_eq!(non_empty(String::new()), None);
        assert_eq!(non_empty("x".to_string()), Some("x".to_string()));
    }
}
