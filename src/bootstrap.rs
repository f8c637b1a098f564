//! Environment bootstrap: turn legacy sources into a canonical `tt.yaml`.
//!
//! The run moves through fixed steps: check for an existing config (and ask
//! before replacing it), consult the legacy loader chain, infer the
//! instances-enabled directory for bare environments, then write the config
//! and create every directory it references.
use anyhow::{Context as _, Result};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use crate::config::{self, Config, INSTANCES_ENABLED_DIR_NAME, app_dir};
use crate::error::InitError;
use crate::exec::Executor;
use crate::legacy::{DirectoryInfo, LayoutKind, LoaderChain};
use crate::logging::Log;
use crate::prompt;

/// Options controlling a bootstrap run.
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Replace an existing config without asking.
    pub force: bool,
    /// Ignore legacy sources and write defaults.
    pub skip_config: bool,
    /// Interpreter used to evaluate `.tarantoolctl`.
    pub tarantool: Option<PathBuf>,
}

/// How a bootstrap run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    /// The config was written to this path.
    Written(PathBuf),
    /// The user declined to overwrite an existing config; nothing changed.
    Cancelled,
}

/// Orchestrates a bootstrap run in one working directory.
#[derive(Debug)]
pub struct ConfigBootstrapper<'a> {
    dir: &'a Path,
    executor: &'a dyn Executor,
    log: &'a dyn Log,
}

impl<'a> ConfigBootstrapper<'a> {
    /// Create a bootstrapper for the environment rooted at `dir`.
    #[must_use]
    pub const fn new(dir: &'a Path, executor: &'a dyn Executor, log: &'a dyn Log) -> Self {
        Self { dir, executor, log }
    }

    /// Run the bootstrap with the standard legacy loader chain.
    ///
    /// `reader` and `writer` carry the overwrite confirmation prompt; they are
    /// untouched unless a config exists and `force` is off.
    ///
    /// # Errors
    ///
    /// Returns an error if a present legacy source cannot be loaded, the
    /// config cannot be written, or a referenced directory cannot be created.
    pub fn run(
        &self,
        opts: &InitOptions,
        reader: &mut dyn BufRead,
        writer: &mut dyn Write,
    ) -> Result<InitOutcome> {
        let chain = LoaderChain::standard(self.executor, opts.tarantool.as_deref());
        self.run_with_chain(opts, &chain, reader, writer)
    }

    /// Run the bootstrap consulting `chain` for legacy sources.
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run).
    pub fn run_with_chain(
        &self,
        opts: &InitOptions,
        chain: &LoaderChain<'_>,
        reader: &mut dyn BufRead,
        writer: &mut dyn Write,
    ) -> Result<InitOutcome> {
        let Some(config_path) = self.check_existing(opts.force, reader, writer)? else {
            self.log.info("Init is cancelled by user.");
            return Ok(InitOutcome::Cancelled);
        };

        let mut info = if opts.skip_config {
            self.log.debug("Skipping legacy configuration sources");
            DirectoryInfo::default()
        } else {
            chain.run(self.dir, self.log)?.into_directory_info()
        };

        if !app_dir::is_app(self.dir) && info.instances_enabled.is_none() {
            self.log.debug(&format!(
                "{} is not an application directory, using '{INSTANCES_ENABLED_DIR_NAME}'",
                self.dir.display()
            ));
            info.instances_enabled = Some(INSTANCES_ENABLED_DIR_NAME.to_string());
        }

        let mut cfg = Config::defaults();
        apply_directory_info(&mut cfg, &info);
        config::write(&config_path, &cfg)?;
        create_directories(self.dir, &cfg.managed_directories(), self.log)?;

        self.log.info(&format!(
            "Environment config is written to '{}'",
            display_name(&config_path)
        ));
        Ok(InitOutcome::Written(config_path))
    }

    /// Resolve the config path, removing an existing file once the user (or
    /// `force`) agrees. Returns `None` when the user declines.
    fn check_existing(
        &self,
        force: bool,
        reader: &mut dyn BufRead,
        writer: &mut dyn Write,
    ) -> Result<Option<PathBuf>> {
        let path = config::resolve_file_name(self.dir)?;
        match std::fs::metadata(&path) {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Some(path)),
            Err(e) => {
                return Err(e).with_context(|| format!("checking {}", path.display()));
            }
        }

        if !force {
            let question = format!("{} already exists. Overwrite?", display_name(&path));
            if !prompt::ask_confirm(reader, writer, &question)? {
                return Ok(None);
            }
        }

        std::fs::remove_file(&path).with_context(|| format!("removing {}", path.display()))?;
        self.log.debug(&format!("Removed existing {}", path.display()));
        Ok(Some(path))
    }
}

fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |n| n.to_string_lossy().into_owned(),
    )
}

/// Override `config` with every non-empty field of `info`.
///
/// The layout flag is always taken from `info`.
pub fn apply_directory_info(config: &mut Config, info: &DirectoryInfo) {
    let app = &mut config.tt.app;
    let overrides = [
        (&mut app.run_dir, &info.run_dir),
        (&mut app.wal_dir, &info.wal_dir),
        (&mut app.vinyl_dir, &info.vinyl_dir),
        (&mut app.memtx_dir, &info.memtx_dir),
        (&mut app.log_dir, &info.log_dir),
        (&mut app.instances_enabled, &info.instances_enabled),
    ];
    for (field, value) in overrides {
        if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
            v.clone_into(field);
        }
    }
    app.tarantoolctl_layout = info.layout == LayoutKind::Tarantoolctl;
}

/// Create each of `dirs` (relative to `root`, with missing parents).
///
/// Existing directories are accepted; empty entries are skipped.
///
/// # Errors
///
/// Returns [`InitError::CreateDir`] for the first directory that cannot be
/// created. Directories created before it are left in place.
pub fn create_directories(root: &Path, dirs: &[&str], log: &dyn Log) -> Result<(), InitError> {
    for dir in dirs.iter().filter(|d| !d.is_empty()) {
        let path = root.join(dir);
        let mut builder = std::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt as _;
            builder.mode(0o750);
        }
        builder.create(&path).map_err(|source| InitError::CreateDir {
            path: path.display().to_string(),
            source,
        })?;
        log.debug(&format!("'{dir}' directory is created."));
    }
    Ok(())
}
