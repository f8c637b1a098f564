//! Subcommand implementations and shared argument resolution.
pub mod init;
pub mod pack;
pub mod version;

use anyhow::{Context as _, Result};
use std::path::PathBuf;

use crate::cli::GlobalOpts;

/// Resolve the environment directory: `--dir` if given, else the current
/// directory.
///
/// # Errors
///
/// Returns an error if the directory does not exist or the current directory
/// cannot be determined.
pub fn resolve_dir(global: &GlobalOpts) -> Result<PathBuf> {
    let dir = match &global.dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("determining current directory")?,
    };
    dunce::canonicalize(&dir).with_context(|| format!("resolving directory {}", dir.display()))
}

/// Resolve the interpreter: `--tarantool` if given, else `tarantool` on
/// `PATH`. Absence is not an error until something needs the interpreter.
#[must_use]
pub fn resolve_tarantool(global: &GlobalOpts) -> Option<PathBuf> {
    global
        .tarantool
        .clone()
        .or_else(|| which::which("tarantool").ok())
}
