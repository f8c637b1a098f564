//! Scoped temporary directories used while assembling a package.
use anyhow::{Context as _, Result};
use std::path::Path;
use tempfile::TempDir;

/// A temporary directory removed when the value is dropped.
///
/// Removal happens on every exit path of the owning invocation, including
/// early returns through `?` and unwinding. A removal failure is logged as a
/// warning and never replaces the primary result.
#[derive(Debug)]
pub struct StagingArea {
    dir: Option<TempDir>,
}

impl StagingArea {
    /// Create a fresh empty directory under `root` named `<prefix><random>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(root: &Path, prefix: &str) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir_in(root)
            .with_context(|| format!("creating temporary directory in {}", root.display()))?;
        tracing::debug!("created temporary directory {}", dir.path().display());
        Ok(Self { dir: Some(dir) })
    }

    /// Path of the directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.as_ref().map_or_else(|| Path::new(""), TempDir::path)
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                tracing::warn!(
                    "Failed to remove a temporary directory {}: {e}",
                    path.display()
                );
            }
        }
    }
}
