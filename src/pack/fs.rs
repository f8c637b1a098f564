//! Directory tree copying for bundle and package staging.
use anyhow::{Context as _, Result};
use std::path::Path;

/// Recursively copy `src` into `dst`, creating `dst` and its parents.
///
/// `exclude` receives each entry's path relative to `src`; excluded
/// directories are not descended into.
///
/// Symlinks are recreated as symlinks with the same target and are never
/// descended into. Entries that are neither regular files, directories nor
/// symlinks (sockets, FIFOs, devices) are skipped.
pub fn copy_dir_recursive(src: &Path, dst: &Path, exclude: &dyn Fn(&Path) -> bool) -> Result<()> {
    copy_tree(src, dst, Path::new(""), exclude)
}

fn copy_tree(src: &Path, dst: &Path, rel: &Path, exclude: &dyn Fn(&Path) -> bool) -> Result<()> {
    std::fs::create_dir_all(dst)
        .with_context(|| format!("creating directory {}", dst.display()))?;
    for entry in
        std::fs::read_dir(src).with_context(|| format!("reading directory {}", src.display()))?
    {
        let entry = entry.with_context(|| format!("reading entry in {}", src.display()))?;
        let rel_path = rel.join(entry.file_name());
        if exclude(&rel_path) {
            continue;
        }
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        let file_type = entry
            .file_type()
            .with_context(|| format!("reading file type of {}", src_path.display()))?;

        if file_type.is_symlink() {
            copy_symlink(&src_path, &dst_path)?;
        } else if file_type.is_dir() {
            copy_tree(&src_path, &dst_path, &rel_path, exclude)?;
        } else if file_type.is_file() {
            std::fs::copy(&src_path, &dst_path).with_context(|| {
                format!("copying {} to {}", src_path.display(), dst_path.display())
            })?;
        } else {
            tracing::debug!("skipping special file {}", src_path.display());
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    let target =
        std::fs::read_link(src).with_context(|| format!("reading link {}", src.display()))?;
    std::os::unix::fs::symlink(&target, dst)
        .with_context(|| format!("creating symlink {}", dst.display()))
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, _dst: &Path) -> Result<()> {
    tracing::debug!("skipping symlink {}", src.display());
    Ok(())
}
