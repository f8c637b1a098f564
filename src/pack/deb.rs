//! Debian packages built with `dpkg-deb`.
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

use super::{PackContext, PackEnv, PackFormat, Packer, SystemTree, naming};
use crate::config::Config;
use crate::error::PackError;
use crate::exec::require_binaries;
use crate::platform::Arch;

/// Tools that must be on `PATH` before a Debian build starts.
pub const REQUIRED_TOOLS: [&str; 2] = ["tar", "dpkg-deb"];

/// Builds `.deb` packages.
#[derive(Debug, Default, Clone, Copy)]
pub struct DebPacker;

impl Packer for DebPacker {
    fn run(&self, env: &PackEnv<'_>, ctx: &PackContext, config: &Config) -> Result<PathBuf> {
        require_binaries(env.executor, &REQUIRED_TOOLS)?;
        let arch = ctx.arch()?;

        let tree = super::stage_system_tree(env, ctx, config)?;
        let artifact = super::artifact_path(env, ctx, &naming::deb_suffix(arch))?;

        build(env, ctx, &tree, arch, &artifact).map_err(|e| PackError::BuildFailed {
            format: PackFormat::Deb,
            message: format!("{e:#}"),
        })?;

        env.log
            .info(&format!("Created result deb package: {}", artifact.display()));
        Ok(artifact)
    }
}

fn build(
    env: &PackEnv<'_>,
    ctx: &PackContext,
    tree: &SystemTree,
    arch: Arch,
    artifact: &Path,
) -> Result<()> {
    let debian_dir = tree.root.path().join("DEBIAN");
    std::fs::create_dir_all(&debian_dir)
        .with_context(|| format!("creating directory {}", debian_dir.display()))?;
    let control_path = debian_dir.join("control");
    std::fs::write(&control_path, control_file(ctx, &tree.bundle_name, arch))
        .with_context(|| format!("writing {}", control_path.display()))?;

    let root = tree.root.path().to_string_lossy();
    let artifact = artifact.to_string_lossy();
    env.executor.run(
        "dpkg-deb",
        &["--root-owner-group", "--build", &root, &artifact],
    )?;
    Ok(())
}

fn control_file(ctx: &PackContext, name: &str, arch: Arch) -> String {
    format!(
        "Package: {name}\n\
         Version: {}-1\n\
         Architecture: {}\n\
         Maintainer: {name} maintainers\n\
         Section: database\n\
         Priority: optional\n\
         Description: Tarantool environment {name}\n",
        ctx.version(),
        arch.deb_name(),
    )
}
