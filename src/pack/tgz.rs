//! Compressed tarballs of the bundle.
use anyhow::{Context as _, Result};
use std::path::PathBuf;

use super::fs::copy_dir_recursive;
use super::staging::StagingArea;
use super::{PackContext, PackEnv, PackFormat, Packer, bundle, naming};
use crate::config::Config;
use crate::error::PackError;
use crate::exec::require_binaries;

/// Tools that must be on `PATH` before a tarball is built.
pub const REQUIRED_TOOLS: [&str; 1] = ["tar"];

/// Builds `.tar.gz` archives holding `<name>/` with the bundle contents.
///
/// Tarballs carry no service units and do not embed the interpreter unless
/// asked to.
#[derive(Debug, Default, Clone, Copy)]
pub struct TgzPacker;

impl Packer for TgzPacker {
    fn run(&self, env: &PackEnv<'_>, ctx: &PackContext, config: &Config) -> Result<PathBuf> {
        require_binaries(env.executor, &REQUIRED_TOOLS)?;
        let arch = ctx.arch()?;

        let root = StagingArea::new(env.tmp_root, "tt-package-")?;
        let bundle = bundle::prepare_bundle(env, ctx, config)?;
        let bundle_name = naming::package_name(&ctx.app_name(env.dir)?, ctx.version(), "", false);
        copy_dir_recursive(bundle.path(), &root.path().join(&bundle_name), &|_| false)
            .context("copying bundle into package root")?;
        drop(bundle);

        let artifact = super::artifact_path(env, ctx, &naming::tgz_suffix(arch))?;
        let artifact_arg = artifact.to_string_lossy();
        env.executor
            .run_in(
                root.path(),
                "tar",
                &[
                    "-czf",
                    &artifact_arg,
                    "-C",
                    &root.path().to_string_lossy(),
                    &bundle_name,
                ],
            )
            .map_err(|e| PackError::BuildFailed {
                format: PackFormat::Tgz,
                message: format!("{e:#}"),
            })?;

        env.log
            .info(&format!("Created result tgz package: {}", artifact.display()));
        Ok(artifact)
    }
}
