//! RPM packages built with `rpmbuild`.
use anyhow::{Context as _, Result};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use super::staging::StagingArea;
use super::units::SYSTEMD_UNIT_DIR;
use super::{PackContext, PackEnv, PackFormat, Packer, SystemTree, naming};
use crate::config::Config;
use crate::error::PackError;
use crate::exec::require_binaries;

/// Tools that must be on `PATH` before an RPM build starts.
pub const REQUIRED_TOOLS: [&str; 2] = ["cpio", "rpmbuild"];

/// Builds `.rpm` packages.
#[derive(Debug, Default, Clone, Copy)]
pub struct RpmPacker;

impl Packer for RpmPacker {
    fn run(&self, env: &PackEnv<'_>, ctx: &PackContext, config: &Config) -> Result<PathBuf> {
        require_binaries(env.executor, &REQUIRED_TOOLS)?;
        let arch = ctx.arch()?;

        let tree = super::stage_system_tree(env, ctx, config)?;
        let artifact = super::artifact_path(env, ctx, &naming::rpm_suffix(arch))?;

        build(env, ctx, &tree, arch.as_str(), &artifact).map_err(|e| PackError::BuildFailed {
            format: PackFormat::Rpm,
            message: format!("{e:#}"),
        })?;

        env.log
            .info(&format!("Created result RPM package: {}", artifact.display()));
        Ok(artifact)
    }
}

fn build(
    env: &PackEnv<'_>,
    ctx: &PackContext,
    tree: &SystemTree,
    arch: &str,
    artifact: &Path,
) -> Result<()> {
    let work = StagingArea::new(env.tmp_root, "tt-rpmbuild-")?;
    let spec_path = work.path().join(format!("{}.spec", tree.bundle_name));
    std::fs::write(&spec_path, spec_file(ctx, tree, arch))
        .with_context(|| format!("writing {}", spec_path.display()))?;

    let (Some(rpm_dir), Some(file_name)) = (artifact.parent(), artifact.file_name()) else {
        anyhow::bail!("invalid artifact path {}", artifact.display());
    };
    let defines = [
        format!("_topdir {}", work.path().display()),
        format!("_rpmdir {}", rpm_dir.display()),
        format!("_build_name_fmt {}", file_name.to_string_lossy()),
    ];
    let spec_arg = spec_path.to_string_lossy();
    let mut args = vec!["-bb", "--target", arch];
    for define in &defines {
        args.extend(["--define", define.as_str()]);
    }
    args.push(&spec_arg);

    env.log.debug(&format!("rpmbuild {}", args.join(" ")));
    env.executor.run_in(work.path(), "rpmbuild", &args)?;
    Ok(())
}

/// Spec file that copies the staged tree verbatim into the build root.
fn spec_file(ctx: &PackContext, tree: &SystemTree, arch: &str) -> String {
    let name = &tree.bundle_name;
    let mut spec = String::new();
    let _ = writeln!(spec, "Name: {name}");
    let _ = writeln!(spec, "Version: {}", ctx.version().replace('-', "_"));
    let _ = writeln!(spec, "Release: 1");
    let _ = writeln!(spec, "Summary: Tarantool environment {name}");
    let _ = writeln!(spec, "License: Unknown");
    let _ = writeln!(spec, "BuildArch: {arch}");
    let _ = writeln!(spec, "AutoReqProv: no");
    let _ = writeln!(spec, "%global debug_package %{{nil}}");
    let _ = writeln!(spec, "%global __os_install_post %{{nil}}");
    let _ = writeln!(spec);
    let _ = writeln!(spec, "%description");
    let _ = writeln!(spec, "Tarantool environment {name}.");
    let _ = writeln!(spec);
    let _ = writeln!(spec, "%install");
    let _ = writeln!(spec, "mkdir -p %{{buildroot}}");
    let _ = writeln!(
        spec,
        "cp -a {} %{{buildroot}}/",
        shell_quote(&format!("{}/.", tree.root.path().display()))
    );
    let _ = writeln!(spec);
    let _ = writeln!(spec, "%files");
    let _ = writeln!(spec, "{}", tree.install_path.display());
    let _ = writeln!(spec, "/{SYSTEMD_UNIT_DIR}/{name}@.service");
    spec
}

/// Single-quote `value` for the `%install` shell script.
///
/// `%` is doubled so rpm does not expand it as a macro.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''").replace('%', "%%"))
}
