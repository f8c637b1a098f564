//! System packages built from an environment directory.
//!
//! Every format implements [`Packer`]. The RPM and Debian packers share
//! [`stage_system_tree`], which lays out the bundle under the install root and
//! adds the service unit; each then hands the tree to its own build tool.
pub mod bundle;
pub mod deb;
pub mod fs;
pub mod naming;
pub mod rpm;
pub mod staging;
pub mod tgz;
pub mod units;

use anyhow::{Context as _, Result};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::PlatformError;
use crate::exec::Executor;
use crate::logging::Log;
use crate::platform::Arch;
use staging::StagingArea;

/// Install root of bundles inside system packages, relative to `/`.
pub const INSTALL_PREFIX: &str = "usr/share/tarantool";

/// Version used when none is given.
pub const DEFAULT_VERSION: &str = "0.1.0";

/// Package format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum PackFormat {
    /// RPM package.
    Rpm,
    /// Debian package.
    Deb,
    /// Compressed tarball of the bundle.
    Tgz,
}

impl fmt::Display for PackFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Rpm => "RPM",
            Self::Deb => "deb",
            Self::Tgz => "tgz",
        })
    }
}

/// Build-time parameters of one packaging run.
#[derive(Debug, Clone)]
pub struct PackContext {
    /// Package format to build.
    pub format: PackFormat,
    /// Package name; the environment directory name when unset.
    pub name: Option<String>,
    /// Package version; [`DEFAULT_VERSION`] when unset.
    pub version: Option<String>,
    /// Target architecture; the running system's when unset.
    pub arch: Option<Arch>,
    /// Directory the finished package is written to.
    pub output_dir: PathBuf,
    /// Embed the interpreter in the bundle. Defaults per format.
    pub include_runtime: Option<bool>,
    /// Custom service unit template.
    pub unit_template: Option<PathBuf>,
}

impl PackContext {
    /// Context with every optional parameter unset.
    #[must_use]
    pub const fn new(format: PackFormat, output_dir: PathBuf) -> Self {
        Self {
            format,
            name: None,
            version: None,
            arch: None,
            output_dir,
            include_runtime: None,
            unit_template: None,
        }
    }

    /// Package name for an environment rooted at `env_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error when no name is set and `env_dir` has no file name.
    pub fn app_name(&self, env_dir: &Path) -> Result<String> {
        if let Some(name) = &self.name {
            return Ok(name.clone());
        }
        env_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| {
                format!(
                    "cannot derive a package name from {}; pass --name",
                    env_dir.display()
                )
            })
    }

    /// Package version.
    #[must_use]
    pub fn version(&self) -> &str {
        self.version.as_deref().unwrap_or(DEFAULT_VERSION)
    }

    /// Target architecture.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::UnsupportedArch`] when no override is set and
    /// the running system's architecture is not supported.
    pub fn arch(&self) -> Result<Arch, PlatformError> {
        self.arch.map_or_else(Arch::detect, Ok)
    }

    /// Whether the interpreter is embedded: system packages do by default,
    /// tarballs do not.
    #[must_use]
    pub fn includes_runtime(&self) -> bool {
        self.include_runtime
            .unwrap_or(!matches!(self.format, PackFormat::Tgz))
    }
}

/// Environment shared by the packaging runs of one invocation.
#[derive(Debug, Clone, Copy)]
pub struct PackEnv<'a> {
    /// Environment root being packaged.
    pub dir: &'a Path,
    /// Gateway for the external build tools.
    pub executor: &'a dyn Executor,
    /// Progress and diagnostic output.
    pub log: &'a dyn Log,
    /// Interpreter to embed when a runtime copy is requested.
    pub tarantool: Option<&'a Path>,
    /// Where staging and bundle directories are created.
    pub tmp_root: &'a Path,
}

/// Builds one package format.
pub trait Packer: Send + Sync + fmt::Debug {
    /// Build the package described by `ctx` and return the artifact path.
    ///
    /// Required tools are checked before anything is written; every
    /// temporary directory is gone when this returns.
    ///
    /// # Errors
    ///
    /// Returns an error if a tool is missing, the bundle cannot be prepared,
    /// or the build tool fails.
    fn run(&self, env: &PackEnv<'_>, ctx: &PackContext, config: &Config) -> Result<PathBuf>;
}

/// Packer for `format`.
#[must_use]
pub fn packer_for(format: PackFormat) -> &'static dyn Packer {
    match format {
        PackFormat::Rpm => &rpm::RpmPacker,
        PackFormat::Deb => &deb::DebPacker,
        PackFormat::Tgz => &tgz::TgzPacker,
    }
}

/// File tree of a system package, ready for a build tool.
#[derive(Debug)]
pub struct SystemTree {
    /// Package root; removed on drop.
    pub root: StagingArea,
    /// Bundle name without version or suffix.
    pub bundle_name: String,
    /// Absolute path the bundle is installed to.
    pub install_path: PathBuf,
}

/// Lay out the bundle under [`INSTALL_PREFIX`] and add its service unit.
///
/// # Errors
///
/// Returns an error if any staging step fails. Temporary directories created
/// so far are removed.
pub fn stage_system_tree(
    env: &PackEnv<'_>,
    ctx: &PackContext,
    config: &Config,
) -> Result<SystemTree> {
    let root = StagingArea::new(env.tmp_root, "tt-package-")?;
    env.log
        .debug(&format!("A root for package is located in: {}", root.path().display()));

    let bundle = bundle::prepare_bundle(env, ctx, config)?;
    let bundle_name = naming::package_name(&ctx.app_name(env.dir)?, ctx.version(), "", false);

    let rel_install = Path::new(INSTALL_PREFIX).join(&bundle_name);
    fs::copy_dir_recursive(bundle.path(), &root.path().join(&rel_install), &|_| false)?;
    drop(bundle);

    let install_path = Path::new("/").join(&rel_install);
    units::stage_units(
        root.path(),
        ctx.unit_template.as_deref(),
        &bundle_name,
        &install_path,
    )?;

    Ok(SystemTree {
        root,
        bundle_name,
        install_path,
    })
}

/// Create `ctx.output_dir` and return the absolute artifact path for `suffix`.
///
/// # Errors
///
/// Returns an error if the output directory cannot be created or resolved.
pub fn artifact_path(env: &PackEnv<'_>, ctx: &PackContext, suffix: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(&ctx.output_dir)
        .with_context(|| format!("creating output directory {}", ctx.output_dir.display()))?;
    let output_dir = dunce::canonicalize(&ctx.output_dir)
        .with_context(|| format!("resolving {}", ctx.output_dir.display()))?;
    let name = naming::package_name(&ctx.app_name(env.dir)?, ctx.version(), suffix, true);
    Ok(output_dir.join(name))
}


#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::test_helpers::PackFixture;
    use super::*;
    use crate::exec::test_helpers::MockExecutor;

    fn context(format: PackFormat) -> PackContext {
        PackContext {
            name: Some("app".to_string()),
            version: Some("1.2.3".to_string()),
            arch: Some(Arch::X86_64),
            include_runtime: Some(false),
            ..PackContext::new(format, PathBuf::from("dist"))
        }
    }

    #[test]
    fn format_display_matches_error_wording() {
        assert_eq!(PackFormat::Rpm.to_string(), "RPM");
        assert_eq!(PackFormat::Deb.to_string(), "deb");
        assert_eq!(PackFormat::Tgz.to_string(), "tgz");
    }

    #[test]
    fn context_defaults() {
        let ctx = PackContext::new(PackFormat::Rpm, PathBuf::from("."));
        assert_eq!(ctx.version(), "0.1.0");
        assert!(ctx.includes_runtime());
        assert!(!PackContext::new(PackFormat::Tgz, PathBuf::from(".")).includes_runtime());
        assert_eq!(ctx.app_name(Path::new("/srv/billing")).unwrap(), "billing");
        assert!(ctx.app_name(Path::new("/")).is_err());
    }

    #[test]
    fn arch_override_wins() {
        let ctx = PackContext {
            arch: Some(Arch::Aarch64),
            ..PackContext::new(PackFormat::Deb, PathBuf::from("."))
        };
        assert_eq!(ctx.arch().unwrap(), Arch::Aarch64);
    }

    #[test]
    fn system_tree_layout() {
        let fx = PackFixture::new(MockExecutor::default());
        let tree = stage_system_tree(&fx.env(), &context(PackFormat::Rpm), &Config::defaults())
            .unwrap();

        assert_eq!(tree.bundle_name, "app");
        assert_eq!(tree.install_path, Path::new("/usr/share/tarantool/app"));
        let root = tree.root.path();
        assert!(root.join("usr/share/tarantool/app/init.lua").is_file());
        let unit =
            std::fs::read_to_string(root.join("usr/lib/systemd/system/app@.service")).unwrap();
        assert!(unit.contains("WorkingDirectory=/usr/share/tarantool/app"), "{unit}");

        // Only the package root remains until the tree is dropped.
        assert_eq!(std::fs::read_dir(fx.tmp_root.path()).unwrap().count(), 1);
        drop(tree);
        assert!(fx.tmp_root_is_empty());
    }

    #[test]
    fn artifact_path_is_absolute_and_versioned() {
        let fx = PackFixture::new(MockExecutor::default());
        let ctx = PackContext {
            output_dir: fx.output_dir().join("nested"),
            ..context(PackFormat::Rpm)
        };
        let path = artifact_path(&fx.env(), &ctx, "-1.x86_64.rpm").unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("nested/app-1.2.3-1.x86_64.rpm"), "{}", path.display());
        assert!(fx.output_dir().join("nested").is_dir());
    }

    #[test]
    fn packer_dispatch_covers_every_format() {
        for format in [PackFormat::Rpm, PackFormat::Deb, PackFormat::Tgz] {
            let debug = format!("{:?}", packer_for(format));
            assert!(
                debug.to_lowercase().starts_with(&format!("{format:?}").to_lowercase()),
                "{debug}"
            );
        }
    }
}
