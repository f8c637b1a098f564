//! Self-contained application bundle used as packaging input.
use anyhow::{Context as _, Result};
use std::path::{Component, Path, PathBuf};

use super::fs::copy_dir_recursive;
use super::staging::StagingArea;
use super::{PackContext, PackEnv};
use crate::config::Config;
use crate::error::PackError;

/// Pre-build hooks, in order of preference.
pub const PRE_BUILD_HOOKS: [&str; 2] = ["tt.pre-build", "cartridge.pre-build"];

/// File name suffixes of artifacts produced by earlier packaging runs.
const ARTIFACT_SUFFIXES: [&str; 3] = [".rpm", ".deb", ".tar.gz"];

/// Name of the runtime executable inside the bundle's binaries directory.
const RUNTIME_NAME: &str = "tarantool";

/// Copy the environment into a fresh temporary bundle directory.
///
/// VCS metadata, previously built packages and the runtime state directories
/// of the config (run, log, WAL, vinyl and memtx) are left out. The first
/// pre-build hook found is run inside the bundle and the hook files are
/// removed afterwards. With a runtime copy requested, the interpreter is
/// placed in the bundle's binaries directory.
///
/// # Errors
///
/// Returns an error if copying fails, the hook fails, or a runtime copy is
/// requested while no interpreter is known.
pub fn prepare_bundle(env: &PackEnv<'_>, ctx: &PackContext, config: &Config) -> Result<StagingArea> {
    let include_runtime = ctx.includes_runtime();
    let runtime = if include_runtime {
        Some(env.tarantool.ok_or(PackError::RuntimeNotFound)?)
    } else {
        None
    };

    let bundle = StagingArea::new(env.tmp_root, "tt-bundle-")?;
    env.log.debug(&format!(
        "Preparing bundle of {} in {}",
        env.dir.display(),
        bundle.path().display()
    ));
    let state_dirs = runtime_state_dirs(env.dir, config);
    copy_dir_recursive(env.dir, bundle.path(), &|rel| {
        is_excluded(rel) || state_dirs.iter().any(|d| d == rel)
    })?;

    run_pre_build_hook(env, bundle.path())?;

    if let Some(runtime) = runtime {
        copy_runtime(runtime, &bundle.path().join(&config.tt.app.bin_dir))?;
    }
    Ok(bundle)
}

fn is_excluded(rel: &Path) -> bool {
    if rel == Path::new(".git") {
        return true;
    }
    // Only top-level artifacts, so applications may still ship such files.
    rel.components().count() == 1
        && rel
            .to_str()
            .is_some_and(|name| ARTIFACT_SUFFIXES.iter().any(|s| name.ends_with(s)))
}

/// Directories holding instance state, relative to `env_dir`.
///
/// Absolute paths outside the environment are dropped, as is anything that
/// resolves to the environment root itself.
fn runtime_state_dirs(env_dir: &Path, config: &Config) -> Vec<PathBuf> {
    let app = &config.tt.app;
    [
        &app.run_dir,
        &app.log_dir,
        &app.wal_dir,
        &app.vinyl_dir,
        &app.memtx_dir,
    ]
    .into_iter()
    .filter_map(|dir| {
        let path = Path::new(dir.as_str());
        let rel = if path.is_absolute() {
            path.strip_prefix(env_dir).ok()?
        } else {
            path
        };
        let normalized: PathBuf = rel
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect();
        (!normalized.as_os_str().is_empty()).then_some(normalized)
    })
    .collect()
}

fn run_pre_build_hook(env: &PackEnv<'_>, bundle: &Path) -> Result<()> {
    if let Some(hook) = PRE_BUILD_HOOKS.iter().find(|h| bundle.join(h).is_file()) {
        env.log.info(&format!("Running {hook}"));
        let hook_path = bundle.join(hook);
        env.executor
            .run_in(bundle, &hook_path.to_string_lossy(), &[])
            .map_err(|e| PackError::HookFailed {
                hook: (*hook).to_string(),
                message: format!("{e:#}"),
            })?;
    }

    for hook in PRE_BUILD_HOOKS {
        let path = bundle.join(hook);
        if path.is_file() {
            std::fs::remove_file(&path).with_context(|| format!("removing {}", path.display()))?;
        }
    }
    Ok(())
}

fn copy_runtime(runtime: &Path, bin_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(bin_dir)
        .with_context(|| format!("creating directory {}", bin_dir.display()))?;
    let dst = bin_dir.join(RUNTIME_NAME);
    std::fs::copy(runtime, &dst)
        .with_context(|| format!("copying {} to {}", runtime.display(), dst.display()))?;
    tracing::debug!("copied runtime {} into bundle", runtime.display());
    Ok(())
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::exec::test_helpers::MockExecutor;
    use crate::logging::test_helpers::MemoryLog;
    use crate::pack::PackFormat;

    struct Fixture {
        env_dir: tempfile::TempDir,
        tmp_root: tempfile::TempDir,
        executor: MockExecutor,
        log: MemoryLog,
    }

    impl Fixture {
        fn new(executor: MockExecutor) -> Self {
            let env_dir = tempfile::tempdir().unwrap();
            std::fs::write(env_dir.path().join("init.lua"), "return {}\n").unwrap();
            Self {
                env_dir,
                tmp_root: tempfile::tempdir().unwrap(),
                executor,
                log: MemoryLog::new(),
            }
        }

        fn env<'a>(&'a self, tarantool: Option<&'a Path>) -> PackEnv<'a> {
            PackEnv {
                dir: self.env_dir.path(),
                executor: &self.executor,
                log: &self.log,
                tarantool,
                tmp_root: self.tmp_root.path(),
            }
        }
    }

    fn ctx(include_runtime: bool) -> PackContext {
        PackContext {
            include_runtime: Some(include_runtime),
            ..PackContext::new(PackFormat::Tgz, "out".into())
        }
    }

    #[test]
    fn copies_environment_without_vcs_and_artifacts() {
        let fx = Fixture::new(MockExecutor::default());
        let dir = fx.env_dir.path();
        std::fs::create_dir(dir.join(".git")).unwrap();
        std::fs::write(dir.join(".git/HEAD"), "ref").unwrap();
        std::fs::write(dir.join("app-0.1.0-1.x86_64.rpm"), "old").unwrap();
        std::fs::create_dir(dir.join("data")).unwrap();
        std::fs::write(dir.join("data/fixture.rpm"), "kept").unwrap();

        let bundle = prepare_bundle(&fx.env(None), &ctx(false), &Config::defaults()).unwrap();

        assert!(bundle.path().join("init.lua").is_file());
        assert!(bundle.path().join("data/fixture.rpm").is_file());
        assert!(!bundle.path().join(".git").exists());
        assert!(!bundle.path().join("app-0.1.0-1.x86_64.rpm").exists());
        assert!(fx.executor.calls().is_empty());
    }

    #[test]
    fn bundle_is_removed_on_drop() {
        let fx = Fixture::new(MockExecutor::default());
        let bundle = prepare_bundle(&fx.env(None), &ctx(false), &Config::defaults()).unwrap();
        assert!(bundle.path().starts_with(fx.tmp_root.path()));
        drop(bundle);
        assert_eq!(std::fs::read_dir(fx.tmp_root.path()).unwrap().count(), 0);
    }

    #[test]
    fn runtime_copy_lands_in_bin_dir() {
        let fx = Fixture::new(MockExecutor::default());
        let runtime = fx.env_dir.path().join("fake-tarantool");
        std::fs::write(&runtime, "binary").unwrap();

        let bundle =
            prepare_bundle(&fx.env(Some(&runtime)), &ctx(true), &Config::defaults()).unwrap();
        assert_eq!(
            std::fs::read_to_string(bundle.path().join("bin/tarantool")).unwrap(),
            "binary"
        );
    }

    #[test]
    fn runtime_requested_without_interpreter_fails_before_copy() {
        let fx = Fixture::new(MockExecutor::default());
        let err = prepare_bundle(&fx.env(None), &ctx(true), &Config::defaults()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PackError>(),
            Some(PackError::RuntimeNotFound)
        ));
        assert_eq!(std::fs::read_dir(fx.tmp_root.path()).unwrap().count(), 0);
    }

    #[test]
    fn pre_build_hook_runs_in_bundle_and_is_removed() {
        let fx = Fixture::new(MockExecutor::ok(""));
        std::fs::write(fx.env_dir.path().join("tt.pre-build"), "#!/bin/sh\n").unwrap();
        std::fs::write(fx.env_dir.path().join("cartridge.pre-build"), "#!/bin/sh\n").unwrap();

        let bundle = prepare_bundle(&fx.env(None), &ctx(false), &Config::defaults()).unwrap();

        let calls = fx.executor.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].0.ends_with("tt.pre-build"), "{calls:?}");
        assert!(calls[0].0.starts_with(&*bundle.path().to_string_lossy()));
        assert!(!bundle.path().join("tt.pre-build").exists());
        assert!(!bundle.path().join("cartridge.pre-build").exists());
        assert!(fx.env_dir.path().join("tt.pre-build").exists());
    }

    #[test]
    fn failing_hook_aborts_and_cleans_up() {
        let fx = Fixture::new(MockExecutor::fail("rocks make failed"));
        std::fs::write(fx.env_dir.path().join("cartridge.pre-build"), "#!/bin/sh\n").unwrap();

        let err = prepare_bundle(&fx.env(None), &ctx(false), &Config::defaults()).unwrap_err();
        match err.downcast_ref::<PackError>() {
            Some(PackError::HookFailed { hook, message }) => {
                assert_eq!(hook, "cartridge.pre-build");
                assert!(message.contains("rocks make failed"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(std::fs::read_dir(fx.tmp_root.path()).unwrap().count(), 0);
    }

    #[test]
    fn runtime_state_is_not_bundled() {
        let fx = Fixture::new(MockExecutor::default());
        let dir = fx.env_dir.path();
        std::fs::create_dir_all(dir.join("var/log/app")).unwrap();
        std::fs::write(dir.join("var/log/app/inst.log"), "log").unwrap();
        std::fs::create_dir_all(dir.join("var/lib/app")).unwrap();
        std::fs::write(dir.join("var/lib/app/00000.snap"), "snap").unwrap();
        std::fs::create_dir_all(dir.join("var/cache")).unwrap();
        std::fs::write(dir.join("var/cache/keep"), "kept").unwrap();

        let bundle = prepare_bundle(&fx.env(None), &ctx(false), &Config::defaults()).unwrap();

        assert!(!bundle.path().join("var/log").exists());
        assert!(!bundle.path().join("var/lib").exists());
        assert!(bundle.path().join("var/cache/keep").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn live_environment_with_control_socket_is_bundled() {
        let fx = Fixture::new(MockExecutor::default());
        let run_dir = fx.env_dir.path().join("var/run/app");
        std::fs::create_dir_all(&run_dir).unwrap();
        let _listener =
            std::os::unix::net::UnixListener::bind(run_dir.join("inst.control")).unwrap();

        let bundle = prepare_bundle(&fx.env(None), &ctx(false), &Config::defaults()).unwrap();

        assert!(bundle.path().join("init.lua").is_file());
        assert!(!bundle.path().join("var/run").exists());
    }

    #[test]
    fn configured_state_dirs_are_resolved_against_environment() {
        let env_dir = Path::new("/srv/env");
        let mut config = Config::defaults();
        config.tt.app.run_dir = "./state/run".to_string();
        config.tt.app.log_dir = "/srv/env/logs".to_string();
        config.tt.app.wal_dir = "/var/lib/tarantool".to_string();
        config.tt.app.vinyl_dir = ".".to_string();

        let dirs = runtime_state_dirs(env_dir, &config);

        assert_eq!(
            dirs,
            vec![
                PathBuf::from("state/run"),
                PathBuf::from("logs"),
                PathBuf::from("var/lib"),
            ]
        );
    }
}
