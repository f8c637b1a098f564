//! `tt pack`: build packages from a bootstrapped environment.
use anyhow::{Result, bail};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

use crate::cli::{GlobalOpts, PackOpts};
use crate::config;
use crate::error::ArgError;
use crate::exec::SystemExecutor;
use crate::logging::{Log, Logger};
use crate::pack::{PackContext, PackEnv, PackFormat, packer_for};

/// Run the pack command.
///
/// Each requested format is built by its own packer; several formats are
/// built concurrently.
///
/// # Errors
///
/// Returns [`ArgError`] for invalid options, or the packer's error. When more
/// than one format fails, every failure is logged and a summary error is
/// returned.
pub fn run(global: &GlobalOpts, opts: &PackOpts, log: &Logger) -> Result<()> {
    validate(opts)?;
    let dir = super::resolve_dir(global)?;

    let (config_path, config) = match &opts.config {
        Some(path) => (path.clone(), config::load(path)?),
        None => config::load_from_dir(&dir)?,
    };
    log.debug(&format!("using environment config {}", config_path.display()));

    let output_dir = match &opts.output {
        Some(output) => std::path::absolute(output)?,
        None => dir.clone(),
    };
    let tarantool = super::resolve_tarantool(global);
    let tmp_root = std::env::temp_dir();
    let executor = SystemExecutor;
    let env = PackEnv {
        dir: &dir,
        executor: &executor,
        log,
        tarantool: tarantool.as_deref(),
        tmp_root: &tmp_root,
    };

    let formats = unique_formats(&opts.formats);
    log.stage(&format!(
        "Packing {}",
        formats
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    ));

    let results: Vec<(PackFormat, Result<PathBuf>)> = formats
        .par_iter()
        .map(|&format| {
            let ctx = context_for(format, opts, &output_dir);
            (format, packer_for(format).run(&env, &ctx, &config))
        })
        .collect();

    summarize(results, log)
}

fn validate(opts: &PackOpts) -> Result<(), ArgError> {
    if let Some(name) = &opts.name
        && (name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.'))
    {
        return Err(ArgError(format!("invalid package name '{name}'")));
    }
    if opts.version.as_deref().is_some_and(|v| v.trim().is_empty()) {
        return Err(ArgError("package version must not be empty".to_string()));
    }
    Ok(())
}

fn unique_formats(formats: &[PackFormat]) -> Vec<PackFormat> {
    let mut unique = Vec::with_capacity(formats.len());
    for format in formats {
        if !unique.contains(format) {
            unique.push(*format);
        }
    }
    unique
}

fn context_for(format: PackFormat, opts: &PackOpts, output_dir: &Path) -> PackContext {
    PackContext {
        name: opts.name.clone(),
        version: opts.version.clone(),
        arch: opts.arch,
        include_runtime: opts.include_runtime(),
        unit_template: opts.unit_template.clone(),
        ..PackContext::new(format, output_dir.to_path_buf())
    }
}

fn summarize(results: Vec<(PackFormat, Result<PathBuf>)>, log: &dyn Log) -> Result<()> {
    let total = results.len();
    let mut errors: Vec<(PackFormat, anyhow::Error)> = results
        .into_iter()
        .filter_map(|(format, result)| result.err().map(|e| (format, e)))
        .collect();

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0).1),
        failed => {
            for (format, e) in &errors {
                log.error(&format!("{format}: {e:#}"));
            }
            bail!("{failed} of {total} packages failed")
        }
    }
}
