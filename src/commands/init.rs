//! `tt init`: bootstrap an environment config.
use anyhow::Result;

use crate::bootstrap::{ConfigBootstrapper, InitOptions, InitOutcome};
use crate::cli::{GlobalOpts, InitOpts};
use crate::exec::SystemExecutor;
use crate::logging::Logger;

/// Run the init command.
///
/// The overwrite prompt reads from stdin. A declined prompt is a successful
/// no-op.
///
/// # Errors
///
/// Returns an error if the directory cannot be resolved or the bootstrap
/// fails.
pub fn run(global: &GlobalOpts, opts: &InitOpts, log: &Logger) -> Result<()> {
    let dir = super::resolve_dir(global)?;
    let init_opts = InitOptions {
        force: opts.force,
        skip_config: opts.skip_config,
        tarantool: super::resolve_tarantool(global),
    };

    log.stage("Initializing environment");
    log.debug(&format!("environment directory: {}", dir.display()));

    let executor = SystemExecutor;
    let mut reader = std::io::stdin().lock();
    let mut writer = std::io::stdout();
    match ConfigBootstrapper::new(&dir, &executor, log).run(&init_opts, &mut reader, &mut writer)? {
        InitOutcome::Written(path) => log.debug(&format!("wrote {}", path.display())),
        InitOutcome::Cancelled => {}
    }
    Ok(())
}
