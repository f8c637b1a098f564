//! `tt` binary entry point.
use clap::{CommandFactory as _, Parser as _};
use std::process::ExitCode;

use tt_env::cli::{Cli, Command};
use tt_env::commands;
use tt_env::error::ArgError;
use tt_env::logging::{self, Logger};

/// Exit status for invalid command-line input.
const USAGE_EXIT_CODE: u8 = 2;

fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();

    let command_name = match &args.command {
        Command::Init(_) => "init",
        Command::Pack(_) => "pack",
        Command::Version => "version",
    };
    logging::init_subscriber(args.verbose, command_name);
    let log = Logger::new();

    let result = match &args.command {
        Command::Init(opts) => commands::init::run(&args.global, opts, &log),
        Command::Pack(opts) => commands::pack::run(&args.global, opts, &log),
        Command::Version => {
            commands::version::run();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(arg_error) = e.downcast_ref::<ArgError>() {
                let _ = Cli::command()
                    .error(clap::error::ErrorKind::ValueValidation, arg_error)
                    .print();
                return ExitCode::from(USAGE_EXIT_CODE);
            }
            log.error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
