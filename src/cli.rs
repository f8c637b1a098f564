//! Command-line argument definitions.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::pack::PackFormat;
use crate::platform::Arch;

/// Top-level CLI entry point.
#[derive(Parser, Debug)]
#[command(
    name = "tt",
    about = "Tarantool environment bootstrap and packaging",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Environment directory (defaults to the current directory)
    #[arg(short = 'C', long = "dir", global = true)]
    pub dir: Option<PathBuf>,

    /// Tarantool executable (defaults to the one found in PATH)
    #[arg(long, global = true)]
    pub tarantool: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an environment config, migrating legacy configs if present
    Init(InitOpts),
    /// Package the environment
    Pack(PackOpts),
    /// Print version information
    Version,
}

/// Options for the `init` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct InitOpts {
    /// Overwrite an existing config without asking
    #[arg(short, long)]
    pub force: bool,

    /// Ignore .cartridge.yml and .tarantoolctl
    #[arg(short, long)]
    pub skip_config: bool,
}

/// Options for the `pack` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct PackOpts {
    /// Package formats to build
    #[arg(value_enum, required = true, num_args = 1..)]
    pub formats: Vec<PackFormat>,

    /// Package version
    #[arg(long)]
    pub version: Option<String>,

    /// Package name (defaults to the environment directory name)
    #[arg(long)]
    pub name: Option<String>,

    /// Target architecture (x86_64, aarch64)
    #[arg(long)]
    pub arch: Option<Arch>,

    /// Directory for the built packages
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Embed the tarantool executable in the package
    #[arg(long, conflicts_with = "without_binaries")]
    pub with_tarantool: bool,

    /// Do not embed the tarantool executable
    #[arg(long)]
    pub without_binaries: bool,

    /// Custom systemd unit template
    #[arg(long)]
    pub unit_template: Option<PathBuf>,

    /// Environment config to use instead of the one in the environment directory
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl PackOpts {
    /// Runtime embedding requested on the command line, if any.
    #[must_use]
    pub const fn include_runtime(&self) -> Option<bool> {
        if self.with_tarantool {
            Some(true)
        } else if self.without_binaries {
            Some(false)
        } else {
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse_pack(args: &[&str]) -> PackOpts {
        let cli = Cli::parse_from(args);
        match cli.command {
            Command::Pack(opts) => opts,
            other => panic!("expected pack command, got {other:?}"),
        }
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_init_flags() {
        let cli = Cli::parse_from(["tt", "init", "--force", "--skip-config"]);
        assert!(
            matches!(&cli.command, Command::Init(opts) if opts.force && opts.skip_config),
            "{cli:?}"
        );
    }

    #[test]
    fn parse_global_dir_short() {
        let cli = Cli::parse_from(["tt", "-C", "/srv/env", "init"]);
        assert_eq!(cli.global.dir, Some(PathBuf::from("/srv/env")));
    }

    #[test]
    fn parse_tarantool_after_subcommand() {
        let cli = Cli::parse_from(["tt", "init", "--tarantool", "/opt/tarantool"]);
        assert_eq!(cli.global.tarantool, Some(PathBuf::from("/opt/tarantool")));
    }

    #[test]
    fn parse_multiple_formats() {
        let opts = parse_pack(&["tt", "pack", "rpm", "deb", "--version", "1.2.3"]);
        assert_eq!(opts.formats, vec![PackFormat::Rpm, PackFormat::Deb]);
        assert_eq!(opts.version.as_deref(), Some("1.2.3"));
        assert_eq!(opts.include_runtime(), None);
    }

    #[test]
    fn parse_arch_override() {
        let opts = parse_pack(&["tt", "pack", "deb", "--arch", "arm64"]);
        assert_eq!(opts.arch, Some(Arch::Aarch64));
    }

    #[test]
    fn unsupported_arch_is_rejected() {
        assert!(Cli::try_parse_from(["tt", "pack", "rpm", "--arch", "sparc"]).is_err());
    }

    #[test]
    fn pack_requires_a_format() {
        assert!(Cli::try_parse_from(["tt", "pack"]).is_err());
        assert!(Cli::try_parse_from(["tt", "pack", "docker"]).is_err());
    }

    #[test]
    fn runtime_flags_conflict() {
        assert!(
            Cli::try_parse_from(["tt", "pack", "tgz", "--with-tarantool", "--without-binaries"])
                .is_err()
        );
        let opts = parse_pack(&["tt", "pack", "tgz", "--without-binaries"]);
        assert_eq!(opts.include_runtime(), Some(false));
        let opts = parse_pack(&["tt", "pack", "tgz", "--with-tarantool"]);
        assert_eq!(opts.include_runtime(), Some(true));
    }

    #[test]
    fn parse_version() {
        let cli = Cli::parse_from(["tt", "version"]);
        assert!(matches!(cli.command, Command::Version));
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::parse_from(["tt", "-v", "init"]);
        assert!(cli.verbose);
    }
}
