//! Tarantool environment bootstrap and packaging.
//!
//! `tt init` migrates legacy directory settings (`.cartridge.yml`,
//! `.tarantoolctl`) into a canonical `tt.yaml` and creates the directories it
//! references. `tt pack` turns the environment into RPM, Debian or tarball
//! packages with embedded systemd units.
//!
//! The public API is organised into layers:
//!
//! - **[`config`]**: the canonical config schema and its file
//! - **[`legacy`]**: loaders for legacy sources and the chain that tries them
//! - **[`bootstrap`]**: the `init` state machine
//! - **[`pack`]**: format packers and the staging helpers they share
//! - **[`commands`]**: top-level subcommand orchestration (`init`, `pack`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod bootstrap;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod legacy;
pub mod logging;
pub mod pack;
pub mod platform;
pub mod prompt;
