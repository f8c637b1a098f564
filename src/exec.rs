//! External process invocation behind an injectable [`Executor`].
use anyhow::{Context, Result};
use std::io::Write as _;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use thiserror::Error;

/// Result of a command execution.
#[derive(Debug, Clone)]
pub struct ExecResult {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Exit code; `None` when the process was killed by a signal.
    pub code: Option<i32>,
}

impl ExecResult {
    /// Captured diagnostic output: stderr when present, stdout otherwise.
    #[must_use]
    pub fn diagnostics(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        }
    }
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

/// Errors raised by external tool invocation.
#[derive(Error, Debug)]
pub enum ExecError {
    /// A tool required by the operation is not resolvable on `PATH`.
    #[error("required binary '{program}' is not found in PATH")]
    MissingBinary {
        /// Name of the missing program.
        program: String,
    },

    /// The tool ran but exited unsuccessfully.
    #[error("{label} failed (exit {code}): {output}")]
    NonZeroExit {
        /// Program (and working directory, when relevant) that was run.
        label: String,
        /// Exit code, or `-1` when the process was killed by a signal.
        code: i32,
        /// Captured tool output for diagnosis.
        output: String,
    },
}

/// Abstraction over process execution so callers can be tested without
/// spawning real tools.
pub trait Executor: Send + Sync + std::fmt::Debug {
    /// Run a command and return its output. Fails if the command exits non-zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the program cannot be spawned or exits non-zero.
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run a command in a specific directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the program cannot be spawned or exits non-zero.
    fn run_in(&self, dir: &Path, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run a command feeding `input` to its standard input.
    ///
    /// # Errors
    ///
    /// Returns an error if the program cannot be spawned or exits non-zero.
    fn run_with_stdin(&self, program: &str, args: &[&str], input: &[u8]) -> Result<ExecResult>;

    /// Check if a program is available on PATH.
    fn which(&self, program: &str) -> bool;
}

/// [`Executor`] backed by [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

/// Execute a command and return the result, failing on non-zero exit.
fn execute_checked(mut cmd: Command, label: &str) -> Result<ExecResult> {
    let output = cmd
        .output()
        .with_context(|| format!("failed to execute: {label}"))?;
    check(ExecResult::from(output), label)
}

fn check(result: ExecResult, label: &str) -> Result<ExecResult> {
    if !result.success {
        return Err(ExecError::NonZeroExit {
            label: label.to_string(),
            code: result.code.unwrap_or(-1),
            output: result.diagnostics().to_string(),
        }
        .into());
    }
    Ok(result)
}

impl Executor for SystemExecutor {
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        execute_checked(cmd, program)
    }

    fn run_in(&self, dir: &Path, program: &str, args: &[&str]) -> Result<ExecResult> {
        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(dir);
        execute_checked(cmd, &format!("{program} in {}", dir.display()))
    }

    fn run_with_stdin(&self, program: &str, args: &[&str], input: &[u8]) -> Result<ExecResult> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to execute: {program}"))?;

        if let Some(mut stdin) = child.stdin.take() {
            // A child that exits without draining stdin closes the pipe early;
            // its exit status is what matters.
            match stdin.write_all(input) {
                Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => {
                    return Err(e).with_context(|| format!("writing stdin of {program}"));
                }
                _ => {}
            }
        }

        let output = child
            .wait_with_output()
            .with_context(|| format!("waiting for {program}"))?;
        check(ExecResult::from(output), program)
    }

    fn which(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

/// Ensure every tool in `programs` is resolvable, naming the first one that is not.
///
/// # Errors
///
/// Returns [`ExecError::MissingBinary`] for the first missing program.
pub fn require_binaries(executor: &dyn Executor, programs: &[&str]) -> Result<(), ExecError> {
    match programs.iter().find(|p| !executor.which(p)) {
        Some(missing) => Err(ExecError::MissingBinary {
            program: (*missing).to_string(),
        }),
        None => Ok(()),
    }
}
