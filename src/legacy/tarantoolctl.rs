//! Script-evaluated loader for `.tarantoolctl`.
//!
//! The legacy file is Lua, so it is evaluated by the interpreter itself: an
//! embedded script is fed on stdin, loads the file and prints the settings
//! it defines as YAML.
use serde_yaml::{Mapping, Value};
use std::path::Path;

use super::{DirectoryInfo, LayoutKind, LegacyLoader};
use crate::error::LegacyError;
use crate::exec::Executor;

/// Lua script printing the directory settings of a tarantoolctl config.
const PRINT_CFG_SCRIPT: &str = include_str!("print_tarantoolctl_cfg.lua");

/// Evaluates a tarantoolctl defaults file through the interpreter.
#[derive(Debug, Clone, Copy)]
pub struct TarantoolctlLoader<'a> {
    executor: &'a dyn Executor,
    interpreter: Option<&'a Path>,
}

impl<'a> TarantoolctlLoader<'a> {
    /// Create a loader running `interpreter` through `executor`.
    #[must_use]
    pub const fn new(executor: &'a dyn Executor, interpreter: Option<&'a Path>) -> Self {
        Self {
            executor,
            interpreter,
        }
    }
}

impl LegacyLoader for TarantoolctlLoader<'_> {
    fn load(&self, path: &Path) -> Result<DirectoryInfo, LegacyError> {
        let interpreter = self
            .interpreter
            .ok_or(LegacyError::InterpreterNotConfigured)?;

        let interpreter = interpreter.to_string_lossy();
        let source = path.to_string_lossy();
        let output = self
            .executor
            .run_with_stdin(&interpreter, &["-", &source], PRINT_CFG_SCRIPT.as_bytes())
            .map_err(|e| LegacyError::Interpreter(format!("{e:#}")))?;

        parse_settings(&output.stdout)
    }
}

/// Map the interpreter's YAML output onto [`DirectoryInfo`].
///
/// Unknown keys and null values are ignored.
fn parse_settings(output: &str) -> Result<DirectoryInfo, LegacyError> {
    let value: Value =
        serde_yaml::from_str(output).map_err(|e| LegacyError::Output(e.to_string()))?;
    let mapping = match value {
        Value::Mapping(m) => m,
        Value::Null => Mapping::new(),
        other => {
            return Err(LegacyError::Output(format!(
                "expected a mapping, got {other:?}"
            )));
        }
    };

    let mut info = DirectoryInfo {
        layout: LayoutKind::Tarantoolctl,
        ..DirectoryInfo::default()
    };
    for (key, slot) in [
        ("wal_dir", &mut info.wal_dir),
        ("vinyl_dir", &mut info.vinyl_dir),
        ("memtx_dir", &mut info.memtx_dir),
        ("log_dir", &mut info.log_dir),
        ("pid_file", &mut info.run_dir),
        ("instance_dir", &mut info.instances_enabled),
    ] {
        match mapping.get(key) {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) => *slot = super::non_empty(s.clone()),
            Some(_) => {
                return Err(LegacyError::InvalidField {
                    key: key.to_string(),
                });
            }
        }
    }
    Ok(info)
}
