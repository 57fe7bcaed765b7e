// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::errors::{Result, TaskTermError};
use crate::process::TerminalSize;
use crate::task::TaskDescriptor;
use crate::types::ProcessBackend;

/// Configuration exactly as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// shell = "/bin/bash"
/// backend = "pty"
///
/// [task.build]
/// type = "shell"
/// command = "cargo build"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Global settings from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// All tasks from `[task.<name>]`.
    #[serde(default)]
    pub task: BTreeMap<String, TaskDescriptor>,
}

/// Validated configuration.
///
/// Every task has a non-empty label (the table key when `label` is omitted)
/// and names a command somewhere.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub task: BTreeMap<String, TaskDescriptor>,
}

impl ConfigFile {
    /// Build without validation. Used by `TryFrom<RawConfigFile>` after the
    /// checks have passed, and by tests.
    pub fn new_unchecked(config: ConfigSection, task: BTreeMap<String, TaskDescriptor>) -> Self {
        Self { config, task }
    }

    /// Look a task up by table key, falling back to its label.
    pub fn task(&self, name: &str) -> Result<&TaskDescriptor> {
        self.task
            .get(name)
            .or_else(|| self.task.values().find(|t| t.label == name))
            .ok_or_else(|| TaskTermError::TaskNotFound(name.to_string()))
    }

    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.task.keys().map(String::as_str)
    }
}

/// `[config]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConfigSection {
    /// Default shell for shell tasks that do not name one.
    #[serde(default)]
    pub shell: Option<String>,

    /// `"pty"` (default) or `"process"`.
    #[serde(default)]
    pub backend: ProcessBackend,

    /// Pseudo-terminal width.
    #[serde(default = "default_cols")]
    pub cols: u16,

    /// Pseudo-terminal height.
    #[serde(default = "default_rows")]
    pub rows: u16,
}

fn default_cols() -> u16 {
    80
}

fn default_rows() -> u16 {
    24
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            shell: None,
            backend: ProcessBackend::default(),
            cols: default_cols(),
            rows: default_rows(),
        }
    }
}

impl ConfigSection {
    pub fn terminal_size(&self) -> TerminalSize {
        TerminalSize {
            rows: self.rows,
            cols: self.cols,
        }
    }
}
