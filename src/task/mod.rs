// src/task/mod.rs

//! Cross-platform task descriptors.
//!
//! A [`TaskDescriptor`] is a base command record plus optional per-platform
//! override records. [`TaskDescriptor::command_properties`] performs the
//! platform merge: a field present in the selected override replaces the
//! base field wholesale, nothing is deep-merged.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::quoting::ShellArg;
use crate::types::{PanelKind, Platform};

/// Whether the command runs directly or through a shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    /// Executable plus argv; no shell involved.
    Process,
    /// Command line evaluated by a shell.
    Shell,
}

/// Shell override for shell tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ShellOptions {
    /// Shell executable; falls back to the configured or platform default.
    #[serde(default)]
    pub executable: Option<String>,

    /// Replaces the dialect's default flags (even when empty).
    #[serde(default)]
    pub args: Option<Vec<String>>,
}

/// Process options of a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CommandOptions {
    /// Working directory, as a path or a `file:` URI.
    #[serde(default)]
    pub cwd: Option<String>,

    /// Extra environment, layered over the ambient environment.
    #[serde(default)]
    pub env: Option<BTreeMap<String, String>>,

    #[serde(default)]
    pub shell: Option<ShellOptions>,
}

/// The `command`/`args`/`options` triple, as found in the base descriptor or
/// in a platform override block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CommandProperties {
    #[serde(default)]
    pub command: Option<String>,

    /// `None` and `Some(vec![])` differ for shell tasks: without args the
    /// command is already a full command line.
    #[serde(default)]
    pub args: Option<Vec<ShellArg>>,

    #[serde(default)]
    pub options: Option<CommandOptions>,
}

/// Presentation hints relevant to terminal reuse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PresentationOptions {
    #[serde(default)]
    pub panel: Option<PanelKind>,
}

/// Declarative description of a command to run, possibly varying by OS.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskDescriptor {
    /// Human readable name. Filled from the config table key when omitted.
    #[serde(default)]
    pub label: String,

    #[serde(rename = "type")]
    pub task_type: TaskType,

    #[serde(default)]
    pub command: Option<String>,

    #[serde(default)]
    pub args: Option<Vec<ShellArg>>,

    #[serde(default)]
    pub options: Option<CommandOptions>,

    #[serde(default)]
    pub windows: Option<CommandProperties>,

    #[serde(default)]
    pub osx: Option<CommandProperties>,

    #[serde(default)]
    pub linux: Option<CommandProperties>,

    #[serde(default)]
    pub presentation: Option<PresentationOptions>,
}

impl TaskDescriptor {
    /// Minimal descriptor with no arguments and no options.
    pub fn new(label: impl Into<String>, task_type: TaskType, command: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            task_type,
            command: Some(command.into()),
            args: None,
            options: None,
            windows: None,
            osx: None,
            linux: None,
            presentation: None,
        }
    }

    /// Base fields, ignoring every platform block.
    pub fn base_properties(&self) -> CommandProperties {
        CommandProperties {
            command: self.command.clone(),
            args: self.args.clone(),
            options: self.options.clone(),
        }
    }

    /// Override block that applies on `platform`, if the task has one.
    pub fn platform_override(&self, platform: Platform) -> Option<&CommandProperties> {
        match platform {
            Platform::Windows => self.windows.as_ref(),
            Platform::Osx => self.osx.as_ref(),
            Platform::Linux => self.linux.as_ref(),
        }
    }

    /// Effective command properties on `platform`.
    ///
    /// Starts from the base fields; each of `command`, `args` and `options`
    /// present in the platform block replaces the base value as a whole.
    pub fn command_properties(&self, platform: Platform) -> CommandProperties {
        let mut merged = self.base_properties();

        if let Some(block) = self.platform_override(platform) {
            if block.command.is_some() {
                merged.command = block.command.clone();
            }
            if block.args.is_some() {
                merged.args = block.args.clone();
            }
            if block.options.is_some() {
                merged.options = block.options.clone();
            }
        }

        merged
    }

    /// Panel requested by the task's presentation, if any.
    pub fn panel(&self) -> Option<PanelKind> {
        self.presentation.as_ref().and_then(|p| p.panel)
    }

    /// True when some platform could produce a non-empty command.
    pub fn has_any_command(&self) -> bool {
        [
            self.command.as_deref(),
            self.windows.as_ref().and_then(|b| b.command.as_deref()),
            self.osx.as_ref().and_then(|b| b.command.as_deref()),
            self.linux.as_ref().and_then(|b| b.command.as_deref()),
        ]
        .into_iter()
        .flatten()
        .any(|c| !c.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_linux_block(block: CommandProperties) -> TaskDescriptor {
        let mut task = TaskDescriptor::new("build", TaskType::Process, "make");
        task.args = Some(vec!["all".into()]);
        task.options = Some(CommandOptions {
            cwd: Some("/base".into()),
            ..Default::default()
        });
        task.linux = Some(block);
        task
    }

    #[test]
    fn override_fields_replace_base_fields_individually() {
        let task = with_linux_block(CommandProperties {
            command: Some("gmake".into()),
            args: None,
            options: None,
        });

        let merged = task.command_properties(Platform::Linux);
        assert_eq!(merged.command.as_deref(), Some("gmake"));
        assert_eq!(merged.args, Some(vec![ShellArg::from("all")]));
        assert_eq!(
            merged.options.and_then(|o| o.cwd).as_deref(),
            Some("/base")
        );
    }

    #[test]
    fn override_options_are_not_deep_merged() {
        let task = with_linux_block(CommandProperties {
            command: None,
            args: None,
            options: Some(CommandOptions {
                env: Some(BTreeMap::from([("A".to_string(), "1".to_string())])),
                ..Default::default()
            }),
        });

        let merged = task.command_properties(Platform::Linux);
        let options = merged.options.expect("options present");
        assert_eq!(options.cwd, None);
        assert!(options.env.is_some());
    }

    #[test]
    fn other_platforms_use_base_fields() {
        let task = with_linux_block(CommandProperties {
            command: Some("gmake".into()),
            ..Default::default()
        });

        assert_eq!(task.command_properties(Platform::Osx), task.base_properties());
        assert_eq!(task.command_properties(Platform::Windows), task.base_properties());
    }

    #[test]
    fn has_any_command_looks_at_platform_blocks() {
        let mut task = TaskDescriptor::new("t", TaskType::Shell, "  ");
        assert!(!task.has_any_command());

        task.windows = Some(CommandProperties {
            command: Some("dir".into()),
            ..Default::default()
        });
        assert!(task.has_any_command());
    }
}
