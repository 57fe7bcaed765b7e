#![allow(dead_code)]

use std::collections::BTreeMap;

use taskterm::config::{ConfigFile, ConfigSection, RawConfigFile};
use taskterm::quoting::ShellArg;
use taskterm::task::{
    CommandOptions, CommandProperties, PresentationOptions, ShellOptions, TaskDescriptor, TaskType,
};
use taskterm::types::{PanelKind, Platform, ProcessBackend};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskDescriptor) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn with_shell(mut self, shell: &str) -> Self {
        self.config.config.shell = Some(shell.to_string());
        self
    }

    pub fn with_backend(mut self, backend: ProcessBackend) -> Self {
        self.config.config.backend = backend;
        self
    }

    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskDescriptor`.
pub struct TaskDescriptorBuilder {
    task: TaskDescriptor,
}

impl TaskDescriptorBuilder {
    pub fn shell(label: &str, command: &str) -> Self {
        Self {
            task: TaskDescriptor::new(label, TaskType::Shell, command),
        }
    }

    pub fn process(label: &str, command: &str) -> Self {
        Self {
            task: TaskDescriptor::new(label, TaskType::Process, command),
        }
    }

    /// Shell task with no base command.
    pub fn shell_without_command(label: &str) -> Self {
        let mut task = TaskDescriptor::new(label, TaskType::Shell, "");
        task.command = None;
        Self { task }
    }

    pub fn arg(mut self, arg: impl Into<ShellArg>) -> Self {
        self.task.args.get_or_insert_with(Vec::new).push(arg.into());
        self
    }

    /// Set an explicit (possibly empty) argument list.
    pub fn args(mut self, args: Vec<ShellArg>) -> Self {
        self.task.args = Some(args);
        self
    }

    pub fn cwd(mut self, cwd: &str) -> Self {
        self.options().cwd = Some(cwd.to_string());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.options()
            .env
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn shell_executable(mut self, executable: &str) -> Self {
        self.shell_options().executable = Some(executable.to_string());
        self
    }

    pub fn shell_args(mut self, args: &[&str]) -> Self {
        self.shell_options().args = Some(args.iter().map(|a| a.to_string()).collect());
        self
    }

    pub fn panel(mut self, panel: PanelKind) -> Self {
        self.task.presentation = Some(PresentationOptions { panel: Some(panel) });
        self
    }

    pub fn platform_command(mut self, platform: Platform, command: &str) -> Self {
        self.platform_block(platform).command = Some(command.to_string());
        self
    }

    pub fn platform_args(mut self, platform: Platform, args: Vec<ShellArg>) -> Self {
        self.platform_block(platform).args = Some(args);
        self
    }

    pub fn platform_options(mut self, platform: Platform, options: CommandOptions) -> Self {
        self.platform_block(platform).options = Some(options);
        self
    }

    pub fn build(self) -> TaskDescriptor {
        self.task
    }

    fn options(&mut self) -> &mut CommandOptions {
        self.task.options.get_or_insert_with(CommandOptions::default)
    }

    fn shell_options(&mut self) -> &mut ShellOptions {
        self.options().shell.get_or_insert_with(ShellOptions::default)
    }

    fn platform_block(&mut self, platform: Platform) -> &mut CommandProperties {
        let block = match platform {
            Platform::Windows => &mut self.task.windows,
            Platform::Osx => &mut self.task.osx,
            Platform::Linux => &mut self.task.linux,
        };
        block.get_or_insert_with(CommandProperties::default)
    }
}
