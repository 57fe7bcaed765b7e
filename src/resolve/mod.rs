// src/resolve/mod.rs

//! Command resolution: from a cross-platform [`TaskDescriptor`] to the
//! concrete [`LaunchSpec`] a process factory can spawn.
//!
//! Resolution is a pure function of the descriptor and the resolver's inputs
//! (platform, ambient environment snapshot, defaults), so resolving the same
//! descriptor twice yields equal specs.

pub mod shell;

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::debug;
use url::Url;

use crate::errors::{Result, TaskTermError};
use crate::task::{ShellOptions, TaskDescriptor, TaskType};
use crate::types::Platform;

pub use shell::{ShellInvocation, wrap_in_shell};

/// Environment variable that overrides the platform default shell.
pub const SHELL_ENV_VAR: &str = "TASKTERM_SHELL";

/// Working directory and full environment of a process to launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    pub cwd: PathBuf,
    pub env: BTreeMap<String, String>,
}

/// Fully resolved `{command, args, options}` for one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub command: String,
    pub args: Vec<String>,
    pub options: LaunchOptions,
}

impl LaunchSpec {
    /// Command and arguments joined for display. Not meant for execution.
    pub fn display_line(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Resolves task descriptors for one platform.
#[derive(Debug, Clone)]
pub struct CommandResolver {
    platform: Platform,
    ambient_env: BTreeMap<String, String>,
    default_shell: Option<String>,
    default_cwd: Option<PathBuf>,
}

impl CommandResolver {
    pub fn new(platform: Platform, ambient_env: BTreeMap<String, String>) -> Self {
        Self {
            platform,
            ambient_env,
            default_shell: None,
            default_cwd: None,
        }
    }

    /// Resolver for the running platform, with a snapshot of this process's
    /// environment. Variables that are not valid UTF-8 are skipped.
    pub fn from_process_env() -> Self {
        let env = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self::new(Platform::current(), env)
    }

    /// Shell used by shell tasks that don't name one.
    pub fn with_default_shell(mut self, shell: Option<String>) -> Self {
        self.default_shell = shell;
        self
    }

    /// Working directory used when a task doesn't provide one.
    ///
    /// Without it, tasks lacking `cwd` fail to resolve.
    pub fn with_default_cwd(mut self, cwd: Option<PathBuf>) -> Self {
        self.default_cwd = cwd;
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Resolve `task` into a launch spec.
    ///
    /// Fails with [`TaskTermError::MissingCwd`] when no working directory is
    /// available and with [`TaskTermError::MissingCommand`] when the merged
    /// command is absent or blank.
    pub fn resolve(&self, task: &TaskDescriptor) -> Result<LaunchSpec> {
        let props = task.command_properties(self.platform);
        let options = props.options.unwrap_or_default();

        let cwd = match options.cwd.as_deref().filter(|c| !c.trim().is_empty()) {
            Some(cwd) => to_fs_path(cwd)?,
            None => self
                .default_cwd
                .clone()
                .ok_or_else(|| TaskTermError::MissingCwd {
                    label: task.label.clone(),
                })?,
        };

        let mut env = self.ambient_env.clone();
        if let Some(extra) = options.env {
            env.extend(extra);
        }

        let command = props
            .command
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| TaskTermError::MissingCommand {
                label: task.label.clone(),
            })?;

        let (command, args) = match task.task_type {
            TaskType::Shell => {
                let executable = self.shell_executable(options.shell.as_ref());
                let invocation = wrap_in_shell(
                    executable,
                    options.shell.as_ref(),
                    &command,
                    props.args.as_deref(),
                );
                (invocation.executable, invocation.args)
            }
            TaskType::Process => {
                let args = props
                    .args
                    .unwrap_or_default()
                    .iter()
                    .map(|arg| arg.value().to_string())
                    .collect();
                (command, args)
            }
        };

        debug!(
            task = %task.label,
            platform = %self.platform,
            %command,
            ?args,
            cwd = %cwd.display(),
            "resolved task command"
        );

        Ok(LaunchSpec {
            command,
            args,
            options: LaunchOptions { cwd, env },
        })
    }

    /// Shell executable for a shell task.
    ///
    /// Order: the task's own `shell.executable`, the resolver default,
    /// `TASKTERM_SHELL`, then the platform default (`COMSPEC` or `cmd.exe`
    /// on Windows, `SHELL` or `/bin/sh` elsewhere).
    pub fn shell_executable(&self, shell: Option<&ShellOptions>) -> String {
        if let Some(executable) = shell.and_then(|s| s.executable.clone()) {
            return executable;
        }
        if let Some(default) = &self.default_shell {
            return default.clone();
        }
        if let Some(from_env) = self.ambient_var(SHELL_ENV_VAR) {
            return from_env.to_string();
        }
        match self.platform {
            Platform::Windows => self.ambient_var("COMSPEC").unwrap_or("cmd.exe").to_string(),
            Platform::Osx | Platform::Linux => {
                self.ambient_var("SHELL").unwrap_or("/bin/sh").to_string()
            }
        }
    }

    fn ambient_var(&self, name: &str) -> Option<&str> {
        self.ambient_env
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// Accept both plain paths and `file:` URIs.
fn to_fs_path(cwd: &str) -> Result<PathBuf> {
    if !cwd.starts_with("file:") {
        return Ok(PathBuf::from(cwd));
    }

    let url = Url::parse(cwd)
        .map_err(|e| TaskTermError::ConfigError(format!("invalid cwd URI '{cwd}': {e}")))?;
    url.to_file_path().map_err(|()| {
        TaskTermError::ConfigError(format!("cwd URI '{cwd}' is not a local file path"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn file_uri_cwd_is_decoded() {
        let path = to_fs_path("file:///home/me/my%20project").expect("valid uri");
        assert_eq!(path, PathBuf::from("/home/me/my project"));
    }

    #[test]
    fn plain_cwd_is_kept() {
        assert_eq!(to_fs_path("./work").unwrap(), PathBuf::from("./work"));
    }

    #[cfg(unix)]
    #[test]
    fn remote_file_uri_is_rejected() {
        let err = to_fs_path("file://server/share").unwrap_err();
        assert!(matches!(err, TaskTermError::ConfigError(_)));
    }

    #[test]
    fn shell_falls_back_to_platform_defaults() {
        let resolver = CommandResolver::new(Platform::Linux, BTreeMap::new());
        assert_eq!(resolver.shell_executable(None), "/bin/sh");

        let resolver = CommandResolver::new(
            Platform::Windows,
            BTreeMap::from([("COMSPEC".to_string(), r"C:\cmd.exe".to_string())]),
        );
        assert_eq!(resolver.shell_executable(None), r"C:\cmd.exe");
    }

    #[test]
    fn shell_env_override_beats_platform_default() {
        let env = BTreeMap::from([
            ("SHELL".to_string(), "/bin/zsh".to_string()),
            (SHELL_ENV_VAR.to_string(), "/bin/bash".to_string()),
        ]);
        let resolver = CommandResolver::new(Platform::Osx, env);
        assert_eq!(resolver.shell_executable(None), "/bin/bash");

        let resolver = resolver.with_default_shell(Some("pwsh".into()));
        assert_eq!(resolver.shell_executable(None), "pwsh");
    }
}
