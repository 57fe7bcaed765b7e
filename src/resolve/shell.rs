// src/resolve/shell.rs

//! Shell wrapping for `type = "shell"` tasks.

use tracing::trace;

use crate::quoting::{ShellArg, ShellDialect, build_command_line};
use crate::task::ShellOptions;

/// Shell executable, flags and command line that replace a shell task's
/// original command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellInvocation {
    pub executable: String,
    pub dialect: ShellDialect,
    pub args: Vec<String>,
}

/// Wrap `command` (and optional `args`) for evaluation by `executable`.
///
/// - The dialect is picked from the executable's file name.
/// - `shell.args`, when present, replaces the dialect's default flags.
/// - With `args` (even an empty list) one command line is built from
///   `[command, ...args]`, quoting tokens that need it.
/// - Without `args` the command is taken to be a full command line already
///   and is passed through unchanged.
pub fn wrap_in_shell(
    executable: String,
    shell: Option<&ShellOptions>,
    command: &str,
    args: Option<&[ShellArg]>,
) -> ShellInvocation {
    let dialect = ShellDialect::from_executable(&executable);

    let mut shell_args: Vec<String> = match shell.and_then(|s| s.args.as_ref()) {
        Some(custom) => custom.clone(),
        None => dialect
            .default_args()
            .iter()
            .map(|flag| flag.to_string())
            .collect(),
    };

    let command_line = match args {
        Some(args) => {
            let mut tokens = Vec::with_capacity(args.len() + 1);
            tokens.push(ShellArg::from(command));
            tokens.extend(args.iter().cloned());
            build_command_line(&tokens, dialect)
        }
        None => command.to_string(),
    };

    trace!(%executable, %dialect, %command_line, "wrapped task command in shell");
    shell_args.push(command_line);

    ShellInvocation {
        executable,
        dialect,
        args: shell_args,
    }
}
