// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::types::ProcessBackend;

/// Command-line arguments for `taskterm`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "taskterm",
    version,
    about = "Resolve cross-platform task descriptors and run them in a terminal.",
    long_about = None
)]
pub struct CliArgs {
    /// Task to run (table key or label).
    ///
    /// May be omitted when the config defines exactly one task, or with
    /// `--dry-run` to print every task.
    #[arg(value_name = "TASK")]
    pub task: Option<String>,

    /// Path to the config file (TOML).
    ///
    /// Default: `Taskterm.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Taskterm.toml")]
    pub config: String,

    /// Working directory for tasks that do not set `options.cwd`.
    ///
    /// Defaults to the directory containing the config file.
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Process backend (`pty` or `process`); overrides `[config].backend`.
    #[arg(long, value_name = "BACKEND")]
    pub backend: Option<ProcessBackend>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TASKTERM_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse, validate and print the resolved command lines without running
    /// anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_and_label_parse() {
        let args =
            CliArgs::try_parse_from(["taskterm", "--backend", "process", "--dry-run", "build"])
                .unwrap();
        assert_eq!(args.backend, Some(ProcessBackend::Process));
        assert_eq!(args.task.as_deref(), Some("build"));
        assert!(args.dry_run);
        assert_eq!(args.config, "Taskterm.toml");
    }

    #[test]
    fn unknown_backend_is_rejected() {
        assert!(CliArgs::try_parse_from(["taskterm", "--backend", "ssh"]).is_err());
    }
}
