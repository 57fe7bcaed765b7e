// src/logging.rs

//! Logging setup for `taskterm` using `tracing` + `tracing-subscriber`.
//!
//! The filter is chosen in this order:
//! 1. `--log-level` CLI flag, applied to every target
//! 2. `TASKTERM_LOG`, read as `EnvFilter` directives
//!    (e.g. `debug` or `taskterm::surface=trace,info`)
//! 3. `info`
//!
//! An unparsable `TASKTERM_LOG` falls back to `info` with a warning once the
//! subscriber is up. Logs go to STDERR; stdout carries the task's output.

use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "TASKTERM_LOG";

/// Initialise the global logging subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env_value = std::env::var(LOG_ENV_VAR).ok();
    let (filter, rejected) = build_filter(cli_level, env_value.as_deref());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {e}"))?;

    if let Some(err) = rejected {
        tracing::warn!(var = LOG_ENV_VAR, error = %err, "ignoring invalid log filter");
    }
    Ok(())
}

/// Build the filter, returning the parse error of a rejected env value.
fn build_filter(cli_level: Option<LogLevel>, env_value: Option<&str>) -> (EnvFilter, Option<String>) {
    if let Some(level) = cli_level {
        return (EnvFilter::default().add_directive(level_filter(level).into()), None);
    }

    match env_value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(directives) => match EnvFilter::try_new(directives) {
            Ok(filter) => (filter, None),
            Err(err) => (info_filter(), Some(err.to_string())),
        },
        None => (info_filter(), None),
    }
}

fn info_filter() -> EnvFilter {
    EnvFilter::default().add_directive(LevelFilter::INFO.into())
}

fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    }
}
