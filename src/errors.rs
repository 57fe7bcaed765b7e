// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaskTermError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The task (or its platform override) does not name a command.
    #[error("task '{label}' has no 'command' to run")]
    MissingCommand { label: String },

    /// No `cwd` was provided by the caller layer.
    #[error("can't run task '{label}' when 'cwd' is not provided by the client")]
    MissingCwd { label: String },

    #[error("\"taskConfig\" must be provided when opening a dedicated terminal")]
    MissingTaskConfig,

    /// The OS refused to start the process.
    #[error("could not run task: {message} (code: {code:?})")]
    CouldNotRun { code: Option<i32>, message: String },

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TaskTermError {
    /// Caller configuration mistakes. These are never worth retrying.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            TaskTermError::ConfigError(_)
                | TaskTermError::MissingCommand { .. }
                | TaskTermError::MissingCwd { .. }
                | TaskTermError::MissingTaskConfig
                | TaskTermError::TaskNotFound(_)
        )
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, TaskTermError>;
