// src/config/validate.rs

use std::collections::BTreeSet;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, TaskTermError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::TaskTermError;

    fn try_from(mut raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        fill_labels(&mut raw);
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.task))
    }
}

/// A task without an explicit `label` is named after its table key.
fn fill_labels(cfg: &mut RawConfigFile) {
    for (name, task) in cfg.task.iter_mut() {
        if task.label.trim().is_empty() {
            task.label = name.clone();
        }
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_global_config(cfg)?;
    validate_tasks(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(TaskTermError::ConfigError(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.cols == 0 || cfg.config.rows == 0 {
        return Err(TaskTermError::ConfigError(format!(
            "[config].cols and [config].rows must be >= 1 (got {}x{})",
            cfg.config.cols, cfg.config.rows
        )));
    }

    if let Some(shell) = &cfg.config.shell {
        if shell.trim().is_empty() {
            return Err(TaskTermError::ConfigError(
                "[config].shell must not be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_tasks(cfg: &RawConfigFile) -> Result<()> {
    let mut labels = BTreeSet::new();

    for (name, task) in cfg.task.iter() {
        if !task.has_any_command() {
            return Err(TaskTermError::ConfigError(format!(
                "task '{name}' has no 'command' in its base section or any platform section"
            )));
        }
        if !labels.insert(task.label.as_str()) {
            return Err(TaskTermError::ConfigError(format!(
                "task label '{}' is used by more than one task",
                task.label
            )));
        }
    }

    Ok(())
}
