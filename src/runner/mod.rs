// src/runner/mod.rs

//! Process task runner.
//!
//! Runs a task descriptor as a process: resolve the launch spec, spawn it
//! through the configured [`ProcessFactory`], and wait until the process
//! reports that it started (or failed to start). Both `process` and `shell`
//! tasks go through the same factory; the type only changes how the command
//! line was resolved.

pub mod task;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{error, info};

use crate::errors::{Result, TaskTermError};
use crate::process::{ProcessEvent, ProcessFactory, PtyProcessFactory};
use crate::resolve::CommandResolver;
use crate::task::TaskDescriptor;
use crate::types::TaskId;

pub use task::RunningTask;

/// Hands out task ids that are unique within a session.
pub trait TaskIdSource: Send + Sync {
    fn next_id(&self) -> TaskId;
}

/// Counter starting at 0.
#[derive(Debug, Default)]
pub struct SessionTaskIds {
    next: AtomicU64,
}

impl TaskIdSource for SessionTaskIds {
    fn next_id(&self) -> TaskId {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// Runs tasks as processes.
pub struct ProcessTaskRunner<F: ProcessFactory = PtyProcessFactory> {
    factory: F,
    resolver: CommandResolver,
    ids: Arc<dyn TaskIdSource>,
}

impl<F: ProcessFactory> std::fmt::Debug for ProcessTaskRunner<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessTaskRunner")
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

impl<F: ProcessFactory> ProcessTaskRunner<F> {
    pub fn new(factory: F, resolver: CommandResolver) -> Self {
        Self {
            factory,
            resolver,
            ids: Arc::new(SessionTaskIds::default()),
        }
    }

    /// Share task ids with an external registry.
    pub fn with_task_ids(mut self, ids: Arc<dyn TaskIdSource>) -> Self {
        self.ids = ids;
        self
    }

    pub fn resolver(&self) -> &CommandResolver {
        &self.resolver
    }

    /// Run `task` and return once its process has started.
    ///
    /// - A task without a base `command` is rejected before anything else.
    /// - Resolution errors and start failures are logged here and returned;
    ///   nothing is retried.
    pub async fn run(&self, task: &TaskDescriptor, context: Option<String>) -> Result<RunningTask> {
        if task.command.as_deref().is_none_or(|c| c.trim().is_empty()) {
            return Err(TaskTermError::MissingCommand {
                label: task.label.clone(),
            });
        }

        match self.start(task, context).await {
            Ok(running) => Ok(running),
            Err(err) => {
                error!(task = %task.label, error = %err, "error occurred while creating task");
                Err(err)
            }
        }
    }

    async fn start(&self, task: &TaskDescriptor, context: Option<String>) -> Result<RunningTask> {
        let spec = self.resolver.resolve(task)?;

        info!(
            task = %task.label,
            task_type = ?task.task_type,
            command = %spec.display_line(),
            cwd = %spec.options.cwd.display(),
            "starting task process"
        );

        let mut process = self.factory.spawn(&spec);

        match process.next_event().await {
            Some(ProcessEvent::Started { pid }) => {
                let id = self.ids.next_id();
                info!(task = %task.label, task_id = id, ?pid, "task process started");
                Ok(RunningTask::new(id, task.clone(), context, spec, pid, process))
            }
            Some(ProcessEvent::Error { code, message }) => {
                Err(TaskTermError::CouldNotRun { code, message })
            }
            Some(ProcessEvent::Exited { code }) => Err(TaskTermError::CouldNotRun {
                code: None,
                message: format!("process exited with {code:?} before it was reported as started"),
            }),
            None => Err(TaskTermError::CouldNotRun {
                code: None,
                message: "process ended without reporting a start".to_string(),
            }),
        }
    }
}
