// src/runner/task.rs

use tokio::sync::mpsc;
use tracing::debug;

use crate::errors::Result;
use crate::process::{ProcessEvent, TaskProcess, TerminalSize};
use crate::resolve::LaunchSpec;
use crate::task::TaskDescriptor;
use crate::types::TaskId;

/// A task whose process has been confirmed as started.
#[derive(Debug)]
pub struct RunningTask {
    id: TaskId,
    descriptor: TaskDescriptor,
    context: Option<String>,
    launch: LaunchSpec,
    pid: Option<u32>,
    process: TaskProcess,
    exit: Option<Option<i32>>,
}

impl RunningTask {
    pub(crate) fn new(
        id: TaskId,
        descriptor: TaskDescriptor,
        context: Option<String>,
        launch: LaunchSpec,
        pid: Option<u32>,
        process: TaskProcess,
    ) -> Self {
        Self {
            id,
            descriptor,
            context,
            launch,
            pid,
            process,
            exit: None,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.descriptor.label
    }

    pub fn descriptor(&self) -> &TaskDescriptor {
        &self.descriptor
    }

    /// Context (e.g. workspace URI) the task was started for.
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    pub fn launch_spec(&self) -> &LaunchSpec {
        &self.launch
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Process output. Can only be taken once.
    pub fn take_output(&mut self) -> Option<mpsc::Receiver<Vec<u8>>> {
        self.process.take_output()
    }

    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        Ok(self.process.control().write(data)?)
    }

    pub fn resize(&mut self, size: TerminalSize) -> Result<()> {
        Ok(self.process.control().resize(size)?)
    }

    pub fn kill(&mut self) -> Result<()> {
        debug!(task_id = self.id, label = %self.descriptor.label, "killing task process");
        Ok(self.process.control().kill()?)
    }

    /// Wait until the process exits and return its exit code.
    ///
    /// `None` means the process was killed by a signal, or its exit could not
    /// be observed. Calling this again after exit returns the same value.
    pub async fn wait_exit(&mut self) -> Option<i32> {
        if let Some(code) = self.exit {
            return code;
        }

        let code = loop {
            match self.process.next_event().await {
                Some(ProcessEvent::Exited { code }) => break code,
                Some(other) => {
                    debug!(task_id = self.id, event = ?other, "ignoring lifecycle event while waiting for exit");
                }
                None => break None,
            }
        };

        self.exit = Some(code);
        code
    }
}
