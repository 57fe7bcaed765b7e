// src/process/mod.rs

//! Process layer.
//!
//! The runner never spawns processes itself; it hands a [`LaunchSpec`] to a
//! [`ProcessFactory`] and listens to the resulting [`TaskProcess`].
//!
//! - [`pty`] spawns inside a pseudo-terminal (what terminal surfaces expect);
//!   this is the default used for every task type.
//! - [`raw`] spawns a plain child with piped stdio via `tokio::process`.
//!
//! Spawning never fails synchronously. A process that could not be started
//! reports [`ProcessEvent::Error`] as its first lifecycle event, so callers
//! handle "started" and "failed to start" in one place.

pub mod pty;
pub mod raw;

use anyhow::{Result, anyhow};
use tokio::sync::mpsc;

use crate::resolve::LaunchSpec;

pub use pty::PtyProcessFactory;
pub use raw::RawProcessFactory;

/// Chunks of output buffered before a slow reader applies backpressure.
pub const OUTPUT_CHANNEL_CAPACITY: usize = 256;

/// Lifecycle signal of a spawned process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    /// The OS accepted the process.
    Started { pid: Option<u32> },
    /// The process could not be started. `code` is the OS error code when
    /// one is known.
    Error { code: Option<i32>, message: String },
    /// The process ended. `code` is `None` when it was killed by a signal.
    Exited { code: Option<i32> },
}

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalSize {
    pub rows: u16,
    pub cols: u16,
}

impl Default for TerminalSize {
    fn default() -> Self {
        Self { rows: 24, cols: 80 }
    }
}

/// Input side of a running process.
pub trait ProcessControl: Send {
    fn write(&mut self, data: &[u8]) -> Result<()>;
    fn resize(&mut self, size: TerminalSize) -> Result<()>;
    fn kill(&mut self) -> Result<()>;
}

/// Control for a process that never started.
#[derive(Debug, Default)]
pub struct NotRunning;

impl ProcessControl for NotRunning {
    fn write(&mut self, _data: &[u8]) -> Result<()> {
        Err(anyhow!("process is not running"))
    }

    fn resize(&mut self, _size: TerminalSize) -> Result<()> {
        Err(anyhow!("process is not running"))
    }

    fn kill(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Handle to a spawned (or failed) process.
pub struct TaskProcess {
    events: mpsc::UnboundedReceiver<ProcessEvent>,
    output: Option<mpsc::Receiver<Vec<u8>>>,
    control: Box<dyn ProcessControl>,
}

impl std::fmt::Debug for TaskProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskProcess")
            .field("has_output", &self.output.is_some())
            .finish_non_exhaustive()
    }
}

impl TaskProcess {
    pub fn new(
        events: mpsc::UnboundedReceiver<ProcessEvent>,
        output: Option<mpsc::Receiver<Vec<u8>>>,
        control: Box<dyn ProcessControl>,
    ) -> Self {
        Self {
            events,
            output,
            control,
        }
    }

    /// A process whose only event is a start failure.
    pub fn failed(code: Option<i32>, message: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(ProcessEvent::Error {
            code,
            message: message.into(),
        });
        Self::new(rx, None, Box::new(NotRunning))
    }

    /// Next lifecycle event; `None` once the process side has gone away.
    pub async fn next_event(&mut self) -> Option<ProcessEvent> {
        self.events.recv().await
    }

    /// Output stream (pty bytes, or stdout/stderr lines). Can be taken once.
    pub fn take_output(&mut self) -> Option<mpsc::Receiver<Vec<u8>>> {
        self.output.take()
    }

    pub fn control(&mut self) -> &mut dyn ProcessControl {
        self.control.as_mut()
    }
}

/// Spawns processes from resolved launch specs.
pub trait ProcessFactory: Send + Sync {
    fn spawn(&self, spec: &LaunchSpec) -> TaskProcess;
}

impl<F: ProcessFactory + ?Sized> ProcessFactory for Box<F> {
    fn spawn(&self, spec: &LaunchSpec) -> TaskProcess {
        (**self).spawn(spec)
    }
}

/// OS error code buried anywhere in an error chain.
pub fn os_error_code(err: &anyhow::Error) -> Option<i32> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<std::io::Error>())
        .and_then(std::io::Error::raw_os_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn failed_process_reports_error_then_closes() {
        let mut process = TaskProcess::failed(Some(2), "no such file");
        assert_eq!(
            process.next_event().await,
            Some(ProcessEvent::Error {
                code: Some(2),
                message: "no such file".to_string()
            })
        );
        assert_eq!(process.next_event().await, None);
        assert!(process.take_output().is_none());
        assert!(process.control().write(b"x").is_err());
    }

    #[test]
    fn os_error_code_walks_context_chain() {
        let io = std::io::Error::from_raw_os_error(13);
        let err = anyhow::Error::new(io).context("spawning 'x'");
        assert_eq!(os_error_code(&err), Some(13));
        assert_eq!(os_error_code(&anyhow!("plain")), None);
    }
}
