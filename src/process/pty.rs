// src/process/pty.rs

//! Pseudo-terminal process factory built on `portable-pty`.
//!
//! Reading the pty and waiting for the child are blocking operations, so each
//! runs on its own OS thread and only forwards messages into Tokio channels.

use std::io::{Read, Write};

use anyhow::{Context, Result};
use portable_pty::{ChildKiller, CommandBuilder, MasterPty, PtySize, native_pty_system};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{
    NotRunning, OUTPUT_CHANNEL_CAPACITY, ProcessControl, ProcessEvent, ProcessFactory,
    TaskProcess, TerminalSize, os_error_code,
};
use crate::resolve::LaunchSpec;

impl From<TerminalSize> for PtySize {
    fn from(size: TerminalSize) -> Self {
        PtySize {
            rows: size.rows.max(1),
            cols: size.cols.max(1),
            pixel_width: 0,
            pixel_height: 0,
        }
    }
}

/// Spawns every process inside a fresh pseudo-terminal.
#[derive(Debug, Clone, Default)]
pub struct PtyProcessFactory {
    size: TerminalSize,
}

impl PtyProcessFactory {
    pub fn new(size: TerminalSize) -> Self {
        Self { size }
    }
}

impl ProcessFactory for PtyProcessFactory {
    fn spawn(&self, spec: &LaunchSpec) -> TaskProcess {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (output_tx, output_rx) = mpsc::channel(OUTPUT_CHANNEL_CAPACITY);

        match spawn_in_pty(spec, self.size, event_tx.clone(), output_tx) {
            Ok(control) => TaskProcess::new(event_rx, Some(output_rx), Box::new(control)),
            Err(err) => {
                let code = os_error_code(&err);
                let message = format!("{err:#}");
                warn!(command = %spec.command, ?code, error = %message, "failed to spawn pty process");
                let _ = event_tx.send(ProcessEvent::Error { code, message });
                TaskProcess::new(event_rx, None, Box::new(NotRunning))
            }
        }
    }
}

struct PtyControl {
    master: Box<dyn MasterPty + Send>,
    writer: Box<dyn Write + Send>,
    killer: Box<dyn ChildKiller + Send + Sync>,
}

impl ProcessControl for PtyControl {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.writer
            .write_all(data)
            .context("failed to write to terminal")?;
        self.writer.flush().context("failed to flush terminal input")
    }

    fn resize(&mut self, size: TerminalSize) -> Result<()> {
        self.master
            .resize(size.into())
            .context("failed to resize terminal")
    }

    fn kill(&mut self) -> Result<()> {
        self.killer.kill().context("failed to kill child process")
    }
}

fn spawn_in_pty(
    spec: &LaunchSpec,
    size: TerminalSize,
    event_tx: mpsc::UnboundedSender<ProcessEvent>,
    output_tx: mpsc::Sender<Vec<u8>>,
) -> Result<PtyControl> {
    let pair = native_pty_system()
        .openpty(size.into())
        .context("failed to open pseudo-terminal")?;

    let mut command = CommandBuilder::new(&spec.command);
    command.args(&spec.args);
    command.cwd(&spec.options.cwd);
    command.env_clear();
    for (key, value) in &spec.options.env {
        command.env(key, value);
    }

    let mut child = pair
        .slave
        .spawn_command(command)
        .with_context(|| format!("failed to spawn '{}'", spec.command))?;
    drop(pair.slave);

    let master = pair.master;
    let reader = master
        .try_clone_reader()
        .context("failed to clone terminal reader")?;
    let writer = master
        .take_writer()
        .context("failed to obtain terminal writer")?;
    let killer = child.clone_killer();

    let pid = child.process_id();
    info!(command = %spec.command, ?pid, "pty process started");
    let _ = event_tx.send(ProcessEvent::Started { pid });

    std::thread::spawn(move || pump_output(reader, output_tx));

    std::thread::spawn(move || {
        let code = match child.wait() {
            Ok(status) => exit_code_from(status.exit_code()),
            Err(err) => {
                warn!(?pid, error = %err, "failed to wait for pty process");
                None
            }
        };
        debug!(?pid, ?code, "pty process exited");
        let _ = event_tx.send(ProcessEvent::Exited { code });
    });

    Ok(PtyControl {
        master,
        writer,
        killer,
    })
}

/// Forward terminal output until EOF. Output keeps being drained after the
/// receiver is gone so the child never blocks on a full pty.
fn pump_output(mut reader: Box<dyn Read + Send>, output_tx: mpsc::Sender<Vec<u8>>) {
    let mut buffer = [0u8; 8192];
    let mut forwarding = true;

    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => {
                if forwarding && output_tx.blocking_send(buffer[..n].to_vec()).is_err() {
                    forwarding = false;
                }
            }
            Err(err) => {
                // Linux reports EIO once the child side of the pty is closed.
                debug!(error = %err, "pty reader finished");
                break;
            }
        }
    }
}

/// Exit codes that do not fit an `i32` (Windows NTSTATUS values such as
/// `0xC0000005`) are reported as no code, like a killed process.
fn exit_code_from(raw: u32) -> Option<i32> {
    match i32::try_from(raw) {
        Ok(code) => Some(code),
        Err(_) => {
            warn!(raw, "pty exit code does not fit an i32; reporting none");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_converted_without_wrapping() {
        assert_eq!(exit_code_from(0), Some(0));
        assert_eq!(exit_code_from(3), Some(3));
        assert_eq!(exit_code_from(i32::MAX as u32), Some(i32::MAX));
        assert_eq!(exit_code_from(0xC000_0005), None);
    }
}
