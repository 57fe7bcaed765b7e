// src/process/raw.rs

//! Plain child processes via `tokio::process`.

use std::process::Stdio;

use anyhow::{Result, anyhow};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::{
    NotRunning, OUTPUT_CHANNEL_CAPACITY, ProcessControl, ProcessEvent, ProcessFactory,
    TaskProcess, TerminalSize,
};
use crate::resolve::LaunchSpec;

/// Spawns processes with piped stdin/stdout/stderr.
///
/// Must be used from inside a Tokio runtime.
#[derive(Debug, Clone, Default)]
pub struct RawProcessFactory;

impl ProcessFactory for RawProcessFactory {
    fn spawn(&self, spec: &LaunchSpec) -> TaskProcess {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (output_tx, output_rx) = mpsc::channel(OUTPUT_CHANNEL_CAPACITY);

        let mut cmd = Command::new(&spec.command);
        cmd.args(&spec.args)
            .current_dir(&spec.options.cwd)
            .env_clear()
            .envs(&spec.options.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(err) => {
                warn!(command = %spec.command, error = %err, "failed to spawn process");
                let _ = event_tx.send(ProcessEvent::Error {
                    code: err.raw_os_error(),
                    message: err.to_string(),
                });
                return TaskProcess::new(event_rx, None, Box::new(NotRunning));
            }
        };

        let pid = child.id();
        info!(command = %spec.command, ?pid, "process started");
        let _ = event_tx.send(ProcessEvent::Started { pid });

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, output_tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, output_tx));
        }

        let (input_tx, input_rx) = mpsc::unbounded_channel::<Vec<u8>>();
        if let Some(stdin) = child.stdin.take() {
            tokio::spawn(feed_stdin(stdin, input_rx));
        }

        let (kill_tx, kill_rx) = oneshot::channel::<()>();
        tokio::spawn(supervise(child, pid, kill_rx, event_tx));

        TaskProcess::new(
            event_rx,
            Some(output_rx),
            Box::new(RawControl {
                input: input_tx,
                kill: Some(kill_tx),
            }),
        )
    }
}

struct RawControl {
    input: mpsc::UnboundedSender<Vec<u8>>,
    kill: Option<oneshot::Sender<()>>,
}

impl ProcessControl for RawControl {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.input
            .send(data.to_vec())
            .map_err(|_| anyhow!("process stdin is closed"))
    }

    fn resize(&mut self, size: TerminalSize) -> Result<()> {
        debug!(rows = size.rows, cols = size.cols, "resize ignored for non-pty process");
        Ok(())
    }

    fn kill(&mut self) -> Result<()> {
        if let Some(kill) = self.kill.take() {
            if kill.send(()).is_err() {
                debug!("process already finished while killing");
            }
        }
        Ok(())
    }
}

/// Either the process exits on its own, or a kill request arrives.
///
/// If the control side is dropped without a kill request, the child is
/// dropped too and `kill_on_drop` ends it.
async fn supervise(
    mut child: Child,
    pid: Option<u32>,
    kill_rx: oneshot::Receiver<()>,
    event_tx: mpsc::UnboundedSender<ProcessEvent>,
) {
    let code = tokio::select! {
        status = child.wait() => match status {
            Ok(status) => status.code(),
            Err(err) => {
                warn!(?pid, error = %err, "failed to wait for process");
                None
            }
        },
        cancel = kill_rx => match cancel {
            Ok(()) => {
                info!(?pid, "kill requested; stopping process");
                if let Err(err) = child.kill().await {
                    warn!(?pid, error = %err, "failed to kill process");
                }
                child.wait().await.ok().and_then(|status| status.code())
            }
            Err(_) => {
                debug!(?pid, "process control dropped; process will be killed on drop");
                return;
            }
        },
    };

    debug!(?pid, ?code, "process exited");
    let _ = event_tx.send(ProcessEvent::Exited { code });
}

async fn forward_lines<R>(stream: R, output_tx: mpsc::Sender<Vec<u8>>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut lines = BufReader::new(stream).lines();
    let mut forwarding = true;

    while let Ok(Some(line)) = lines.next_line().await {
        if !forwarding {
            continue;
        }
        let mut bytes = line.into_bytes();
        bytes.push(b'\n');
        if output_tx.send(bytes).await.is_err() {
            forwarding = false;
        }
    }
}

async fn feed_stdin(mut stdin: ChildStdin, mut input_rx: mpsc::UnboundedReceiver<Vec<u8>>) {
    while let Some(data) = input_rx.recv().await {
        if let Err(err) = stdin.write_all(&data).await {
            debug!(error = %err, "process stdin closed");
            break;
        }
        let _ = stdin.flush().await;
    }
}
