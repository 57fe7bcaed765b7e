use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use taskterm::process::{
    OUTPUT_CHANNEL_CAPACITY, ProcessControl, ProcessEvent, ProcessFactory, TaskProcess,
    TerminalSize,
};
use taskterm::resolve::LaunchSpec;

/// A fake process factory that:
/// - records every launch spec it was asked to spawn
/// - replays a fixed script of lifecycle events and output chunks.
///
/// The event stream stays open while the returned process is alive, so a
/// script without `Exited` behaves like a process that keeps running until
/// it is killed.
#[derive(Clone, Default)]
pub struct FakeProcessFactory {
    script: Vec<ProcessEvent>,
    output: Vec<Vec<u8>>,
    pub spawned: Arc<Mutex<Vec<LaunchSpec>>>,
    pub written: Arc<Mutex<Vec<u8>>>,
    pub resized: Arc<Mutex<Vec<TerminalSize>>>,
    pub killed: Arc<AtomicBool>,
}

impl FakeProcessFactory {
    /// Starts and keeps running.
    pub fn running(pid: u32) -> Self {
        Self::scripted(vec![ProcessEvent::Started { pid: Some(pid) }])
    }

    /// Starts, then exits with `code`.
    pub fn exits_with(pid: u32, code: i32) -> Self {
        Self::scripted(vec![
            ProcessEvent::Started { pid: Some(pid) },
            ProcessEvent::Exited { code: Some(code) },
        ])
    }

    /// Fails to start.
    pub fn fails(code: Option<i32>, message: &str) -> Self {
        Self::scripted(vec![ProcessEvent::Error {
            code,
            message: message.to_string(),
        }])
    }

    pub fn scripted(script: Vec<ProcessEvent>) -> Self {
        Self {
            script,
            ..Self::default()
        }
    }

    pub fn with_output(mut self, chunk: &[u8]) -> Self {
        self.output.push(chunk.to_vec());
        self
    }

    pub fn spawned(&self) -> Vec<LaunchSpec> {
        self.spawned.lock().unwrap().clone()
    }

    pub fn was_killed(&self) -> bool {
        self.killed.load(Ordering::SeqCst)
    }
}

impl ProcessFactory for FakeProcessFactory {
    fn spawn(&self, spec: &LaunchSpec) -> TaskProcess {
        self.spawned.lock().unwrap().push(spec.clone());

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        for event in &self.script {
            let _ = event_tx.send(event.clone());
        }

        let (output_tx, output_rx) = mpsc::channel(OUTPUT_CHANNEL_CAPACITY);
        for chunk in &self.output {
            let _ = output_tx.try_send(chunk.clone());
        }

        let control = FakeControl {
            events: event_tx,
            written: Arc::clone(&self.written),
            resized: Arc::clone(&self.resized),
            killed: Arc::clone(&self.killed),
        };
        TaskProcess::new(event_rx, Some(output_rx), Box::new(control))
    }
}

struct FakeControl {
    events: mpsc::UnboundedSender<ProcessEvent>,
    written: Arc<Mutex<Vec<u8>>>,
    resized: Arc<Mutex<Vec<TerminalSize>>>,
    killed: Arc<AtomicBool>,
}

impl ProcessControl for FakeControl {
    fn write(&mut self, data: &[u8]) -> anyhow::Result<()> {
        self.written.lock().unwrap().extend_from_slice(data);
        Ok(())
    }

    fn resize(&mut self, size: TerminalSize) -> anyhow::Result<()> {
        self.resized.lock().unwrap().push(size);
        Ok(())
    }

    fn kill(&mut self) -> anyhow::Result<()> {
        self.killed.store(true, Ordering::SeqCst);
        let _ = self.events.send(ProcessEvent::Exited { code: None });
        Ok(())
    }
}
