// src/surface/manager.rs

use std::fmt;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::errors::{Result, TaskTermError};
use crate::types::{PanelKind, TaskId};

use super::pool::{SurfaceEntry, SurfacePool};
use super::service::{DescriptorComparator, TaskComparator, TaskRegistry, TerminalService};
use super::{OpenOptions, REUSE_MESSAGE, SurfaceEvent, WidgetId};

/// An `open` call sent to a manager running as a task.
#[derive(Debug)]
pub struct OpenRequest {
    pub options: OpenOptions,
    pub reply: oneshot::Sender<Result<WidgetId>>,
}

impl OpenRequest {
    pub fn new(options: OpenOptions) -> (Self, oneshot::Receiver<Result<WidgetId>>) {
        let (reply, rx) = oneshot::channel();
        (Self { options, reply }, rx)
    }
}

/// Chooses, creates and recycles terminal surfaces for task runs.
///
/// IO shell around [`SurfacePool`]. Lifecycle events arrive on an unbounded
/// channel and are applied before every `open`, so a selection always sees
/// every exit and close reported so far. All pool access goes through
/// `&mut self`, which serializes it.
pub struct SurfaceManager<T: TerminalService, R: TaskRegistry> {
    pool: SurfacePool,
    terminals: T,
    registry: R,
    comparator: Box<dyn TaskComparator>,
    context: Option<String>,
    events: mpsc::UnboundedReceiver<SurfaceEvent>,
}

impl<T: TerminalService, R: TaskRegistry> fmt::Debug for SurfaceManager<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceManager")
            .field("pool", &self.pool)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl<T: TerminalService, R: TaskRegistry> SurfaceManager<T, R> {
    pub fn new(terminals: T, registry: R, events: mpsc::UnboundedReceiver<SurfaceEvent>) -> Self {
        Self {
            pool: SurfacePool::new(),
            terminals,
            registry,
            comparator: Box::new(DescriptorComparator),
            context: None,
            events,
        }
    }

    pub fn with_comparator(mut self, comparator: Box<dyn TaskComparator>) -> Self {
        self.comparator = comparator;
        self
    }

    /// Workspace context passed to the registry on reconnection.
    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }

    pub fn pool(&self) -> &SurfacePool {
        &self.pool
    }

    pub fn terminals(&self) -> &T {
        &self.terminals
    }

    pub fn terminals_mut(&mut self) -> &mut T {
        &mut self.terminals
    }

    /// Pick or create the surface for a task run and reveal it.
    ///
    /// Dedicated requests reuse an idle surface that last ran an equal task.
    /// Shared requests reuse any idle non-dedicated surface, preferring the
    /// last used one. `New` requests, and requests with nothing reusable,
    /// get a fresh surface.
    pub async fn open(&mut self, options: OpenOptions) -> Result<WidgetId> {
        if options.is_dedicated() && options.task_config.is_none() {
            return Err(TaskTermError::MissingTaskConfig);
        }

        self.process_pending_events().await;

        let widget_id = match self.find_reusable(&options) {
            Some(widget_id) => {
                self.reuse(&widget_id, &options);
                debug!(
                    widget = %widget_id,
                    task_id = options.task_id,
                    panel = ?options.panel_kind(),
                    "reusing terminal surface"
                );
                widget_id
            }
            None => {
                let widget_id = self.terminals.new_terminal(options.clone()).await?;
                self.track_new(&widget_id, &options);
                info!(
                    widget = %widget_id,
                    task_id = options.task_id,
                    panel = ?options.panel_kind(),
                    "created terminal surface"
                );
                widget_id
            }
        };

        self.terminals.open(&widget_id, options).await?;
        Ok(widget_id)
    }

    /// Apply one lifecycle event to the pool.
    pub async fn handle_event(&mut self, event: SurfaceEvent) {
        debug!(?event, "surface manager received event");

        match event {
            SurfaceEvent::TaskExited { task_id } => self.on_task_exited(task_id),
            SurfaceEvent::Reconnected {
                widget_id,
                terminal_id,
            } => self.on_reconnected(widget_id, terminal_id).await,
            SurfaceEvent::Closed { widget_id } => {
                if self.pool.remove(&widget_id).is_some() {
                    debug!(widget = %widget_id, "terminal surface closed; entry removed");
                }
            }
        }
    }

    /// Apply every event already queued. Returns how many were applied.
    pub async fn process_pending_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(event).await;
            applied += 1;
        }
        applied
    }

    /// Serve open requests and lifecycle events until both channels close.
    ///
    /// Events win over requests when both are ready.
    pub async fn run(mut self, mut requests: mpsc::Receiver<OpenRequest>) {
        info!("surface manager started");
        let mut events_open = true;
        let mut requests_open = true;

        while events_open || requests_open {
            tokio::select! {
                biased;

                event = self.events.recv(), if events_open => match event {
                    Some(event) => self.handle_event(event).await,
                    None => {
                        debug!("surface event channel closed");
                        events_open = false;
                    }
                },
                request = requests.recv(), if requests_open => match request {
                    Some(OpenRequest { options, reply }) => {
                        let result = self.open(options).await;
                        if reply.send(result).is_err() {
                            debug!("open requester went away before the reply");
                        }
                    }
                    None => {
                        debug!("open request channel closed");
                        requests_open = false;
                    }
                },
            }
        }

        info!("surface manager exiting");
    }

    fn find_reusable(&mut self, options: &OpenOptions) -> Option<WidgetId> {
        match options.panel_kind() {
            PanelKind::New => None,
            PanelKind::Dedicated => {
                let requested = options.task_config.as_ref()?;
                let terminals = &mut self.terminals;
                self.pool.find_dedicated(requested, self.comparator.as_ref(), |id| {
                    terminals.get_by_id(id).is_some()
                })
            }
            PanelKind::Shared => {
                let last_used = self.terminals.last_used();
                let terminals = &mut self.terminals;
                self.pool
                    .find_shared(last_used.as_deref(), |id| terminals.get_by_id(id).is_some())
            }
        }
    }

    fn reuse(&mut self, widget_id: &str, options: &OpenOptions) {
        if let Some(title) = &options.title {
            if let Some(surface) = self.terminals.get_by_id(widget_id) {
                surface.set_title(title);
            }
        }
        self.pool.claim(widget_id, options.task_id);
    }

    fn track_new(&mut self, widget_id: &str, options: &OpenOptions) {
        let entry = SurfaceEntry::attached(
            options.task_id,
            options.is_dedicated(),
            options.task_config.clone(),
        );
        self.pool.insert(widget_id.to_string(), entry);

        if let Some(surface) = self.terminals.get_by_id(widget_id) {
            surface.reset_terminal();
        }
    }

    fn on_task_exited(&mut self, task_id: TaskId) {
        let Some(widget_id) = self.pool.mark_task_exited(task_id) else {
            debug!(task_id, "exited task has no tracked surface");
            return;
        };

        if let Some(surface) = self.terminals.get_by_id(&widget_id) {
            surface.scroll_to_bottom();
            surface.write_line(REUSE_MESSAGE);
        }
        debug!(task_id, widget = %widget_id, "terminal surface is idle");
    }

    async fn on_reconnected(&mut self, widget_id: WidgetId, terminal_id: u32) {
        let tasks = match self.registry.get_tasks(self.context.clone()).await {
            Ok(tasks) => tasks,
            Err(err) => {
                // The surface may still host a running task; leave it untracked
                // so it is never handed out.
                warn!(widget = %widget_id, error = %err, "could not list running tasks; surface not tracked");
                return;
            }
        };

        if self.pool.contains(&widget_id) {
            return;
        }

        let entry = tasks
            .into_iter()
            .find(|info| info.terminal_id == Some(terminal_id))
            .map(|info| {
                let dedicated = info.config.panel() == Some(PanelKind::Dedicated);
                SurfaceEntry::attached(info.task_id, dedicated, Some(info.config))
            })
            .unwrap_or_else(SurfaceEntry::untracked);

        debug!(
            widget = %widget_id,
            terminal_id,
            task_id = ?entry.task_id,
            "tracking reconnected terminal surface"
        );
        self.pool.insert(widget_id, entry);
    }
}
