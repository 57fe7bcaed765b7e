// src/surface/mod.rs

//! Terminal surface reuse.
//!
//! Decides which terminal surface a task run is shown in:
//!
//! - `pool`: pure, ordered table of observed surfaces and the selection rules.
//! - `service`: traits for the terminal UI, the task registry and task
//!   equality.
//! - `manager`: async shell that owns the pool, applies lifecycle events and
//!   serves open requests.

pub mod manager;
pub mod pool;
pub mod service;

use crate::task::TaskDescriptor;
use crate::types::{PanelKind, TaskId};

pub use manager::{OpenRequest, SurfaceManager};
pub use pool::{SurfaceEntry, SurfacePool};
pub use service::{
    DescriptorComparator, ServiceFuture, TaskComparator, TaskInfo, TaskRegistry, TerminalService,
    TerminalSurface,
};

/// Identifier of a terminal surface.
pub type WidgetId = String;

/// Written to a surface when the task it ran has exited.
pub const REUSE_MESSAGE: &str = "\x1b[1m\n\rTerminal will be reused by tasks. \x1b[0m\n";

/// Lifecycle notifications delivered to the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// The task with this id has exited.
    TaskExited { task_id: TaskId },
    /// A surface reattached to a backend terminal, e.g. after a reload.
    Reconnected { widget_id: WidgetId, terminal_id: u32 },
    /// A surface was closed.
    Closed { widget_id: WidgetId },
}

/// Request to show a task run in a terminal surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenOptions {
    pub task_id: TaskId,
    pub panel: Option<PanelKind>,
    /// Required when `panel` is `Dedicated`.
    pub task_config: Option<TaskDescriptor>,
    pub title: Option<String>,
}

impl OpenOptions {
    pub fn new(task_id: TaskId) -> Self {
        Self {
            task_id,
            ..Self::default()
        }
    }

    pub fn with_panel(mut self, panel: PanelKind) -> Self {
        self.panel = Some(panel);
        self
    }

    pub fn with_task_config(mut self, config: TaskDescriptor) -> Self {
        self.task_config = Some(config);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Panel kind, `Shared` when absent.
    pub fn panel_kind(&self) -> PanelKind {
        self.panel.unwrap_or_default()
    }

    pub fn is_dedicated(&self) -> bool {
        self.panel_kind() == PanelKind::Dedicated
    }
}
