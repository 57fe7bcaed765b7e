// src/surface/service.rs

//! Collaborators the surface manager talks to.
//!
//! Terminals are owned by the UI layer. The manager only keeps their ids and
//! looks them up through [`TerminalService::get_by_id`] before each use.

use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;
use crate::task::TaskDescriptor;
use crate::types::TaskId;

use super::{OpenOptions, WidgetId};

/// Boxed future returned by the async collaborator methods.
pub type ServiceFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A terminal widget, as far as task reuse needs it.
pub trait TerminalSurface {
    fn id(&self) -> &str;
    fn scroll_to_bottom(&mut self);
    fn write_line(&mut self, text: &str);
    fn set_title(&mut self, title: &str);
    fn reset_terminal(&mut self);
}

/// Creates, finds and shows terminal surfaces.
pub trait TerminalService: Send {
    /// Create a fresh surface for a task run.
    fn new_terminal(&mut self, options: OpenOptions) -> ServiceFuture<'_, Result<WidgetId>>;

    /// Surface with this id, if it is still open.
    fn get_by_id(&mut self, id: &str) -> Option<&mut dyn TerminalSurface>;

    /// Attach and reveal a surface.
    fn open(&mut self, id: &str, options: OpenOptions) -> ServiceFuture<'_, Result<()>>;

    /// Surface the user interacted with most recently.
    fn last_used(&self) -> Option<WidgetId>;
}

/// A task known to the task server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInfo {
    pub task_id: TaskId,
    /// Backend terminal the task runs in, if any.
    pub terminal_id: Option<u32>,
    pub config: TaskDescriptor,
}

/// Lists the tasks that are currently running.
pub trait TaskRegistry: Send {
    /// Tasks for a workspace context (`None` for all).
    fn get_tasks(&self, context: Option<String>) -> ServiceFuture<'_, Result<Vec<TaskInfo>>>;
}

/// Decides whether two descriptors describe the same task.
pub trait TaskComparator: Send + Sync {
    fn compare_tasks(&self, a: &TaskDescriptor, b: &TaskDescriptor) -> bool;
}

/// Same task type and same label.
#[derive(Debug, Clone, Copy, Default)]
pub struct DescriptorComparator;

impl TaskComparator for DescriptorComparator {
    fn compare_tasks(&self, a: &TaskDescriptor, b: &TaskDescriptor) -> bool {
        a.task_type == b.task_type && a.label == b.label
    }
}
