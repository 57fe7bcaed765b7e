use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use taskterm::errors::{Result, TaskTermError};
use taskterm::surface::{
    OpenOptions, ServiceFuture, TaskInfo, TaskRegistry, TerminalService, TerminalSurface, WidgetId,
};

/// Everything the fake terminal UI was asked to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCall {
    Created(WidgetId),
    Reset(WidgetId),
    Title(WidgetId, String),
    ScrolledToBottom(WidgetId),
    Wrote(WidgetId, String),
    Opened(WidgetId),
}

struct FakeSurface {
    id: WidgetId,
    calls: Arc<Mutex<Vec<SurfaceCall>>>,
}

impl FakeSurface {
    fn record(&self, call: SurfaceCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl TerminalSurface for FakeSurface {
    fn id(&self) -> &str {
        &self.id
    }

    fn scroll_to_bottom(&mut self) {
        self.record(SurfaceCall::ScrolledToBottom(self.id.clone()));
    }

    fn write_line(&mut self, text: &str) {
        self.record(SurfaceCall::Wrote(self.id.clone(), text.to_string()));
    }

    fn set_title(&mut self, title: &str) {
        self.record(SurfaceCall::Title(self.id.clone(), title.to_string()));
    }

    fn reset_terminal(&mut self) {
        self.record(SurfaceCall::Reset(self.id.clone()));
    }
}

/// In-memory terminal UI.
///
/// Surfaces are named `terminal-0`, `terminal-1`, ... in creation order.
#[derive(Default)]
pub struct FakeTerminalService {
    surfaces: HashMap<WidgetId, FakeSurface>,
    next_id: u32,
    last_used: Option<WidgetId>,
    fail_creation: bool,
    pub calls: Arc<Mutex<Vec<SurfaceCall>>>,
}

impl FakeTerminalService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `new_terminal` call fail.
    pub fn failing() -> Self {
        Self {
            fail_creation: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn set_last_used(&mut self, id: &str) {
        self.last_used = Some(id.to_string());
    }

    /// Dispose a surface without telling the manager.
    pub fn dispose(&mut self, id: &str) {
        self.surfaces.remove(id);
    }

    /// A surface that exists in the UI but was never created through this
    /// service, e.g. one restored after a reload.
    pub fn add_existing(&mut self, id: &str) {
        self.insert_surface(id.to_string());
    }

    pub fn created(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, SurfaceCall::Created(_)))
            .count()
    }

    fn insert_surface(&mut self, id: WidgetId) {
        let surface = FakeSurface {
            id: id.clone(),
            calls: Arc::clone(&self.calls),
        };
        self.surfaces.insert(id, surface);
    }
}

impl TerminalService for FakeTerminalService {
    fn new_terminal(&mut self, _options: OpenOptions) -> ServiceFuture<'_, Result<WidgetId>> {
        Box::pin(async move {
            if self.fail_creation {
                return Err(TaskTermError::Other(anyhow::anyhow!("terminal creation failed")));
            }
            let id = format!("terminal-{}", self.next_id);
            self.next_id += 1;
            self.insert_surface(id.clone());
            self.calls.lock().unwrap().push(SurfaceCall::Created(id.clone()));
            Ok(id)
        })
    }

    fn get_by_id(&mut self, id: &str) -> Option<&mut dyn TerminalSurface> {
        self.surfaces
            .get_mut(id)
            .map(|s| s as &mut dyn TerminalSurface)
    }

    fn open(&mut self, id: &str, _options: OpenOptions) -> ServiceFuture<'_, Result<()>> {
        let id = id.to_string();
        Box::pin(async move {
            self.calls.lock().unwrap().push(SurfaceCall::Opened(id.clone()));
            self.last_used = Some(id);
            Ok(())
        })
    }

    fn last_used(&self) -> Option<WidgetId> {
        self.last_used.clone()
    }
}

/// Task registry returning a fixed task list.
#[derive(Clone, Default)]
pub struct FakeRegistry {
    pub tasks: Arc<Mutex<Vec<TaskInfo>>>,
    pub queried_contexts: Arc<Mutex<Vec<Option<String>>>>,
    pub fail: bool,
}

impl FakeRegistry {
    pub fn with_tasks(tasks: Vec<TaskInfo>) -> Self {
        Self {
            tasks: Arc::new(Mutex::new(tasks)),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn queried_contexts(&self) -> Vec<Option<String>> {
        self.queried_contexts.lock().unwrap().clone()
    }
}

impl TaskRegistry for FakeRegistry {
    fn get_tasks(&self, context: Option<String>) -> ServiceFuture<'_, Result<Vec<TaskInfo>>> {
        Box::pin(async move {
            self.queried_contexts.lock().unwrap().push(context);
            if self.fail {
                return Err(TaskTermError::Other(anyhow::anyhow!("task server unavailable")));
            }
            Ok(self.tasks.lock().unwrap().clone())
        })
    }
}
