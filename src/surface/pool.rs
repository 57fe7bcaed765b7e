// src/surface/pool.rs

//! Pure surface pool.
//!
//! The pool is a synchronous, deterministic table of the terminal surfaces the
//! manager has observed. It has no channels, no Tokio types and performs no
//! IO; surface existence is supplied by the caller as an `alive` predicate.
//!
//! Entries iterate in insertion order, so identical pool states always select
//! the same surface.

use indexmap::IndexMap;

use crate::task::TaskDescriptor;
use crate::types::TaskId;

use super::WidgetId;
use super::service::TaskComparator;

/// One tracked terminal surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceEntry {
    pub is_dedicated: bool,
    /// Task the surface last ran. `None` for a surface that was never
    /// attached to a known task.
    pub task_id: Option<TaskId>,
    /// Present for surfaces eligible for dedicated reuse.
    pub task_config: Option<TaskDescriptor>,
    pub is_idle: bool,
}

impl SurfaceEntry {
    /// Entry for a surface that is running `task_id` right now.
    pub fn attached(task_id: TaskId, is_dedicated: bool, task_config: Option<TaskDescriptor>) -> Self {
        Self {
            is_dedicated,
            task_id: Some(task_id),
            task_config,
            is_idle: false,
        }
    }

    /// Idle shared entry not linked to any task.
    pub fn untracked() -> Self {
        Self {
            is_dedicated: false,
            task_id: None,
            task_config: None,
            is_idle: true,
        }
    }
}

#[derive(Debug, Default)]
pub struct SurfacePool {
    entries: IndexMap<WidgetId, SurfaceEntry>,
}

impl SurfacePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, widget_id: &str) -> bool {
        self.entries.contains_key(widget_id)
    }

    pub fn get(&self, widget_id: &str) -> Option<&SurfaceEntry> {
        self.entries.get(widget_id)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&WidgetId, &SurfaceEntry)> {
        self.entries.iter()
    }

    /// Insert or replace an entry. A replaced entry keeps its position.
    pub fn insert(&mut self, widget_id: WidgetId, entry: SurfaceEntry) -> Option<SurfaceEntry> {
        self.entries.insert(widget_id, entry)
    }

    /// Forget a surface, preserving the order of the remaining entries.
    pub fn remove(&mut self, widget_id: &str) -> Option<SurfaceEntry> {
        self.entries.shift_remove(widget_id)
    }

    /// First idle dedicated surface that last ran a task equal to
    /// `requested`.
    pub fn find_dedicated(
        &self,
        requested: &TaskDescriptor,
        comparator: &dyn TaskComparator,
        mut alive: impl FnMut(&str) -> bool,
    ) -> Option<WidgetId> {
        self.entries
            .iter()
            .filter(|(id, _)| alive(id.as_str()))
            .find(|(_, entry)| {
                entry.is_dedicated
                    && entry.is_idle
                    && entry
                        .task_config
                        .as_ref()
                        .is_some_and(|config| comparator.compare_tasks(requested, config))
            })
            .map(|(id, _)| id.clone())
    }

    /// Idle non-dedicated surface, preferring `last_used` when it qualifies.
    pub fn find_shared(
        &self,
        last_used: Option<&str>,
        mut alive: impl FnMut(&str) -> bool,
    ) -> Option<WidgetId> {
        let available: Vec<&WidgetId> = self
            .entries
            .iter()
            .filter(|(id, _)| alive(id.as_str()))
            .filter(|(_, entry)| !entry.is_dedicated && entry.is_idle)
            .map(|(id, _)| id)
            .collect();

        available
            .iter()
            .find(|id| Some(id.as_str()) == last_used)
            .or_else(|| available.first())
            .map(|id| (*id).clone())
    }

    /// Attach a reused surface to a new task run.
    pub fn claim(&mut self, widget_id: &str, task_id: TaskId) -> bool {
        match self.entries.get_mut(widget_id) {
            Some(entry) => {
                entry.task_id = Some(task_id);
                entry.is_idle = false;
                true
            }
            None => false,
        }
    }

    /// Mark the surface that ran `task_id` as idle.
    ///
    /// Only the first matching entry changes; task ids are unique among live
    /// entries.
    pub fn mark_task_exited(&mut self, task_id: TaskId) -> Option<WidgetId> {
        let (widget_id, entry) = self
            .entries
            .iter_mut()
            .find(|(_, entry)| entry.task_id == Some(task_id))?;
        entry.is_idle = true;
        Some(widget_id.clone())
    }
}
