// tests/surface_manager.rs

mod common;
use crate::common::builders::TaskDescriptorBuilder;
use crate::common::fake_terminal::{FakeRegistry, FakeTerminalService, SurfaceCall};
use crate::common::{init_tracing, with_timeout};

use std::error::Error;

use tokio::sync::mpsc;

use taskterm::errors::TaskTermError;
use taskterm::surface::{
    OpenOptions, OpenRequest, REUSE_MESSAGE, SurfaceEntry, SurfaceEvent, SurfaceManager, TaskInfo,
};
use taskterm::task::TaskDescriptor;
use taskterm::types::PanelKind;

type TestResult = Result<(), Box<dyn Error>>;
type Manager = SurfaceManager<FakeTerminalService, FakeRegistry>;

fn manager() -> (Manager, mpsc::UnboundedSender<SurfaceEvent>) {
    manager_with(FakeTerminalService::new(), FakeRegistry::default())
}

fn manager_with(
    terminals: FakeTerminalService,
    registry: FakeRegistry,
) -> (Manager, mpsc::UnboundedSender<SurfaceEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SurfaceManager::new(terminals, registry, rx), tx)
}

fn task(label: &str) -> TaskDescriptor {
    TaskDescriptorBuilder::shell(label, "make").build()
}

fn dedicated(task_id: u64, config: TaskDescriptor) -> OpenOptions {
    OpenOptions::new(task_id)
        .with_panel(PanelKind::Dedicated)
        .with_task_config(config)
}

#[tokio::test]
async fn first_open_creates_and_resets_a_surface() -> TestResult {
    init_tracing();
    let (mut manager, _events) = manager();

    let id = manager.open(OpenOptions::new(1)).await?;

    assert_eq!(id, "terminal-0");
    assert_eq!(
        manager.terminals().calls(),
        vec![
            SurfaceCall::Created(id.clone()),
            SurfaceCall::Reset(id.clone()),
            SurfaceCall::Opened(id.clone()),
        ]
    );
    assert_eq!(
        manager.pool().get(&id),
        Some(&SurfaceEntry::attached(1, false, None))
    );
    Ok(())
}

#[tokio::test]
async fn busy_shared_surface_is_not_reused() -> TestResult {
    let (mut manager, _events) = manager();

    let first = manager.open(OpenOptions::new(1)).await?;
    let second = manager.open(OpenOptions::new(2)).await?;

    assert_ne!(first, second);
    assert_eq!(manager.pool().len(), 2);
    Ok(())
}

#[tokio::test]
async fn idle_shared_surface_is_reused_after_exit() -> TestResult {
    let (mut manager, events) = manager();

    let first = manager.open(OpenOptions::new(1)).await?;
    events.send(SurfaceEvent::TaskExited { task_id: 1 })?;
    assert_eq!(manager.process_pending_events().await, 1);
    manager.terminals().clear_calls();

    let second = manager.open(OpenOptions::new(2).with_title("Task: build")).await?;

    assert_eq!(first, second);
    assert_eq!(
        manager.terminals().calls(),
        vec![
            SurfaceCall::Title(first.clone(), "Task: build".to_string()),
            SurfaceCall::Opened(first.clone()),
        ]
    );
    let entry = manager.pool().get(&first).ok_or("entry missing")?;
    assert_eq!(entry.task_id, Some(2));
    assert!(!entry.is_idle);
    Ok(())
}

#[tokio::test]
async fn exit_writes_reuse_marker() -> TestResult {
    let (mut manager, _events) = manager();
    let id = manager.open(OpenOptions::new(7)).await?;
    manager.terminals().clear_calls();

    manager.handle_event(SurfaceEvent::TaskExited { task_id: 7 }).await;

    assert_eq!(
        manager.terminals().calls(),
        vec![
            SurfaceCall::ScrolledToBottom(id.clone()),
            SurfaceCall::Wrote(id.clone(), REUSE_MESSAGE.to_string()),
        ]
    );
    assert!(manager.pool().get(&id).ok_or("entry missing")?.is_idle);
    Ok(())
}

#[tokio::test]
async fn shared_open_prefers_last_used_surface() -> TestResult {
    let (mut manager, events) = manager();

    let a = manager.open(OpenOptions::new(1)).await?;
    let b = manager.open(OpenOptions::new(2)).await?;
    events.send(SurfaceEvent::TaskExited { task_id: 1 })?;
    events.send(SurfaceEvent::TaskExited { task_id: 2 })?;

    manager.terminals_mut().set_last_used(&b);
    assert_eq!(manager.open(OpenOptions::new(3)).await?, b);

    // Last used is now busy, so the first idle one in insertion order wins.
    assert_eq!(manager.open(OpenOptions::new(4)).await?, a);
    Ok(())
}

#[tokio::test]
async fn dedicated_open_without_config_fails() {
    let (mut manager, _events) = manager();

    let err = manager
        .open(OpenOptions::new(1).with_panel(PanelKind::Dedicated))
        .await
        .unwrap_err();

    assert!(matches!(err, TaskTermError::MissingTaskConfig));
    assert_eq!(manager.terminals().created(), 0);
}

#[tokio::test]
async fn dedicated_reuse_requires_matching_task() -> TestResult {
    let (mut manager, events) = manager();

    let build = manager.open(dedicated(1, task("build"))).await?;
    events.send(SurfaceEvent::TaskExited { task_id: 1 })?;

    let test = manager.open(dedicated(2, task("test"))).await?;
    assert_ne!(build, test);

    let build_again = manager.open(dedicated(3, task("build"))).await?;
    assert_eq!(build, build_again);
    Ok(())
}

#[tokio::test]
async fn dedicated_picks_earliest_matching_entry() -> TestResult {
    let (mut manager, events) = manager();

    let first = manager.open(dedicated(1, task("build"))).await?;
    let second = manager.open(dedicated(2, task("build"))).await?;
    events.send(SurfaceEvent::TaskExited { task_id: 2 })?;
    events.send(SurfaceEvent::TaskExited { task_id: 1 })?;

    manager.terminals_mut().set_last_used(&second);
    assert_eq!(manager.open(dedicated(3, task("build"))).await?, first);
    Ok(())
}

#[tokio::test]
async fn dedicated_and_shared_pools_do_not_mix() -> TestResult {
    let (mut manager, events) = manager();

    let dedicated_id = manager.open(dedicated(1, task("build"))).await?;
    events.send(SurfaceEvent::TaskExited { task_id: 1 })?;

    let shared = manager.open(OpenOptions::new(2)).await?;
    assert_ne!(dedicated_id, shared);
    Ok(())
}

#[tokio::test]
async fn new_panel_always_creates() -> TestResult {
    let (mut manager, events) = manager();

    let first = manager.open(OpenOptions::new(1)).await?;
    events.send(SurfaceEvent::TaskExited { task_id: 1 })?;

    let fresh = manager
        .open(OpenOptions::new(2).with_panel(PanelKind::New))
        .await?;
    assert_ne!(first, fresh);
    assert_eq!(manager.terminals().created(), 2);
    Ok(())
}

#[tokio::test]
async fn exit_marks_exactly_one_entry() -> TestResult {
    let (mut manager, events) = manager();
    manager.terminals_mut().add_existing("restored");
    events.send(SurfaceEvent::Reconnected {
        widget_id: "restored".to_string(),
        terminal_id: 99,
    })?;

    let a = manager.open(OpenOptions::new(5).with_panel(PanelKind::New)).await?;
    let b = manager.open(OpenOptions::new(6).with_panel(PanelKind::New)).await?;
    manager.handle_event(SurfaceEvent::TaskExited { task_id: 5 }).await;

    let idle: Vec<_> = manager
        .pool()
        .iter()
        .filter(|(_, e)| e.is_idle && e.task_id.is_some())
        .map(|(id, _)| id.clone())
        .collect();
    assert_eq!(idle, vec![a]);
    assert!(!manager.pool().get(&b).ok_or("entry missing")?.is_idle);
    Ok(())
}

#[tokio::test]
async fn closed_surface_is_never_selected_again() -> TestResult {
    let (mut manager, events) = manager();

    let first = manager.open(OpenOptions::new(1)).await?;
    events.send(SurfaceEvent::TaskExited { task_id: 1 })?;
    events.send(SurfaceEvent::Closed {
        widget_id: first.clone(),
    })?;
    manager.terminals_mut().dispose(&first);

    let second = manager.open(OpenOptions::new(2)).await?;
    assert_ne!(first, second);
    assert!(!manager.pool().contains(&first));
    Ok(())
}

#[tokio::test]
async fn disposed_surface_is_skipped_even_if_tracked() -> TestResult {
    let (mut manager, events) = manager();

    let first = manager.open(OpenOptions::new(1)).await?;
    events.send(SurfaceEvent::TaskExited { task_id: 1 })?;
    manager.terminals_mut().dispose(&first);

    let second = manager.open(OpenOptions::new(2)).await?;
    assert_ne!(first, second);
    Ok(())
}

#[tokio::test]
async fn reconnection_seeds_entry_from_running_task() -> TestResult {
    let registry = FakeRegistry::with_tasks(vec![
        TaskInfo {
            task_id: 10,
            terminal_id: Some(3),
            config: TaskDescriptorBuilder::shell("other", "true").build(),
        },
        TaskInfo {
            task_id: 11,
            terminal_id: Some(4),
            config: TaskDescriptorBuilder::shell("watch", "npm run watch")
                .panel(PanelKind::Dedicated)
                .build(),
        },
    ]);
    let mut terminals = FakeTerminalService::new();
    terminals.add_existing("restored");
    let (manager, _events) = manager_with(terminals, registry.clone());
    let mut manager = manager.with_context(Some("file:///ws".to_string()));

    manager
        .handle_event(SurfaceEvent::Reconnected {
            widget_id: "restored".to_string(),
            terminal_id: 4,
        })
        .await;

    let entry = manager.pool().get("restored").ok_or("entry missing")?;
    assert_eq!(entry.task_id, Some(11));
    assert!(entry.is_dedicated);
    assert!(!entry.is_idle);
    assert_eq!(registry.queried_contexts(), vec![Some("file:///ws".to_string())]);
    Ok(())
}

#[tokio::test]
async fn reconnection_without_matching_task_is_idle_and_reusable() -> TestResult {
    let mut terminals = FakeTerminalService::new();
    terminals.add_existing("restored");
    let (mut manager, events) = manager_with(terminals, FakeRegistry::default());

    events.send(SurfaceEvent::Reconnected {
        widget_id: "restored".to_string(),
        terminal_id: 1,
    })?;
    let id = manager.open(OpenOptions::new(1)).await?;

    assert_eq!(id, "restored");
    assert_eq!(manager.terminals().created(), 0);
    Ok(())
}

#[tokio::test]
async fn reconnection_of_tracked_surface_is_ignored() -> TestResult {
    let (mut manager, _events) = manager();
    let id = manager.open(OpenOptions::new(1)).await?;

    manager
        .handle_event(SurfaceEvent::Reconnected {
            widget_id: id.clone(),
            terminal_id: 1,
        })
        .await;

    assert_eq!(
        manager.pool().get(&id),
        Some(&SurfaceEntry::attached(1, false, None))
    );
    Ok(())
}

#[tokio::test]
async fn registry_failure_leaves_reconnected_surface_unused() -> TestResult {
    let mut terminals = FakeTerminalService::new();
    terminals.add_existing("restored");
    terminals.set_last_used("restored");
    let (mut manager, _events) = manager_with(terminals, FakeRegistry::failing());

    manager
        .handle_event(SurfaceEvent::Reconnected {
            widget_id: "restored".to_string(),
            terminal_id: 1,
        })
        .await;

    assert!(!manager.pool().contains("restored"));

    let id = manager.open(OpenOptions::new(99)).await?;
    assert_eq!(id, "terminal-0");
    assert_eq!(manager.terminals().created(), 1);
    assert!(!manager.pool().contains("restored"));
    Ok(())
}

#[tokio::test]
async fn creation_failure_is_returned_and_nothing_is_tracked() {
    let (mut manager, _events) = manager_with(FakeTerminalService::failing(), FakeRegistry::default());

    let err = manager.open(OpenOptions::new(1)).await.unwrap_err();
    assert!(!err.is_config_error());
    assert!(manager.pool().is_empty());
}

#[tokio::test]
async fn actor_loop_serves_requests_and_events() -> TestResult {
    init_tracing();
    let (manager, events) = manager();
    let (requests, requests_rx) = mpsc::channel(8);
    let handle = tokio::spawn(manager.run(requests_rx));

    let (request, reply) = OpenRequest::new(OpenOptions::new(1));
    requests.send(request).await?;
    let first = with_timeout(reply).await??;

    events.send(SurfaceEvent::TaskExited { task_id: 1 })?;

    let (request, reply) = OpenRequest::new(OpenOptions::new(2));
    requests.send(request).await?;
    let second = with_timeout(reply).await??;
    assert_eq!(first, second);

    drop(requests);
    drop(events);
    with_timeout(handle).await?;
    Ok(())
}
