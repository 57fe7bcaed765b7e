// tests/runner_real_process.rs
#![cfg(unix)]

mod common;
use crate::common::builders::TaskDescriptorBuilder;
use crate::common::{init_tracing, with_timeout};

use std::error::Error;

use tokio::sync::mpsc;

use taskterm::errors::TaskTermError;
use taskterm::process::{ProcessFactory, PtyProcessFactory, RawProcessFactory, TerminalSize};
use taskterm::resolve::CommandResolver;
use taskterm::runner::{ProcessTaskRunner, RunningTask};
use taskterm::task::TaskDescriptor;

type TestResult = Result<(), Box<dyn Error>>;

fn runner<F: ProcessFactory>(factory: F, cwd: &std::path::Path) -> ProcessTaskRunner<F> {
    let resolver = CommandResolver::from_process_env().with_default_cwd(Some(cwd.to_path_buf()));
    ProcessTaskRunner::new(factory, resolver)
}

/// `/bin/sh -c <script>` as a shell task.
fn sh(label: &str, script: &str) -> TaskDescriptor {
    TaskDescriptorBuilder::shell(label, script)
        .shell_executable("/bin/sh")
        .shell_args(&["-c"])
        .build()
}

async fn collect_output(mut output: mpsc::Receiver<Vec<u8>>) -> String {
    let mut bytes = Vec::new();
    while let Some(chunk) = output.recv().await {
        bytes.extend_from_slice(&chunk);
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

async fn run_to_end(mut running: RunningTask) -> (Option<i32>, String) {
    let output = running.take_output().expect("output stream");
    let reader = tokio::spawn(collect_output(output));
    let code = running.wait_exit().await;
    drop(running);
    let text = reader.await.unwrap_or_default();
    (code, text)
}

#[tokio::test]
async fn raw_shell_task_reports_output_and_exit_code() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;

    let runner = runner(RawProcessFactory, dir.path());
    let running = runner.run(&sh("echo", "echo hello; exit 3"), None).await?;
    assert!(running.pid().is_some());

    let (code, text) = with_timeout(run_to_end(running)).await;
    assert_eq!(code, Some(3));
    assert!(text.contains("hello"), "output was: {text:?}");
    Ok(())
}

#[tokio::test]
async fn raw_process_task_gets_env_and_cwd() -> TestResult {
    let dir = tempfile::tempdir()?;
    let task = TaskDescriptorBuilder::process("env", "/bin/sh")
        .arg("-c")
        .arg("printf '%s:' \"$TASKTERM_TEST_VALUE\"; pwd")
        .env("TASKTERM_TEST_VALUE", "from-task")
        .build();

    let runner = runner(RawProcessFactory, dir.path());
    let running = runner.run(&task, None).await?;
    let (code, text) = with_timeout(run_to_end(running)).await;

    assert_eq!(code, Some(0));
    assert!(text.starts_with("from-task:"), "output was: {text:?}");
    let dir_name = dir.path().file_name().and_then(|n| n.to_str()).unwrap_or_default();
    assert!(text.contains(dir_name), "output was: {text:?}");
    Ok(())
}

#[tokio::test]
async fn raw_kill_stops_a_long_running_process() -> TestResult {
    let dir = tempfile::tempdir()?;
    let runner = runner(RawProcessFactory, dir.path());

    let mut running = runner.run(&sh("sleep", "sleep 30"), None).await?;
    running.kill()?;
    let code = with_timeout(running.wait_exit()).await;
    assert_eq!(code, None);
    Ok(())
}

#[tokio::test]
async fn raw_missing_executable_is_could_not_run() -> TestResult {
    let dir = tempfile::tempdir()?;
    let runner = runner(RawProcessFactory, dir.path());
    let task = TaskDescriptorBuilder::process("missing", "/definitely/not/a/binary").build();

    let err = runner.run(&task, None).await.unwrap_err();
    assert!(
        matches!(err, TaskTermError::CouldNotRun { code: Some(2), .. }),
        "unexpected error: {err:?}"
    );
    Ok(())
}

#[tokio::test]
async fn pty_shell_task_reports_output_and_exit_code() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;

    let runner = runner(PtyProcessFactory::new(TerminalSize::default()), dir.path());
    let running = runner.run(&sh("pty", "echo from-pty; exit 4"), None).await?;

    let (code, text) = with_timeout(run_to_end(running)).await;
    assert_eq!(code, Some(4));
    assert!(text.contains("from-pty"), "output was: {text:?}");
    Ok(())
}

#[tokio::test]
async fn pty_missing_executable_is_could_not_run() -> TestResult {
    let dir = tempfile::tempdir()?;
    let runner = runner(PtyProcessFactory::default(), dir.path());
    let task = TaskDescriptorBuilder::process("missing", "/definitely/not/a/binary").build();

    let err = runner.run(&task, None).await.unwrap_err();
    assert!(
        matches!(err, TaskTermError::CouldNotRun { .. }),
        "unexpected error: {err:?}"
    );
    Ok(())
}
