// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod logging;
pub mod process;
pub mod quoting;
pub mod resolve;
pub mod runner;
pub mod surface;
pub mod task;
pub mod types;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::errors::TaskTermError;
use crate::process::{ProcessFactory, PtyProcessFactory, RawProcessFactory};
use crate::resolve::CommandResolver;
use crate::runner::ProcessTaskRunner;
use crate::task::TaskDescriptor;
use crate::types::ProcessBackend;

/// How long to keep draining output after the process has exited.
const OUTPUT_DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the command resolver (default shell and cwd)
/// - the process task runner with the selected backend
/// - output forwarding and Ctrl-C handling
///
/// Returns the exit code the binary should exit with.
pub async fn run(args: CliArgs) -> Result<i32> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    let default_cwd = args
        .cwd
        .clone()
        .unwrap_or_else(|| config_root_dir(&config_path));
    let resolver = CommandResolver::from_process_env()
        .with_default_shell(cfg.config.shell.clone())
        .with_default_cwd(Some(default_cwd));

    if args.dry_run {
        print_dry_run(&cfg, &resolver, args.task.as_deref())?;
        return Ok(0);
    }

    let task = select_task(&cfg, args.task.as_deref())?;
    let backend = args.backend.unwrap_or(cfg.config.backend);
    info!(task = %task.label, ?backend, platform = %resolver.platform(), "running task");

    let code = match backend {
        ProcessBackend::Pty => {
            let factory = PtyProcessFactory::new(cfg.config.terminal_size());
            run_task(ProcessTaskRunner::new(factory, resolver), task).await?
        }
        ProcessBackend::Process => {
            run_task(ProcessTaskRunner::new(RawProcessFactory, resolver), task).await?
        }
    };

    Ok(code)
}

/// Run one task to completion, streaming its output to stdout.
async fn run_task<F: ProcessFactory>(runner: ProcessTaskRunner<F>, task: &TaskDescriptor) -> Result<i32> {
    let mut running = runner.run(task, None).await?;

    let forwarder = running.take_output().map(|mut output| {
        tokio::spawn(async move {
            let mut stdout = tokio::io::stdout();
            while let Some(chunk) = output.recv().await {
                stdout.write_all(&chunk).await?;
                stdout.flush().await?;
            }
            Ok::<_, std::io::Error>(())
        })
    });

    let code = tokio::select! {
        code = running.wait_exit() => code,
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!(error = %e, "failed to listen for Ctrl+C");
            }
            warn!(task = %running.label(), "interrupted; killing task");
            running.kill()?;
            running.wait_exit().await
        }
    };

    if let Some(forwarder) = forwarder {
        match tokio::time::timeout(OUTPUT_DRAIN_TIMEOUT, forwarder).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => warn!(error = %e, "failed to forward task output"),
            Ok(Err(e)) => warn!(error = %e, "output forwarder panicked"),
            Err(_) => debug!("output still open after exit; not waiting for it"),
        }
    }

    info!(task = %running.label(), task_id = running.id(), ?code, "task exited");
    Ok(code.unwrap_or(1))
}

/// Pick the task to run: the named one, or the only one.
fn select_task<'a>(cfg: &'a ConfigFile, name: Option<&str>) -> Result<&'a TaskDescriptor> {
    if let Some(name) = name {
        return Ok(cfg.task(name)?);
    }

    let mut tasks = cfg.task.values();
    match (tasks.next(), tasks.next()) {
        (Some(only), None) => Ok(only),
        _ => {
            let names: Vec<_> = cfg.task_names().collect();
            Err(TaskTermError::ConfigError(format!(
                "no task given; choose one of: {}",
                names.join(", ")
            ))
            .into())
        }
    }
}

/// Figure out the default working directory for tasks.
///
/// - If the config path has a non-empty parent (e.g. "configs/Taskterm.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Taskterm.toml" (parent = ""),
///   we fall back to the current working directory "."
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Dry-run output: print each task and the launch spec it resolves to.
fn print_dry_run(cfg: &ConfigFile, resolver: &CommandResolver, only: Option<&str>) -> Result<()> {
    println!("taskterm dry-run");
    println!("  platform = {}", resolver.platform());
    println!("  config.backend = {:?}", cfg.config.backend);
    if let Some(ref shell) = cfg.config.shell {
        println!("  config.shell = {shell}");
    }
    println!();

    let tasks: Vec<&TaskDescriptor> = match only {
        Some(name) => vec![cfg.task(name)?],
        None => cfg.task.values().collect(),
    };

    println!("tasks ({}):", tasks.len());
    for task in tasks {
        println!("  - {} ({:?})", task.label, task.task_type);
        match resolver.resolve(task) {
            Ok(spec) => {
                println!("      command: {}", spec.command);
                if !spec.args.is_empty() {
                    println!("      args: {:?}", spec.args);
                }
                println!("      cwd: {}", spec.options.cwd.display());
                if let Some(panel) = task.panel() {
                    println!("      panel: {panel:?}");
                }
            }
            Err(err) => println!("      error: {err}"),
        }
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}
