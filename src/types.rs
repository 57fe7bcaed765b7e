use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Numeric task id, unique within a session.
pub type TaskId = u64;

/// Operating system family a task is resolved for.
///
/// Selects which per-platform override block of a task descriptor applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Windows,
    Osx,
    Linux,
}

impl Platform {
    /// Platform of the running binary. Anything that is neither Windows nor
    /// macOS is treated as Linux.
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::Osx
        } else {
            Platform::Linux
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::Windows => "windows",
            Platform::Osx => "osx",
            Platform::Linux => "linux",
        };
        f.write_str(name)
    }
}

/// Where a task wants its terminal.
///
/// - `Shared`: reuse any idle, non-dedicated terminal (default).
/// - `Dedicated`: reuse only an idle terminal that last ran the same task.
/// - `New`: always create a fresh terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelKind {
    Shared,
    Dedicated,
    New,
}

impl Default for PanelKind {
    fn default() -> Self {
        PanelKind::Shared
    }
}

impl FromStr for PanelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "shared" => Ok(PanelKind::Shared),
            "dedicated" => Ok(PanelKind::Dedicated),
            "new" => Ok(PanelKind::New),
            other => Err(format!(
                "invalid panel: {other} (expected \"shared\", \"dedicated\" or \"new\")"
            )),
        }
    }
}

/// How task processes are spawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessBackend {
    /// Inside a pseudo-terminal (what an interactive terminal surface expects).
    Pty,
    /// Plain child process with piped stdio.
    Process,
}

impl Default for ProcessBackend {
    fn default() -> Self {
        ProcessBackend::Pty
    }
}

impl FromStr for ProcessBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pty" => Ok(ProcessBackend::Pty),
            "process" | "raw" => Ok(ProcessBackend::Process),
            other => Err(format!(
                "invalid backend: {other} (expected \"pty\" or \"process\")"
            )),
        }
    }
}
