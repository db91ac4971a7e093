//! Monitor process registry and lifecycle state machine

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::constants::{MONITOR_STOP_GRACE, MONITOR_STOP_POLL};

use super::launcher::{Launcher, MonitorHandle};

/// Error type for supervisor failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorError {
    /// The monitor executable could not be launched
    Spawn(String),
}

impl std::fmt::Display for SupervisorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spawn(e) => write!(f, "Failed to start monitor: {}", e),
        }
    }
}

impl std::error::Error for SupervisorError {}

/// Result of a successful start call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartOutcome {
    pub port: u16,
    /// True when a monitor for the project was already running and no
    /// process was spawned
    pub already_running: bool,
}

/// Status of a project's monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorStatus {
    Running { port: u16 },
    Absent,
}

/// A running monitor bound to its serving port
struct MonitorEntry {
    handle: Box<dyn MonitorHandle>,
    port: u16,
}

/// Supervises one monitor process per project
///
/// Every operation takes the registry lock for its full duration, spawn and
/// terminate included, so starts and stops serialize globally. Callers in
/// async context must use `spawn_blocking`: stop can block for the full
/// termination grace period.
pub struct ProcessSupervisor {
    registry: Mutex<HashMap<String, MonitorEntry>>,
    launcher: Box<dyn Launcher>,
    port: u16,
    stop_grace: Duration,
    stop_poll: Duration,
    debug: bool,
}

impl ProcessSupervisor {
    pub fn new(launcher: Box<dyn Launcher>, port: u16, debug: bool) -> Self {
        Self {
            registry: Mutex::new(HashMap::new()),
            launcher,
            port,
            stop_grace: MONITOR_STOP_GRACE,
            stop_poll: MONITOR_STOP_POLL,
            debug,
        }
    }

    #[cfg(test)]
    fn with_timeouts(mut self, stop_grace: Duration, stop_poll: Duration) -> Self {
        self.stop_grace = stop_grace;
        self.stop_poll = stop_poll;
        self
    }

    /// Start a monitor for `project` serving `log_dir`
    ///
    /// Idempotent: when a monitor for the project is already running, no
    /// second process is spawned and the existing binding is returned. A
    /// monitor that has exited on its own is replaced. On spawn failure the
    /// registry stays Absent for the project.
    pub fn start(&self, project: &str, log_dir: &Path) -> Result<StartOutcome, SupervisorError> {
        let mut registry = self.registry.lock().expect("monitor registry lock poisoned");

        if let Some(entry) = registry.get_mut(project) {
            if !entry.handle.has_exited() {
                return Ok(StartOutcome {
                    port: entry.port,
                    already_running: true,
                });
            }
            // Process died underneath us; drop the stale entry and respawn
            if self.debug {
                eprintln!(
                    "Monitor for {} (pid {}) exited, respawning",
                    project,
                    entry.handle.pid()
                );
            }
            registry.remove(project);
        }

        let handle = self
            .launcher
            .spawn(log_dir, self.port)
            .map_err(SupervisorError::Spawn)?;

        if self.debug {
            eprintln!(
                "Started monitor for {} (pid {}) on port {}",
                project,
                handle.pid(),
                self.port
            );
        }

        registry.insert(
            project.to_string(),
            MonitorEntry {
                handle,
                port: self.port,
            },
        );

        Ok(StartOutcome {
            port: self.port,
            already_running: false,
        })
    }

    /// Stop the monitor for `project`
    ///
    /// Returns true when a monitor was running and has been stopped, false
    /// when none was running. Termination escalates: polite signal first,
    /// then a forced kill after the grace period.
    pub fn stop(&self, project: &str) -> bool {
        let mut registry = self.registry.lock().expect("monitor registry lock poisoned");

        let Some(mut entry) = registry.remove(project) else {
            return false;
        };

        self.terminate_entry(project, &mut entry);
        true
    }

    /// Status for `project`; pure read, never mutates the registry
    pub fn status(&self, project: &str) -> MonitorStatus {
        let registry = self.registry.lock().expect("monitor registry lock poisoned");

        match registry.get(project) {
            Some(entry) => MonitorStatus::Running { port: entry.port },
            None => MonitorStatus::Absent,
        }
    }

    /// Stop every running monitor; used during server shutdown
    pub fn shutdown_all(&self) {
        let mut registry = self.registry.lock().expect("monitor registry lock poisoned");

        let entries: Vec<(String, MonitorEntry)> = registry.drain().collect();
        for (project, mut entry) in entries {
            self.terminate_entry(&project, &mut entry);
        }
    }

    fn terminate_entry(&self, project: &str, entry: &mut MonitorEntry) {
        let pid = entry.handle.pid();

        if let Err(e) = entry.handle.terminate() {
            if self.debug {
                eprintln!("Failed to signal monitor for {} (pid {}): {}", project, pid, e);
            }
            entry.handle.kill();
            return;
        }

        let deadline = Instant::now() + self.stop_grace;
        while Instant::now() < deadline {
            if entry.handle.has_exited() {
                if self.debug {
                    eprintln!("Stopped monitor for {} (pid {})", project, pid);
                }
                return;
            }
            std::thread::sleep(self.stop_poll);
        }

        // Grace period expired without exit
        if self.debug {
            eprintln!("Monitor for {} (pid {}) ignored termination, killing", project, pid);
        }
        entry.handle.kill();
    }
}
