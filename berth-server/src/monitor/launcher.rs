//! Spawning and signaling of external monitor processes

use std::path::Path;
use std::process::{Child, Command, Stdio};

/// A handle to a spawned monitor process
///
/// Split out as a trait so supervisor tests can stand in fake processes and
/// count lifecycle calls.
pub trait MonitorHandle: Send {
    /// Ask the process to exit (SIGTERM on Unix)
    fn terminate(&mut self) -> Result<(), String>;

    /// Non-blocking check whether the process has exited
    fn has_exited(&mut self) -> bool;

    /// Force the process down (SIGKILL)
    fn kill(&mut self);

    /// OS process id, for logging
    fn pid(&self) -> u32;
}

/// Spawns monitor processes
pub trait Launcher: Send + Sync {
    /// Launch a monitor serving `log_dir` on `port`
    fn spawn(&self, log_dir: &Path, port: u16) -> Result<Box<dyn MonitorHandle>, String>;
}

/// Launches the configured monitor command (tensorboard by default)
pub struct CommandLauncher {
    command: String,
}

impl CommandLauncher {
    pub fn new(command: String) -> Self {
        Self { command }
    }
}

impl Launcher for CommandLauncher {
    fn spawn(&self, log_dir: &Path, port: u16) -> Result<Box<dyn MonitorHandle>, String> {
        let child = Command::new(&self.command)
            .arg("--logdir")
            .arg(log_dir)
            .arg("--port")
            .arg(port.to_string())
            .arg("--host")
            .arg("0.0.0.0")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| format!("failed to launch {}: {}", self.command, e))?;

        Ok(Box::new(ChildHandle { child }))
    }
}

/// Handle over a real OS child process
struct ChildHandle {
    child: Child,
}

impl MonitorHandle for ChildHandle {
    #[cfg(unix)]
    fn terminate(&mut self) -> Result<(), String> {
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        let pid = Pid::from_raw(self.child.id() as i32);
        kill(pid, Signal::SIGTERM).map_err(|e| format!("failed to signal process: {}", e))
    }

    #[cfg(not(unix))]
    fn terminate(&mut self) -> Result<(), String> {
        // No polite signal on this platform
        self.child
            .kill()
            .map_err(|e| format!("failed to kill process: {}", e))
    }

    fn has_exited(&mut self) -> bool {
        // try_wait errors mean the child is gone or unreachable
        !matches!(self.child.try_wait(), Ok(None))
    }

    fn kill(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }

    fn pid(&self) -> u32 {
        self.child.id()
    }
}
