//! Monitor process supervision
//!
//! Manages one external visualization process per project, keyed by project
//! name. A single registry lock serializes all start/stop/status calls,
//! including the spawn and terminate themselves.

mod launcher;
mod supervisor;

pub use launcher::{CommandLauncher, Launcher, MonitorHandle};
pub use supervisor::{MonitorStatus, ProcessSupervisor, StartOutcome, SupervisorError};
