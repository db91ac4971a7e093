//! Command-line argument parsing

use clap::Parser;
use berth_common::{DEFAULT_MONITOR_PORT, DEFAULT_PORT};
use std::net::IpAddr;
use std::path::PathBuf;

/// Get default workspace root help text for current platform
fn default_workspace_help() -> String {
    #[cfg(target_os = "linux")]
    return "Workspace root directory (default: ~/.local/share/berthd/workspace/)".to_string();

    #[cfg(target_os = "macos")]
    return "Workspace root directory (default: ~/Library/Application Support/berthd/workspace/)"
        .to_string();

    #[cfg(target_os = "windows")]
    return "Workspace root directory (default: %APPDATA%\\berthd\\workspace\\)".to_string();

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    return "Workspace root directory (overrides platform default)".to_string();
}

/// Berth Deployment Server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// IP address to bind to (IPv4 or IPv6)
    #[arg(short, long, default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Workspace root directory (overrides platform default)
    #[arg(short = 'w', long = "workspace-root", help = default_workspace_help())]
    pub workspace_root: Option<PathBuf>,

    /// Port monitor processes serve their dashboards on
    #[arg(long, default_value_t = DEFAULT_MONITOR_PORT)]
    pub monitor_port: u16,

    /// Command used to launch monitor processes
    #[arg(long, default_value = "tensorboard")]
    pub monitor_command: String,

    /// Enable debug logging (shows per-request processing messages)
    #[arg(long, default_value = "false")]
    pub debug: bool,
}
