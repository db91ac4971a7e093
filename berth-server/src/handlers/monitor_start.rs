//! MonitorStart message handler - idempotent visualization process start

use std::io;

use tokio::io::AsyncWrite;

use berth_common::DeployErrorKind;
use berth_common::protocol::ServerMessage;

use super::HandlerContext;
use crate::deploy::DeployError;
use crate::files::{resolve_path, runs_dir};

/// Handle a monitor start request
///
/// The monitor serves the project's runs directory, which must exist; a
/// project that has never recorded a run has nothing to visualize.
pub async fn handle_monitor_start<W>(
    owner: String,
    project: String,
    ctx: &mut HandlerContext<'_, W>,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let relative = runs_dir(&owner, &project);
    let log_dir = match resolve_path(ctx.workspace_root, &relative) {
        Ok(path) => path,
        Err(e) => {
            if ctx.debug {
                eprintln!("MonitorStart from {} rejected: {}", ctx.peer_addr, e);
            }
            let kind = DeployError::from(e.clone()).kind();
            let response = ServerMessage::MonitorStartResponse {
                success: false,
                error: Some(e.to_string()),
                kind: Some(kind.as_str().to_string()),
                port: None,
                already_running: false,
            };
            return ctx.send_message(&response).await;
        }
    };

    // Supervisor calls serialize on one lock and a concurrent stop can hold
    // it for the full grace period; keep them off the async loop
    let supervisor = ctx.supervisor.clone();
    let project_key = project.clone();
    let result = tokio::task::spawn_blocking(move || supervisor.start(&project_key, &log_dir))
        .await
        .map_err(io::Error::other)?;

    let response = match result {
        Ok(outcome) => {
            if ctx.debug && !outcome.already_running {
                eprintln!(
                    "Monitor started for {} on port {} (requested by {})",
                    project, outcome.port, ctx.peer_addr
                );
            }
            ServerMessage::MonitorStartResponse {
                success: true,
                error: None,
                kind: None,
                port: Some(outcome.port),
                already_running: outcome.already_running,
            }
        }
        Err(e) => {
            eprintln!("Monitor start for {} failed: {}", project, e);
            ServerMessage::MonitorStartResponse {
                success: false,
                error: Some(e.to_string()),
                kind: Some(DeployErrorKind::Spawn.as_str().to_string()),
                port: None,
                already_running: false,
            }
        }
    };
    ctx.send_message(&response).await
}
