//! MonitorStop message handler - best-effort process termination

use std::io;

use tokio::io::AsyncWrite;

use berth_common::protocol::ServerMessage;

use super::HandlerContext;

/// Handle a monitor stop request
///
/// Never fails: stopping a project with no running monitor reports
/// `stopped: false` rather than erroring.
pub async fn handle_monitor_stop<W>(
    project: String,
    ctx: &mut HandlerContext<'_, W>,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    // Termination waits out the grace period under the registry lock
    let supervisor = ctx.supervisor.clone();
    let project_key = project.clone();
    let stopped = tokio::task::spawn_blocking(move || supervisor.stop(&project_key))
        .await
        .map_err(io::Error::other)?;

    if ctx.debug && stopped {
        eprintln!(
            "Monitor stopped for {} (requested by {})",
            project, ctx.peer_addr
        );
    }

    ctx.send_message(&ServerMessage::MonitorStopResponse { stopped })
        .await
}
