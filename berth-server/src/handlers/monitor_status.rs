//! MonitorStatus message handler - pure registry read

use std::io;

use tokio::io::AsyncWrite;

use berth_common::protocol::ServerMessage;

use super::HandlerContext;
use crate::monitor::MonitorStatus;

/// Handle a monitor status request; never fails and never mutates
pub async fn handle_monitor_status<W>(
    project: String,
    ctx: &mut HandlerContext<'_, W>,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    // The read itself is cheap but the registry lock may be held by a stop
    let supervisor = ctx.supervisor.clone();
    let status = tokio::task::spawn_blocking(move || supervisor.status(&project))
        .await
        .map_err(io::Error::other)?;

    let response = match status {
        MonitorStatus::Running { port } => ServerMessage::MonitorStatusResponse {
            running: true,
            port: Some(port),
        },
        MonitorStatus::Absent => ServerMessage::MonitorStatusResponse {
            running: false,
            port: None,
        },
    };
    ctx.send_message(&response).await
}
