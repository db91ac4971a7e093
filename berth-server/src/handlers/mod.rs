//! Message handlers for client requests

mod deploy;
mod monitor_start;
mod monitor_status;
mod monitor_stop;
mod run_list;
mod run_tree;

pub use deploy::{DeployRequest, handle_deploy};
pub use monitor_start::handle_monitor_start;
pub use monitor_status::handle_monitor_status;
pub use monitor_stop::handle_monitor_stop;
pub use run_list::handle_run_list;
pub use run_tree::handle_run_tree;

use std::io;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use tokio::io::AsyncWrite;

use berth_common::DeployErrorKind;
use berth_common::line::send_server_message;
use berth_common::protocol::ServerMessage;

use crate::monitor::ProcessSupervisor;

/// Context passed to all handlers with shared resources
pub struct HandlerContext<'a, W> {
    pub writer: &'a mut W,
    pub peer_addr: SocketAddr,
    /// Canonical workspace root; all client paths resolve under it
    pub workspace_root: &'static Path,
    pub supervisor: Arc<ProcessSupervisor>,
    pub debug: bool,
}

impl<'a, W: AsyncWrite + Unpin> HandlerContext<'a, W> {
    /// Send a response message to the client
    pub async fn send_message(&mut self, message: &ServerMessage) -> io::Result<()> {
        send_server_message(self.writer, message).await
    }

    /// Send a protocol-level error without disconnecting
    pub async fn send_error(&mut self, message: &str, kind: DeployErrorKind) -> io::Result<()> {
        let error_msg = ServerMessage::Error {
            message: message.to_string(),
            kind: Some(kind.as_str().to_string()),
        };
        self.send_message(&error_msg).await
    }
}
