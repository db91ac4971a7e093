//! Client connection handling

use std::io;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use tokio::io::BufReader;
use tokio::net::TcpStream;
use tokio_rustls::TlsAcceptor;

use berth_common::DeployErrorKind;
use berth_common::line::{DEFAULT_IDLE_TIMEOUT, LineError, LineReader};
use berth_common::protocol::ClientMessage;

use crate::constants::*;
use crate::handlers::{
    DeployRequest, HandlerContext, handle_deploy, handle_monitor_start,
    handle_monitor_status, handle_monitor_stop, handle_run_list, handle_run_tree,
};
use crate::monitor::ProcessSupervisor;

/// Parameters for handling a connection
pub struct ConnectionParams {
    pub peer_addr: SocketAddr,
    pub workspace_root: &'static Path,
    pub supervisor: Arc<ProcessSupervisor>,
    pub debug: bool,
}

/// Handle a client connection (always with TLS)
pub async fn handle_connection(
    socket: TcpStream,
    tls_acceptor: TlsAcceptor,
    params: ConnectionParams,
) -> io::Result<()> {
    let tls_stream = tls_acceptor
        .accept(socket)
        .await
        .map_err(|e| io::Error::other(format!("{}: {}", TLS_HANDSHAKE_FAILED_PREFIX, e)))?;

    handle_connection_inner(tls_stream, params).await
}

/// Inner connection handler that works with any AsyncRead + AsyncWrite stream
pub async fn handle_connection_inner<S>(socket: S, params: ConnectionParams) -> io::Result<()>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + 'static,
{
    let ConnectionParams {
        peer_addr,
        workspace_root,
        supervisor,
        debug,
    } = params;

    if debug {
        eprintln!("Connection from {}", peer_addr);
    }

    let (reader, mut writer) = tokio::io::split(socket);
    let mut line_reader = LineReader::new(BufReader::new(reader));

    loop {
        let message = match line_reader.read_client_message(DEFAULT_IDLE_TIMEOUT).await {
            Ok(Some(message)) => message,
            Ok(None) => {
                // Clean disconnect
                if debug {
                    eprintln!("Disconnect from {}", peer_addr);
                }
                return Ok(());
            }
            Err(LineError::Malformed(e)) => {
                // Unparseable request: tell the client, keep the connection
                let mut ctx = HandlerContext {
                    writer: &mut writer,
                    peer_addr,
                    workspace_root,
                    supervisor: supervisor.clone(),
                    debug,
                };
                ctx.send_error(&format!("Malformed request: {}", e), DeployErrorKind::Protocol)
                    .await?;
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let mut ctx = HandlerContext {
            writer: &mut writer,
            peer_addr,
            workspace_root,
            supervisor: supervisor.clone(),
            debug,
        };

        if let Err(e) = handle_client_message(message, &mut ctx).await {
            eprintln!("{}{}", ERR_HANDLING_MESSAGE, e);
            return Err(e);
        }
    }
}

/// Dispatch one parsed request to its handler
async fn handle_client_message<W>(
    message: ClientMessage,
    ctx: &mut HandlerContext<'_, W>,
) -> io::Result<()>
where
    W: tokio::io::AsyncWrite + Unpin,
{
    match message {
        ClientMessage::RunList { owner, project } => handle_run_list(owner, project, ctx).await,
        ClientMessage::RunTree {
            owner,
            project,
            run,
        } => handle_run_tree(owner, project, run, ctx).await,
        ClientMessage::Deploy {
            owner,
            file,
            method,
            host,
            port,
            username,
            password,
            remote_path,
        } => {
            let request = DeployRequest {
                owner,
                file,
                method,
                host,
                port,
                username,
                password,
                remote_path,
            };
            handle_deploy(request, ctx).await
        }
        ClientMessage::MonitorStart { owner, project } => {
            handle_monitor_start(owner, project, ctx).await
        }
        ClientMessage::MonitorStop { project } => handle_monitor_stop(project, ctx).await,
        ClientMessage::MonitorStatus { project } => handle_monitor_status(project, ctx).await,
    }
}
