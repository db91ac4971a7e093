//! Deploy message handler - the gateway in front of the transfer engine
//!
//! Resolves the loosely-typed wire request into a `DeploySpec` exactly once,
//! confines the source file to the owner's workspace, then either streams
//! the file back (download) or runs the blocking upload off the async loop.

use std::io;
use std::path::PathBuf;

use tokio::io::{AsyncReadExt, AsyncWrite};

use berth_common::DOWNLOAD_CHUNK_SIZE;
use berth_common::protocol::{Secret, ServerMessage};
use berth_common::validators::validate_file_path;

use super::HandlerContext;
use crate::deploy::{
    DeployError, DeployFields, DeploySpec, execute_upload, prepare_download, resolve_spec,
};
use crate::files::resolve_path;

/// Wire-level fields of a deploy request, as received
pub struct DeployRequest {
    pub owner: String,
    pub file: String,
    pub method: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<Secret>,
    pub remote_path: Option<String>,
}

/// Handle a deploy request
pub async fn handle_deploy<W>(
    request: DeployRequest,
    ctx: &mut HandlerContext<'_, W>,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    // Method and field validation runs before any filesystem or network I/O
    let fields = DeployFields {
        host: request.host,
        port: request.port,
        username: request.username,
        password: request.password.map(Secret::reveal),
        remote_path: request.remote_path,
    };
    let spec = match resolve_spec(&request.method, fields) {
        Ok(spec) => spec,
        Err(e) => return send_failure(ctx, &e).await,
    };
    if let Err(e) = validate_file_path(&request.file) {
        return send_failure(ctx, &DeployError::InvalidRequest(e.to_string())).await;
    }

    // Confine the source file to the owner's own workspace before anything
    // touches it. The owner directory itself must resolve first so a crafted
    // file path cannot reach a sibling owner's runs.
    let owner_root = match resolve_path(ctx.workspace_root, &request.owner) {
        Ok(path) => path,
        Err(e) => return send_failure(ctx, &DeployError::from(e)).await,
    };

    match spec {
        DeploySpec::Download => {
            let source = match prepare_download(&owner_root, &request.file) {
                Ok(source) => source,
                Err(e) => return send_failure(ctx, &e).await,
            };

            if ctx.debug {
                eprintln!(
                    "Download of {} ({} bytes) for {}",
                    request.file, source.size, ctx.peer_addr
                );
            }

            let response = ServerMessage::DeployResponse {
                success: true,
                error: None,
                kind: None,
                detail: None,
                size: Some(source.size),
            };
            ctx.send_message(&response).await?;
            stream_file(ctx, source.path).await
        }
        spec @ (DeploySpec::Scp(_) | DeploySpec::Ftp(_)) => {
            let source = match resolve_path(&owner_root, &request.file) {
                Ok(path) => path,
                Err(e) => return send_failure(ctx, &DeployError::from(e)).await,
            };
            if !source.is_file() {
                let e = DeployError::from(crate::files::PathError::NotFound);
                return send_failure(ctx, &e).await;
            }

            // Blocking network I/O; run off the async loop so one slow
            // remote doesn't stall other connections
            let result =
                tokio::task::spawn_blocking(move || execute_upload(&spec, &source))
                    .await
                    .map_err(io::Error::other)?;

            match result {
                Ok(size) => {
                    if ctx.debug {
                        eprintln!(
                            "Deployed {} ({} bytes) for {}",
                            request.file, size, ctx.peer_addr
                        );
                    }
                    let response = ServerMessage::DeployResponse {
                        success: true,
                        error: None,
                        kind: None,
                        detail: Some(format!("transferred {} bytes", size)),
                        size: Some(size),
                    };
                    ctx.send_message(&response).await
                }
                Err(e) => send_failure(ctx, &e).await,
            }
        }
    }
}

/// Stream a resolved file to the client as base64 chunks plus a terminator
async fn stream_file<W>(ctx: &mut HandlerContext<'_, W>, path: PathBuf) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut file = tokio::fs::File::open(&path).await?;
    let mut buffer = vec![0u8; DOWNLOAD_CHUNK_SIZE];
    let mut sent: u64 = 0;

    loop {
        let n = file.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        ctx.send_message(&ServerMessage::file_data(&buffer[..n]))
            .await?;
        sent += n as u64;
    }

    ctx.send_message(&ServerMessage::FileEnd { size: sent }).await
}

/// Send a failed deploy response; detail strings never carry credentials
async fn send_failure<W>(ctx: &mut HandlerContext<'_, W>, error: &DeployError) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    if ctx.debug {
        eprintln!("Deploy from {} failed: {}", ctx.peer_addr, error);
    }
    let response = ServerMessage::DeployResponse {
        success: false,
        error: Some(error.to_string()),
        kind: Some(error.kind().as_str().to_string()),
        detail: None,
        size: None,
    };
    ctx.send_message(&response).await
}
