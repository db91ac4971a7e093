//! RunTree message handler - recursive directory snapshot of one run

use std::io;

use tokio::io::AsyncWrite;

use berth_common::protocol::ServerMessage;

use super::HandlerContext;
use crate::deploy::DeployError;
use crate::files::{build_tree, resolve_path, run_dir};

/// Handle a run tree request
pub async fn handle_run_tree<W>(
    owner: String,
    project: String,
    run: String,
    ctx: &mut HandlerContext<'_, W>,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let relative = run_dir(&owner, &project, &run);
    let run_path = match resolve_path(ctx.workspace_root, &relative) {
        Ok(path) => path,
        Err(e) => {
            if ctx.debug {
                eprintln!("RunTree from {} rejected: {}", ctx.peer_addr, e);
            }
            let kind = DeployError::from(e.clone()).kind();
            let response = ServerMessage::RunTreeResponse {
                success: false,
                error: Some(e.to_string()),
                kind: Some(kind.as_str().to_string()),
                tree: None,
            };
            return ctx.send_message(&response).await;
        }
    };

    // Traversal is best effort and bounded by run directory sizes; running
    // it off the async thread keeps slow disks from stalling the connection
    let run_name = run.clone();
    let tree = tokio::task::spawn_blocking(move || build_tree(&run_path, &run_name))
        .await
        .map_err(io::Error::other)?;

    let response = ServerMessage::RunTreeResponse {
        success: true,
        error: None,
        kind: None,
        tree: Some(tree),
    };
    ctx.send_message(&response).await
}
