//! RunList message handler - lists the run directories of a project

use std::io;

use tokio::io::AsyncWrite;

use berth_common::protocol::ServerMessage;

use super::HandlerContext;
use crate::files::{PathError, resolve_path, runs_dir};

/// Handle a run list request
///
/// A project with no runs directory yet lists as empty rather than erroring;
/// experiment tooling creates the directory on first write.
pub async fn handle_run_list<W>(
    owner: String,
    project: String,
    ctx: &mut HandlerContext<'_, W>,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let relative = runs_dir(&owner, &project);
    let runs_path = match resolve_path(ctx.workspace_root, &relative) {
        Ok(path) => path,
        Err(PathError::NotFound) => {
            let response = ServerMessage::RunListResponse {
                success: true,
                error: None,
                kind: None,
                runs: Some(Vec::new()),
            };
            return ctx.send_message(&response).await;
        }
        Err(e) => {
            if ctx.debug {
                eprintln!("RunList from {} rejected: {}", ctx.peer_addr, e);
            }
            let kind = crate::deploy::DeployError::from(e.clone()).kind();
            let response = ServerMessage::RunListResponse {
                success: false,
                error: Some(e.to_string()),
                kind: Some(kind.as_str().to_string()),
                runs: None,
            };
            return ctx.send_message(&response).await;
        }
    };

    let mut runs: Vec<String> = Vec::new();
    let mut entries = tokio::fs::read_dir(&runs_path).await?;
    while let Some(entry) = entries.next_entry().await? {
        // Skip entries we can't stat and non-UTF-8 names
        let Ok(metadata) = tokio::fs::metadata(entry.path()).await else {
            continue;
        };
        if !metadata.is_dir() {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        runs.push(name);
    }
    runs.sort();

    let response = ServerMessage::RunListResponse {
        success: true,
        error: None,
        kind: None,
        runs: Some(runs),
    };
    ctx.send_message(&response).await
}
