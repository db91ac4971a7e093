//! Download preparation for deploy requests with method `download`

use std::path::{Path, PathBuf};

use crate::files::{PathError, resolve_path};

use super::DeployError;

/// A resolved source file ready to stream back to the requester
#[derive(Debug)]
pub struct DownloadSource {
    pub path: PathBuf,
    pub size: u64,
}

/// Resolve and validate a download source inside the workspace
///
/// No network I/O; the caller streams the file back over its own
/// connection. Directories are not downloadable.
pub fn prepare_download(
    workspace_root: &Path,
    relative_path: &str,
) -> Result<DownloadSource, DeployError> {
    let path = resolve_path(workspace_root, relative_path)?;

    let metadata = std::fs::metadata(&path)
        .map_err(|e| DeployError::Io(format!("failed to stat source file: {}", e)))?;
    if !metadata.is_file() {
        return Err(DeployError::Path(PathError::NotFound));
    }

    Ok(DownloadSource {
        path,
        size: metadata.len(),
    })
}
