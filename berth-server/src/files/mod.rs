//! Workspace filesystem layout and safe path handling
//!
//! The workspace holds experiment artifacts laid out as
//! `{root}/{owner}/{project}/runs/{run}/...`. All client-supplied paths are
//! resolved through `resolve_path()` before any filesystem access.

use std::path::{Path, PathBuf};

use crate::constants::{DATA_DIR_NAME, ERR_CREATE_WORKSPACE_DIR, ERR_NO_DATA_DIR, RUNS_DIR_NAME, WORKSPACE_DIR_NAME};

pub mod path;
pub mod tree;

pub use path::{PathError, resolve_path};
pub use tree::build_tree;

/// Get the default workspace root path for the platform
///
/// - **Linux**: `~/.local/share/berthd/workspace/`
/// - **macOS**: `~/Library/Application Support/berthd/workspace/`
/// - **Windows**: `%APPDATA%\berthd\workspace\`
///
/// # Errors
///
/// Returns an error if the platform's data directory cannot be determined.
pub fn default_workspace_root() -> Result<PathBuf, String> {
    let data_dir = dirs::data_dir().ok_or_else(|| ERR_NO_DATA_DIR.to_string())?;
    Ok(data_dir.join(DATA_DIR_NAME).join(WORKSPACE_DIR_NAME))
}

/// Initialize the workspace root directory
///
/// Uses `create_dir_all()` for idempotent creation. Owner and project
/// directories are created lazily by experiment tooling, not here.
///
/// # Errors
///
/// Returns an error if directory creation fails.
pub fn init_workspace(root: &Path) -> Result<(), String> {
    std::fs::create_dir_all(root)
        .map_err(|e| format!("{}{}: {}", ERR_CREATE_WORKSPACE_DIR, root.display(), e))?;
    Ok(())
}

/// Relative path to a project's runs directory within the workspace
pub fn runs_dir(owner: &str, project: &str) -> String {
    format!("{owner}/{project}/{RUNS_DIR_NAME}")
}

/// Relative path to a single run directory within the workspace
pub fn run_dir(owner: &str, project: &str, run: &str) -> String {
    format!("{owner}/{project}/{RUNS_DIR_NAME}/{run}")
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_init_workspace_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("workspace");

        assert!(!root.exists());
        init_workspace(&root).unwrap();
        assert!(root.exists());
    }

    #[test]
    fn test_init_workspace_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("workspace");

        init_workspace(&root).unwrap();
        init_workspace(&root).unwrap();

        assert!(root.exists());
    }

    #[test]
    fn test_runs_dir_layout() {
        assert_eq!(runs_dir("alice", "mnist"), "alice/mnist/runs");
        assert_eq!(run_dir("alice", "mnist", "run42"), "alice/mnist/runs/run42");
    }
}
