//! Safe path resolution for workspace operations
//!
//! Provides secure path resolution that prevents directory traversal attacks.

use std::io;
use std::path::{Component, Path, PathBuf};

use crate::constants::{
    ERR_PATH_CANONICALIZE, ERR_PATH_ESCAPE, ERR_PATH_INVALID_ROOT, ERR_PATH_NOT_FOUND,
};

/// Error type for path resolution failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// Path normalizes to a location outside the workspace root
    Escape,
    /// Path does not exist on the filesystem
    NotFound,
    /// Failed to canonicalize the path
    CanonicalizeFailed(String),
    /// The workspace root is not an absolute/canonical path
    InvalidRoot,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Escape => write!(f, "{}", ERR_PATH_ESCAPE),
            Self::NotFound => write!(f, "{}", ERR_PATH_NOT_FOUND),
            Self::CanonicalizeFailed(e) => write!(f, "{}: {}", ERR_PATH_CANONICALIZE, e),
            Self::InvalidRoot => write!(f, "{}", ERR_PATH_INVALID_ROOT),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for io::Error {
    fn from(e: PathError) -> Self {
        match e {
            PathError::Escape => io::Error::new(io::ErrorKind::PermissionDenied, e.to_string()),
            PathError::NotFound => io::Error::new(io::ErrorKind::NotFound, e.to_string()),
            PathError::CanonicalizeFailed(_) => io::Error::other(e.to_string()),
            PathError::InvalidRoot => io::Error::new(io::ErrorKind::InvalidInput, e.to_string()),
        }
    }
}

/// Safely resolve a relative path within the workspace root
///
/// Two layers of defense against directory traversal:
///
/// 1. **Lexical normalization**: `.` and `..` segments are resolved without
///    touching the filesystem. A `..` that would climb above the root fails
///    with `Escape`, as do absolute paths and Windows drive prefixes.
///    Interior `..` segments that stay inside the root are allowed
///    (`a/b/../c` resolves to `a/c`).
/// 2. **Canonicalization + prefix check**: the joined path is canonicalized
///    to resolve symlinks, then verified to still sit under the root.
///
/// # Arguments
///
/// * `workspace_root` - The workspace root. This **must** be an absolute,
///   canonical path (e.g., from `fs::canonicalize()`). The function returns
///   `InvalidRoot` if it is not absolute.
/// * `relative_path` - The client-supplied relative path to resolve
///
/// # Returns
///
/// The canonicalized absolute path. Empty input resolves to the root itself.
///
/// # Security
///
/// The caller is responsible for ensuring `workspace_root` is canonical.
/// While this function checks that it's absolute, it cannot verify
/// canonicalization. Always obtain `workspace_root` from `fs::canonicalize()`.
#[must_use = "path resolution result should be used"]
pub fn resolve_path(workspace_root: &Path, relative_path: &str) -> Result<PathBuf, PathError> {
    if !workspace_root.is_absolute() {
        return Err(PathError::InvalidRoot);
    }

    // Layer 1: Normalize components before touching the filesystem
    let normalized = normalize_components(relative_path)?;

    let candidate = workspace_root.join(&normalized);

    // Layer 2: Canonicalize to resolve symlinks and get absolute path
    let canonical = candidate.canonicalize().map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            PathError::NotFound
        } else {
            PathError::CanonicalizeFailed(e.to_string())
        }
    })?;

    // Verify the canonical path is still under the workspace root
    if !canonical.starts_with(workspace_root) {
        return Err(PathError::Escape);
    }

    Ok(canonical)
}

/// Lexically normalize a relative path, resolving `.` and `..` segments
///
/// Fails with `Escape` if the path is absolute, carries a Windows drive
/// prefix, or climbs above its starting point at any intermediate step.
fn normalize_components(path: &str) -> Result<PathBuf, PathError> {
    // Empty path refers to the root itself
    if path.is_empty() {
        return Ok(PathBuf::new());
    }

    let mut stack: Vec<&std::ffi::OsStr> = Vec::new();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(name) => stack.push(name),
            Component::CurDir => {}
            Component::ParentDir => {
                if stack.pop().is_none() {
                    return Err(PathError::Escape);
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(PathError::Escape);
            }
        }
    }

    Ok(stack.iter().collect())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn setup_workspace() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();

        std::fs::create_dir_all(root.join("alice/mnist/runs/run1")).unwrap();
        std::fs::write(root.join("alice/mnist/runs/run1/model.pt"), b"weights").unwrap();

        (temp_dir, root)
    }

    #[test]
    fn test_resolve_empty_path_is_root() {
        let (_temp, root) = setup_workspace();
        let resolved = resolve_path(&root, "").unwrap();
        assert_eq!(resolved, root);
    }

    #[test]
    fn test_resolve_valid_file() {
        let (_temp, root) = setup_workspace();
        let resolved = resolve_path(&root, "alice/mnist/runs/run1/model.pt").unwrap();
        assert_eq!(resolved, root.join("alice/mnist/runs/run1/model.pt"));
    }

    #[test]
    fn test_resolve_interior_parent_dir_allowed() {
        let (_temp, root) = setup_workspace();
        // Normalizes to alice/mnist/runs/run1, which stays inside the root
        let resolved = resolve_path(&root, "alice/mnist/runs/run2/../run1").unwrap();
        assert_eq!(resolved, root.join("alice/mnist/runs/run1"));
    }

    #[test]
    fn test_resolve_current_dir_segments() {
        let (_temp, root) = setup_workspace();
        let resolved = resolve_path(&root, "./alice/./mnist").unwrap();
        assert_eq!(resolved, root.join("alice/mnist"));
    }

    #[test]
    fn test_resolve_escaping_parent_dir_rejected() {
        let (_temp, root) = setup_workspace();
        assert_eq!(resolve_path(&root, "../etc/passwd"), Err(PathError::Escape));
        assert_eq!(
            resolve_path(&root, "alice/../../secret"),
            Err(PathError::Escape)
        );
    }

    #[test]
    fn test_resolve_absolute_path_rejected() {
        let (_temp, root) = setup_workspace();
        assert_eq!(resolve_path(&root, "/etc/passwd"), Err(PathError::Escape));
    }

    #[test]
    fn test_resolve_nonexistent_path() {
        let (_temp, root) = setup_workspace();
        assert_eq!(
            resolve_path(&root, "alice/mnist/runs/missing"),
            Err(PathError::NotFound)
        );
    }

    #[test]
    fn test_resolve_relative_root_rejected() {
        let result = resolve_path(Path::new("relative/root"), "file.txt");
        assert_eq!(result, Err(PathError::InvalidRoot));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_symlink_escape_rejected() {
        let (_temp, root) = setup_workspace();

        // Symlink inside the workspace pointing outside it
        let outside = TempDir::new().unwrap();
        std::fs::write(outside.path().join("secret.txt"), b"secret").unwrap();
        std::os::unix::fs::symlink(outside.path(), root.join("alice/escape")).unwrap();

        assert_eq!(
            resolve_path(&root, "alice/escape/secret.txt"),
            Err(PathError::Escape)
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_symlink_inside_workspace_allowed() {
        let (_temp, root) = setup_workspace();

        std::os::unix::fs::symlink(
            root.join("alice/mnist/runs/run1"),
            root.join("alice/latest"),
        )
        .unwrap();

        let resolved = resolve_path(&root, "alice/latest/model.pt").unwrap();
        assert_eq!(resolved, root.join("alice/mnist/runs/run1/model.pt"));
    }

    #[test]
    fn test_normalize_components() {
        assert_eq!(
            normalize_components("a/b/../c").unwrap(),
            PathBuf::from("a/c")
        );
        assert_eq!(normalize_components("a/..").unwrap(), PathBuf::new());
        assert_eq!(normalize_components("..between/a").unwrap(), PathBuf::from("..between/a"));
        assert_eq!(normalize_components(".."), Err(PathError::Escape));
    }
}
