//! Recursive directory tree construction for run browsing

use std::path::Path;

use berth_common::protocol::{TreeNode, TreeNodeKind};

/// Build a directory tree rooted at `path`
///
/// Entries are sorted by name at every level so identical filesystem state
/// always produces identical output. Subtrees that fail to read (permissions,
/// transient I/O) are omitted rather than failing the whole traversal; the
/// caller gets best-effort data. Entries with non-UTF-8 names are skipped.
///
/// `name` is the display name for the root node; its `path` is empty and
/// children carry paths relative to `path`.
pub fn build_tree(path: &Path, name: &str) -> TreeNode {
    TreeNode {
        name: name.to_string(),
        path: String::new(),
        kind: TreeNodeKind::Directory,
        children: Some(visit_dir(path, "")),
    }
}

/// Visit a directory, returning its children sorted by name
fn visit_dir(dir: &Path, rel_prefix: &str) -> Vec<TreeNode> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        // Unreadable subtree: omit it, don't abort the traversal
        Err(_) => return Vec::new(),
    };

    let mut names: Vec<String> = Vec::new();
    for entry in entries {
        let Ok(entry) = entry else {
            continue;
        };
        // Skip entries with non-UTF-8 names
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        names.push(name);
    }
    names.sort();

    let mut children = Vec::new();
    for name in names {
        let child_path = dir.join(&name);
        let rel = if rel_prefix.is_empty() {
            name.clone()
        } else {
            format!("{rel_prefix}/{name}")
        };

        let metadata = match child_path.metadata() {
            Ok(m) => m,
            Err(_) => continue,
        };

        if metadata.is_dir() {
            children.push(TreeNode {
                name,
                path: rel.clone(),
                kind: TreeNodeKind::Directory,
                children: Some(visit_dir(&child_path, &rel)),
            });
        } else {
            children.push(TreeNode {
                name,
                path: rel,
                kind: TreeNodeKind::File,
                children: None,
            });
        }
    }

    children
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_build_tree_sorted_and_recursive() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        std::fs::create_dir(root.join("logs")).unwrap();
        std::fs::write(root.join("logs/events.bin"), b"ev").unwrap();
        std::fs::write(root.join("model.pt"), b"weights").unwrap();
        std::fs::write(root.join("config.yaml"), b"lr: 0.01").unwrap();

        let tree = build_tree(root, "run1");
        assert_eq!(tree.name, "run1");
        assert_eq!(tree.kind, TreeNodeKind::Directory);

        let children = tree.children.as_ref().unwrap();
        let names: Vec<&str> = children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["config.yaml", "logs", "model.pt"]);

        let logs = &children[1];
        assert_eq!(logs.kind, TreeNodeKind::Directory);
        assert_eq!(logs.path, "logs");
        let log_children = logs.children.as_ref().unwrap();
        assert_eq!(log_children.len(), 1);
        assert_eq!(log_children[0].name, "events.bin");
        assert_eq!(log_children[0].path, "logs/events.bin");
        assert_eq!(log_children[0].kind, TreeNodeKind::File);
        assert!(log_children[0].children.is_none());
    }

    #[test]
    fn test_build_tree_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let tree = build_tree(temp_dir.path(), "empty");
        assert_eq!(tree.children.as_ref().unwrap().len(), 0);
    }

    #[test]
    fn test_build_tree_deterministic() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        std::fs::write(root.join("b.txt"), b"b").unwrap();
        std::fs::write(root.join("a.txt"), b"a").unwrap();
        std::fs::create_dir(root.join("c")).unwrap();

        let first = build_tree(root, "run");
        let second = build_tree(root, "run");
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_build_tree_unreadable_subtree_omitted() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let locked = root.join("locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::write(locked.join("hidden.txt"), b"x").unwrap();
        std::fs::write(root.join("visible.txt"), b"v").unwrap();

        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

        // Root bypasses permission bits; nothing to verify in that case
        if std::fs::read_dir(&locked).is_ok() {
            std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let tree = build_tree(root, "run");
        let children = tree.children.as_ref().unwrap();

        // Traversal still succeeds and the locked dir appears without contents
        let locked_node = children.iter().find(|c| c.name == "locked").unwrap();
        assert_eq!(locked_node.children.as_ref().unwrap().len(), 0);
        assert!(children.iter().any(|c| c.name == "visible.txt"));

        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
    }
}
