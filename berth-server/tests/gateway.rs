//! Integration tests for the deployment gateway protocol
//!
//! Drives `handle_connection_inner` over an in-memory duplex stream and
//! asserts on the JSON line responses, end to end minus TLS.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;
use tokio::io::BufReader;

use berth_common::line::{DEFAULT_IDLE_TIMEOUT, LineReader, send_client_message};
use berth_common::protocol::{ClientMessage, Secret, ServerMessage, TreeNodeKind, decode_file_data};
use berth_server::connection::{ConnectionParams, handle_connection_inner};
use berth_server::monitor::{CommandLauncher, ProcessSupervisor};

// ============================================================================
// Helper Functions
// ============================================================================

/// Create a workspace with one owner, one project, and one run
fn create_test_workspace() -> (TempDir, &'static Path) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path().canonicalize().unwrap();

    std::fs::create_dir_all(root.join("alice/mnist/runs/run1/logs")).unwrap();
    std::fs::create_dir_all(root.join("alice/mnist/runs/run2")).unwrap();
    std::fs::create_dir_all(root.join("bob/secret-project/runs")).unwrap();
    std::fs::write(root.join("alice/mnist/runs/run1/model.pt"), b"model weights").unwrap();
    std::fs::write(root.join("alice/mnist/runs/run1/logs/events.bin"), vec![7u8; 4096]).unwrap();
    std::fs::write(root.join("bob/secret-project/runs/secret.txt"), b"secret").unwrap();

    let leaked: &'static Path = Box::leak(root.into_boxed_path());
    (temp_dir, leaked)
}

struct TestClient {
    reader: LineReader<BufReader<tokio::io::ReadHalf<tokio::io::DuplexStream>>>,
    writer: tokio::io::WriteHalf<tokio::io::DuplexStream>,
}

impl TestClient {
    async fn send(&mut self, message: &ClientMessage) {
        send_client_message(&mut self.writer, message).await.unwrap();
    }

    async fn recv(&mut self) -> ServerMessage {
        self.reader
            .read_server_message(DEFAULT_IDLE_TIMEOUT)
            .await
            .unwrap()
            .expect("server closed the connection")
    }
}

/// Spawn a connection handler over a duplex stream and return a client for it
fn connect(workspace_root: &'static Path) -> TestClient {
    let supervisor = Arc::new(ProcessSupervisor::new(
        Box::new(CommandLauncher::new("/nonexistent/berth-monitor".to_string())),
        6006,
        false,
    ));

    let (client_side, server_side) = tokio::io::duplex(64 * 1024);
    let params = ConnectionParams {
        peer_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 54321),
        workspace_root,
        supervisor,
        debug: false,
    };
    tokio::spawn(async move {
        let _ = handle_connection_inner(server_side, params).await;
    });

    let (reader, writer) = tokio::io::split(client_side);
    TestClient {
        reader: LineReader::new(BufReader::new(reader)),
        writer,
    }
}

// ============================================================================
// Run Listing Tests
// ============================================================================

#[tokio::test]
async fn test_run_list() {
    let (_temp, root) = create_test_workspace();
    let mut client = connect(root);

    client
        .send(&ClientMessage::RunList {
            owner: "alice".to_string(),
            project: "mnist".to_string(),
        })
        .await;

    match client.recv().await {
        ServerMessage::RunListResponse { success, runs, .. } => {
            assert!(success);
            assert_eq!(runs.unwrap(), vec!["run1", "run2"]);
        }
        other => panic!("unexpected response: {:?}", other),
    }
}

#[tokio::test]
async fn test_run_list_unknown_project_is_empty() {
    let (_temp, root) = create_test_workspace();
    let mut client = connect(root);

    client
        .send(&ClientMessage::RunList {
            owner: "alice".to_string(),
            project: "does-not-exist".to_string(),
        })
        .await;

    match client.recv().await {
        ServerMessage::RunListResponse { success, runs, .. } => {
            assert!(success);
            assert!(runs.unwrap().is_empty());
        }
        other => panic!("unexpected response: {:?}", other),
    }
}

// ============================================================================
// Run Tree Tests
// ============================================================================

#[tokio::test]
async fn test_run_tree() {
    let (_temp, root) = create_test_workspace();
    let mut client = connect(root);

    client
        .send(&ClientMessage::RunTree {
            owner: "alice".to_string(),
            project: "mnist".to_string(),
            run: "run1".to_string(),
        })
        .await;

    match client.recv().await {
        ServerMessage::RunTreeResponse { success, tree, .. } => {
            assert!(success);
            let tree = tree.unwrap();
            assert_eq!(tree.name, "run1");
            let children = tree.children.unwrap();
            let names: Vec<&str> = children.iter().map(|c| c.name.as_str()).collect();
            assert_eq!(names, vec!["logs", "model.pt"]);
            assert_eq!(children[0].kind, TreeNodeKind::Directory);
            assert_eq!(children[1].kind, TreeNodeKind::File);
        }
        other => panic!("unexpected response: {:?}", other),
    }
}

#[tokio::test]
async fn test_run_tree_missing_run() {
    let (_temp, root) = create_test_workspace();
    let mut client = connect(root);

    client
        .send(&ClientMessage::RunTree {
            owner: "alice".to_string(),
            project: "mnist".to_string(),
            run: "run99".to_string(),
        })
        .await;

    match client.recv().await {
        ServerMessage::RunTreeResponse { success, kind, .. } => {
            assert!(!success);
            assert_eq!(kind.as_deref(), Some("not_found"));
        }
        other => panic!("unexpected response: {:?}", other),
    }
}

// ============================================================================
// Download Tests
// ============================================================================

fn deploy_download(file: &str) -> ClientMessage {
    ClientMessage::Deploy {
        owner: "alice".to_string(),
        file: file.to_string(),
        method: "download".to_string(),
        host: None,
        port: None,
        username: None,
        password: None,
        remote_path: None,
    }
}

#[tokio::test]
async fn test_download_streams_identical_bytes() {
    let (_temp, root) = create_test_workspace();
    let mut client = connect(root);

    client
        .send(&deploy_download("mnist/runs/run1/logs/events.bin"))
        .await;

    let expected_size = 4096u64;
    match client.recv().await {
        ServerMessage::DeployResponse { success, size, .. } => {
            assert!(success);
            assert_eq!(size, Some(expected_size));
        }
        other => panic!("unexpected response: {:?}", other),
    }

    let mut received = Vec::new();
    loop {
        match client.recv().await {
            ServerMessage::FileData { data } => {
                received.extend(decode_file_data(&data).unwrap());
            }
            ServerMessage::FileEnd { size } => {
                assert_eq!(size, expected_size);
                break;
            }
            other => panic!("unexpected message mid-stream: {:?}", other),
        }
    }
    assert_eq!(received, vec![7u8; 4096]);
}

#[tokio::test]
async fn test_download_missing_file() {
    let (_temp, root) = create_test_workspace();
    let mut client = connect(root);

    client.send(&deploy_download("mnist/runs/run1/missing.pt")).await;

    match client.recv().await {
        ServerMessage::DeployResponse { success, kind, .. } => {
            assert!(!success);
            assert_eq!(kind.as_deref(), Some("not_found"));
        }
        other => panic!("unexpected response: {:?}", other),
    }
}

#[tokio::test]
async fn test_download_cannot_reach_other_owner() {
    let (_temp, root) = create_test_workspace();
    let mut client = connect(root);

    client
        .send(&deploy_download("../bob/secret-project/runs/secret.txt"))
        .await;

    match client.recv().await {
        ServerMessage::DeployResponse { success, kind, .. } => {
            assert!(!success);
            assert_eq!(kind.as_deref(), Some("path_escape"));
        }
        other => panic!("unexpected response: {:?}", other),
    }
}

// ============================================================================
// Deploy Validation Tests
// ============================================================================

#[tokio::test]
async fn test_deploy_unsupported_method() {
    let (_temp, root) = create_test_workspace();
    let mut client = connect(root);

    client
        .send(&ClientMessage::Deploy {
            owner: "alice".to_string(),
            file: "mnist/runs/run1/model.pt".to_string(),
            method: "rsync".to_string(),
            host: Some("deploy.example.com".to_string()),
            port: None,
            username: Some("deployer".to_string()),
            password: Some(Secret::new("pw".to_string())),
            remote_path: Some("/srv/model.pt".to_string()),
        })
        .await;

    match client.recv().await {
        ServerMessage::DeployResponse { success, kind, .. } => {
            assert!(!success);
            assert_eq!(kind.as_deref(), Some("unsupported_method"));
        }
        other => panic!("unexpected response: {:?}", other),
    }
}

#[tokio::test]
async fn test_deploy_missing_destination_fields() {
    let (_temp, root) = create_test_workspace();
    let mut client = connect(root);

    client
        .send(&ClientMessage::Deploy {
            owner: "alice".to_string(),
            file: "mnist/runs/run1/model.pt".to_string(),
            method: "ssh".to_string(),
            host: None,
            port: None,
            username: None,
            password: None,
            remote_path: None,
        })
        .await;

    match client.recv().await {
        ServerMessage::DeployResponse { success, kind, error, .. } => {
            assert!(!success);
            assert_eq!(kind.as_deref(), Some("invalid_request"));
            assert!(error.is_some());
        }
        other => panic!("unexpected response: {:?}", other),
    }
}

#[tokio::test]
async fn test_deploy_scp_unreachable_host() {
    let (_temp, root) = create_test_workspace();
    let mut client = connect(root);

    // Port 1 on loopback: connection refused, fast and deterministic
    client
        .send(&ClientMessage::Deploy {
            owner: "alice".to_string(),
            file: "mnist/runs/run1/model.pt".to_string(),
            method: "ssh".to_string(),
            host: Some("127.0.0.1".to_string()),
            port: Some(1),
            username: Some("deployer".to_string()),
            password: Some(Secret::new("pw".to_string())),
            remote_path: Some("/srv/model.pt".to_string()),
        })
        .await;

    match client.recv().await {
        ServerMessage::DeployResponse { success, kind, error, .. } => {
            assert!(!success);
            assert_eq!(kind.as_deref(), Some("transport_connect"));
            // The credential must never be echoed back
            assert!(!error.unwrap().contains("pw"));
        }
        other => panic!("unexpected response: {:?}", other),
    }
}

// ============================================================================
// Protocol Error Tests
// ============================================================================

#[tokio::test]
async fn test_malformed_request_keeps_connection() {
    use tokio::io::AsyncWriteExt;

    let (_temp, root) = create_test_workspace();
    let mut client = connect(root);

    client.writer.write_all(b"this is not json\n").await.unwrap();
    client.writer.flush().await.unwrap();

    match client.recv().await {
        ServerMessage::Error { kind, .. } => {
            assert_eq!(kind.as_deref(), Some("protocol"));
        }
        other => panic!("unexpected response: {:?}", other),
    }

    // Connection survives and keeps serving requests
    client
        .send(&ClientMessage::MonitorStatus {
            project: "mnist".to_string(),
        })
        .await;
    match client.recv().await {
        ServerMessage::MonitorStatusResponse { running, .. } => assert!(!running),
        other => panic!("unexpected response: {:?}", other),
    }
}
