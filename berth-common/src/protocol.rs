//! Protocol definitions for the Berth deployment server
//!
//! All messages are sent as newline-delimited JSON over TLS. Every request
//! line receives at least one response line; downloads additionally stream
//! `FileData` chunks followed by `FileEnd`.
//!
//! ## Credential Security
//!
//! Deployment requests carry the remote credential in plaintext. The TLS
//! control connection protects it in transit, and the server forwards it only
//! to the chosen transport's own authentication step. It is never logged and
//! never echoed back in any response.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

/// A credential carried on the wire
///
/// Serializes transparently as a plain JSON string but redacts itself from
/// `Debug` output, so a logged request never reveals the secret.
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: String) -> Self {
        Self(value)
    }

    /// Consume the wrapper, yielding the secret for the transport's own
    /// authentication step
    pub fn reveal(self) -> String {
        self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Client request messages
///
/// Identity is external: the fronting proxy authenticates the caller and
/// stamps `owner` onto each request before it reaches this server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// List the run directories recorded for a project
    RunList { owner: String, project: String },
    /// Request a recursive directory snapshot of one run
    RunTree {
        owner: String,
        project: String,
        run: String,
    },
    /// Deploy an artifact file out of the owner's workspace
    ///
    /// `method` selects the backend; the destination fields are required for
    /// scp and ftp and ignored for download. The server resolves this
    /// loosely-typed payload into a closed method enum exactly once.
    Deploy {
        owner: String,
        /// Path of the artifact, relative to the owner's workspace
        file: String,
        method: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        host: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        port: Option<u16>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        username: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        password: Option<Secret>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        remote_path: Option<String>,
    },
    /// Start the visualization process for a project (idempotent)
    MonitorStart { owner: String, project: String },
    /// Stop the visualization process for a project (no-op if absent)
    MonitorStop { project: String },
    /// Query whether the visualization process is running
    MonitorStatus { project: String },
}

/// Server response messages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Response to `RunList`
    RunListResponse {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        runs: Option<Vec<String>>,
    },
    /// Response to `RunTree`
    RunTreeResponse {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        tree: Option<TreeNode>,
    },
    /// Response to `Deploy`
    ///
    /// For method=download a successful response carries `size` and is
    /// followed by `FileData` chunks and a terminating `FileEnd`.
    DeployResponse {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        size: Option<u64>,
    },
    /// One base64-encoded chunk of a streamed download
    FileData { data: String },
    /// Terminates a download stream; `size` is the total bytes sent
    FileEnd { size: u64 },
    /// Response to `MonitorStart`
    MonitorStartResponse {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        port: Option<u16>,
        /// True when the process was already running and no spawn occurred
        #[serde(default)]
        already_running: bool,
    },
    /// Response to `MonitorStop`
    MonitorStopResponse {
        /// True if a running process was terminated, false if none existed
        stopped: bool,
    },
    /// Response to `MonitorStatus`
    MonitorStatusResponse {
        running: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        port: Option<u16>,
    },
    /// Request could not be understood at all
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
    },
}

impl ServerMessage {
    /// Build a `FileData` chunk from raw bytes
    pub fn file_data(bytes: &[u8]) -> Self {
        Self::FileData {
            data: BASE64.encode(bytes),
        }
    }
}

/// Decode the payload of a `FileData` chunk
///
/// # Errors
///
/// Returns an error string if the payload is not valid base64.
pub fn decode_file_data(data: &str) -> Result<Vec<u8>, String> {
    BASE64.decode(data).map_err(|e| e.to_string())
}

/// A snapshot of one filesystem entry within a run directory
///
/// Directories carry `children` (sorted by name); files do not. The snapshot
/// is best effort: unreadable subtrees are omitted rather than failing the
/// whole listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub name: String,
    /// Path relative to the tree root (empty for the root node itself)
    pub path: String,
    pub kind: TreeNodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNode>>,
}

/// Classification of a tree entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNodeKind {
    File,
    Directory,
}
