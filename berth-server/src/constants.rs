//! Server-wide constants and message strings

#![allow(dead_code)]

use std::time::Duration;

// ============================================================================
// Paths and filenames
// ============================================================================

/// Directory name under the platform data dir for server state
pub const DATA_DIR_NAME: &str = "berthd";

/// Directory name for the experiment workspace under the data dir
pub const WORKSPACE_DIR_NAME: &str = "workspace";

/// Directory holding run artifacts inside each project
pub const RUNS_DIR_NAME: &str = "runs";

/// TLS certificate filename
pub const CERT_FILENAME: &str = "cert.pem";

/// TLS private key filename
pub const KEY_FILENAME: &str = "key.pem";

/// Common name for generated self-signed certificates
pub const TLS_CERT_COMMON_NAME: &str = "Berth Deployment Server";

// ============================================================================
// Timeouts and limits
// ============================================================================

/// TCP connect timeout for outbound transfer connections
pub const TRANSFER_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Read/write timeout for outbound transfer sessions (milliseconds for ssh2)
pub const TRANSFER_IO_TIMEOUT_MS: u32 = 30_000;

/// Buffer size for upload copy loops
pub const TRANSFER_BUFFER_SIZE: usize = 1024 * 1024;

/// How long to wait for a monitor process to exit after SIGTERM
pub const MONITOR_STOP_GRACE: Duration = Duration::from_secs(5);

/// Poll interval while waiting for a monitor process to exit
pub const MONITOR_STOP_POLL: Duration = Duration::from_millis(100);

// ============================================================================
// TLS error matching
// ============================================================================

/// Substring identifying benign close_notify warnings
pub const TLS_CLOSE_NOTIFY_MSG: &str = "close_notify";

/// Prefix identifying TLS handshake failures
pub const TLS_HANDSHAKE_FAILED_PREFIX: &str = "TLS handshake failed";

// ============================================================================
// Startup messages
// ============================================================================

pub const MSG_BANNER: &str = "Berth deployment server v";
pub const MSG_LISTENING: &str = "Listening on: ";
pub const MSG_WORKSPACE_ROOT: &str = "Workspace root: ";
pub const MSG_CERTIFICATES: &str = "Certificates: ";
pub const MSG_GENERATING_CERT: &str = "Generating self-signed TLS certificate...";
pub const MSG_CERT_GENERATED: &str = "Certificate written to: ";
pub const MSG_KEY_GENERATED: &str = "Private key written to: ";
pub const MSG_CERT_FINGERPRINT: &str = "Certificate fingerprint (SHA-256): ";
pub const MSG_SHUTDOWN_RECEIVED: &str = "Shutdown signal received, stopping monitors...";
pub const MSG_MONITOR_COMMAND: &str = "Monitor command: ";

// ============================================================================
// Error messages
// ============================================================================

pub const ERR_GENERIC: &str = "Error: ";
pub const ERR_ACCEPT: &str = "Failed to accept connection: ";
pub const ERR_CONNECTION: &str = "Connection error from ";
pub const ERR_BIND_FAILED: &str = "Failed to bind to ";
pub const ERR_TLS_INIT: &str = "Failed to initialize TLS: ";
pub const ERR_HANDLING_MESSAGE: &str = "Error handling message: ";
pub const ERR_NO_DATA_DIR: &str = "Could not determine platform data directory";
pub const ERR_CREATE_WORKSPACE_DIR: &str = "Failed to create workspace directory ";
pub const ERR_WORKSPACE_CANONICALIZE: &str = "Failed to canonicalize workspace root: ";

pub const ERR_SIGNAL_SIGTERM: &str = "Failed to install SIGTERM handler";
pub const ERR_SIGNAL_SIGINT: &str = "Failed to install SIGINT handler";
pub const ERR_SIGNAL_CTRLC: &str = "Failed to install Ctrl+C handler";

// ============================================================================
// Path resolution error messages
// ============================================================================

pub const ERR_PATH_ESCAPE: &str = "Path escapes the workspace root";
pub const ERR_PATH_NOT_FOUND: &str = "Path not found";
pub const ERR_PATH_CANONICALIZE: &str = "Failed to canonicalize path";
pub const ERR_PATH_INVALID_ROOT: &str = "Workspace root is not an absolute path";
