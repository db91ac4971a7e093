//! Deployment transfer engine
//!
//! Resolves a wire-level deployment request into a typed `DeploySpec`, then
//! drives the matching transport (SCP or FTP) or hands the resolved file back
//! for download streaming. All transports are blocking, synchronous I/O and
//! must be run via `spawn_blocking` from async handlers.
//!
//! No retries anywhere: deployment targets are operator-supplied, and a
//! silent retry could mask misconfiguration.

use std::path::Path;

use berth_common::DeployErrorKind;
use berth_common::validators::{validate_host, validate_remote_path};

use crate::files::PathError;

pub mod download;
pub mod ftp;
pub mod scp;

pub use download::prepare_download;

/// Default SSH port when the request omits one
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Default FTP control port when the request omits one
pub const DEFAULT_FTP_PORT: u16 = 21;

/// A password or token for an outbound transfer session
///
/// Wraps the secret so it cannot leak through `Debug` formatting or be
/// printed by accident. There is deliberately no `Display` impl.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: String) -> Self {
        Self(secret)
    }

    /// Access the secret for authenticating a transport session
    pub fn reveal(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Credential(***)")
    }
}

/// A remote deployment target
#[derive(Debug, Clone)]
pub struct Destination {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub credential: Credential,
    pub remote_path: String,
}

/// A fully validated deployment request, resolved once at the gateway
///
/// The wire format carries a free-form method string and optional fields;
/// this enum is the closed set of things the transfer engine actually does.
#[derive(Debug)]
pub enum DeploySpec {
    /// Stream the file back to the requester; no outbound connection
    Download,
    /// Upload over an authenticated SSH session
    Scp(Destination),
    /// Upload over an FTP control connection
    Ftp(Destination),
}

/// Error type for deployment failures
///
/// `detail` strings never contain credentials.
#[derive(Debug)]
pub enum DeployError {
    /// Local source path failed workspace resolution
    Path(PathError),
    /// Unknown deployment method string
    UnsupportedMethod(String),
    /// A field required by the chosen method is missing or invalid
    InvalidRequest(String),
    /// Remote server rejected the credentials
    Auth(String),
    /// Stream failure mid-transfer
    Io(String),
    /// Unreachable host, refused connection, or connect timeout
    Connect(String),
}

impl DeployError {
    /// Map to the wire-level error taxonomy
    pub fn kind(&self) -> DeployErrorKind {
        match self {
            Self::Path(PathError::NotFound) => DeployErrorKind::NotFound,
            Self::Path(_) => DeployErrorKind::PathEscape,
            Self::UnsupportedMethod(_) => DeployErrorKind::UnsupportedMethod,
            Self::InvalidRequest(_) => DeployErrorKind::InvalidRequest,
            Self::Auth(_) => DeployErrorKind::TransportAuth,
            Self::Io(_) => DeployErrorKind::TransportIo,
            Self::Connect(_) => DeployErrorKind::TransportConnect,
        }
    }
}

impl std::fmt::Display for DeployError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path(e) => write!(f, "{}", e),
            Self::UnsupportedMethod(m) => write!(f, "Unsupported deployment method: {}", m),
            Self::InvalidRequest(msg) => write!(f, "Invalid deployment request: {}", msg),
            Self::Auth(msg) => write!(f, "Authentication failed: {}", msg),
            Self::Io(msg) => write!(f, "Transfer failed: {}", msg),
            Self::Connect(msg) => write!(f, "Connection failed: {}", msg),
        }
    }
}

impl std::error::Error for DeployError {}

impl From<PathError> for DeployError {
    fn from(e: PathError) -> Self {
        Self::Path(e)
    }
}

/// Fields a deploy request may carry beyond method and source file
///
/// All optional on the wire; `resolve_spec` checks presence per method.
#[derive(Debug, Default)]
pub struct DeployFields {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub remote_path: Option<String>,
}

/// Resolve a wire-level method string and field set into a `DeploySpec`
///
/// Runs before any filesystem or network I/O. Unknown methods fail with
/// `UnsupportedMethod`; known methods with missing or malformed fields fail
/// with `InvalidRequest`.
pub fn resolve_spec(method: &str, fields: DeployFields) -> Result<DeploySpec, DeployError> {
    match method {
        "download" => Ok(DeploySpec::Download),
        "ssh" => Ok(DeploySpec::Scp(resolve_destination(
            fields,
            DEFAULT_SSH_PORT,
        )?)),
        "ftp" => Ok(DeploySpec::Ftp(resolve_destination(
            fields,
            DEFAULT_FTP_PORT,
        )?)),
        other => Err(DeployError::UnsupportedMethod(other.to_string())),
    }
}

/// Validate and assemble the destination fields shared by SCP and FTP
fn resolve_destination(
    fields: DeployFields,
    default_port: u16,
) -> Result<Destination, DeployError> {
    let host = fields
        .host
        .ok_or_else(|| DeployError::InvalidRequest("host is required".to_string()))?;
    validate_host(&host).map_err(|e| DeployError::InvalidRequest(e.to_string()))?;

    let username = fields
        .username
        .ok_or_else(|| DeployError::InvalidRequest("username is required".to_string()))?;
    if username.is_empty() {
        return Err(DeployError::InvalidRequest(
            "username is required".to_string(),
        ));
    }

    let password = fields
        .password
        .ok_or_else(|| DeployError::InvalidRequest("password is required".to_string()))?;

    let remote_path = fields
        .remote_path
        .ok_or_else(|| DeployError::InvalidRequest("remote path is required".to_string()))?;
    validate_remote_path(&remote_path).map_err(|e| DeployError::InvalidRequest(e.to_string()))?;

    Ok(Destination {
        host,
        port: fields.port.unwrap_or(default_port),
        username,
        credential: Credential::new(password),
        remote_path,
    })
}

/// An outbound upload session
///
/// Implementations hold their connection state internally; `connect` opens
/// the session, `upload` streams the file, `close` tears the session down
/// best-effort. Split out as a trait so tests can count session lifecycle
/// calls without a live server.
pub trait Transport {
    fn connect(&mut self) -> Result<(), DeployError>;
    fn upload(&mut self, source: &Path) -> Result<u64, DeployError>;
    fn close(&mut self);
}

/// Drive a transport through one complete upload
///
/// `close` is called exactly once on every exit path, so no session leaks
/// regardless of outcome. Closing a transport whose connect failed is a
/// no-op for both backends.
pub fn run_transfer<T: Transport>(transport: &mut T, source: &Path) -> Result<u64, DeployError> {
    let result = transport
        .connect()
        .and_then(|()| transport.upload(source));
    transport.close();
    result
}

/// Execute a resolved upload spec against its destination
///
/// Blocking; callers in async context must use `spawn_blocking`.
pub fn execute_upload(spec: &DeploySpec, source: &Path) -> Result<u64, DeployError> {
    match spec {
        DeploySpec::Download => Err(DeployError::InvalidRequest(
            "download is not an upload".to_string(),
        )),
        DeploySpec::Scp(dest) => {
            let mut transport = scp::ScpTransport::new(dest.clone());
            run_transfer(&mut transport, source)
        }
        DeploySpec::Ftp(dest) => {
            let mut transport = ftp::FtpTransport::new(dest.clone());
            run_transfer(&mut transport, source)
        }
    }
}
