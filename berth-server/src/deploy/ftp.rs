//! FTP upload transport over suppaftp

use std::fs::File;
use std::io::BufReader;
use std::net::ToSocketAddrs;
use std::path::Path;

use suppaftp::FtpStream;
use suppaftp::types::FileType;

use crate::constants::TRANSFER_CONNECT_TIMEOUT;

use super::{DeployError, Destination, Transport};

/// Upload session over an FTP control connection
///
/// One session per deployment. Blocking I/O throughout; run via
/// `spawn_blocking` from async context.
pub struct FtpTransport {
    dest: Destination,
    stream: Option<FtpStream>,
}

impl FtpTransport {
    pub fn new(dest: Destination) -> Self {
        Self { dest, stream: None }
    }
}

impl Transport for FtpTransport {
    fn connect(&mut self) -> Result<(), DeployError> {
        let addr = format!("{}:{}", self.dest.host, self.dest.port);
        let sock = addr
            .to_socket_addrs()
            .map_err(|e| DeployError::Connect(format!("failed to resolve {}: {}", addr, e)))?
            .next()
            .ok_or_else(|| DeployError::Connect(format!("no addresses for {}", addr)))?;

        let mut stream = FtpStream::connect_timeout(sock, TRANSFER_CONNECT_TIMEOUT)
            .map_err(|e| DeployError::Connect(format!("FTP connect to {} failed: {}", addr, e)))?;

        stream
            .login(self.dest.username.as_str(), self.dest.credential.reveal())
            .map_err(|e| DeployError::Auth(format!("FTP login rejected: {}", e)))?;

        self.stream = Some(stream);
        Ok(())
    }

    fn upload(&mut self, source: &Path) -> Result<u64, DeployError> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| DeployError::Io("upload before connect".to_string()))?;

        // Split the destination into parent directory and filename. A missing
        // parent is created one level deep before changing into it.
        let remote = Path::new(&self.dest.remote_path);
        let filename = remote
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                DeployError::Io(format!(
                    "remote path {} has no filename",
                    self.dest.remote_path
                ))
            })?;
        if let Some(parent) = remote.parent() {
            let parent = parent.to_string_lossy().replace('\\', "/");
            if !parent.is_empty() && parent != "." {
                if stream.cwd(&parent).is_err() {
                    stream.mkdir(&parent).map_err(|e| {
                        DeployError::Io(format!("failed to create {}: {}", parent, e))
                    })?;
                    stream.cwd(&parent).map_err(|e| {
                        DeployError::Io(format!("failed to enter {}: {}", parent, e))
                    })?;
                }
            }
        }

        stream
            .transfer_type(FileType::Binary)
            .map_err(|e| DeployError::Io(format!("failed to set binary mode: {}", e)))?;

        let file = File::open(source)
            .map_err(|e| DeployError::Io(format!("failed to open source file: {}", e)))?;
        let mut reader = BufReader::new(file);
        let written = stream
            .put_file(filename, &mut reader)
            .map_err(|e| DeployError::Io(format!("failed to store {}: {}", filename, e)))?;

        Ok(written)
    }

    fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            // Best-effort; the control connection drops either way
            let _ = stream.quit();
        }
    }
}
