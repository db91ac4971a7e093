//! SCP/SFTP upload transport over ssh2

use std::fs::File;
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;

use ssh2::Session;

use crate::constants::{TRANSFER_BUFFER_SIZE, TRANSFER_CONNECT_TIMEOUT, TRANSFER_IO_TIMEOUT_MS};

use super::{DeployError, Destination, Transport};

/// Upload session over an authenticated SSH connection
///
/// One session per deployment. Blocking I/O throughout; run via
/// `spawn_blocking` from async context.
pub struct ScpTransport {
    dest: Destination,
    session: Option<Session>,
}

impl ScpTransport {
    pub fn new(dest: Destination) -> Self {
        Self {
            dest,
            session: None,
        }
    }
}

impl Transport for ScpTransport {
    fn connect(&mut self) -> Result<(), DeployError> {
        let addr = format!("{}:{}", self.dest.host, self.dest.port);
        let sock = addr
            .to_socket_addrs()
            .map_err(|e| DeployError::Connect(format!("failed to resolve {}: {}", addr, e)))?
            .next()
            .ok_or_else(|| DeployError::Connect(format!("no addresses for {}", addr)))?;

        let tcp = TcpStream::connect_timeout(&sock, TRANSFER_CONNECT_TIMEOUT)
            .map_err(|e| DeployError::Connect(format!("TCP connect to {} failed: {}", addr, e)))?;
        let _ = tcp.set_read_timeout(Some(TRANSFER_CONNECT_TIMEOUT));
        let _ = tcp.set_write_timeout(Some(TRANSFER_CONNECT_TIMEOUT));

        let mut session = Session::new()
            .map_err(|e| DeployError::Connect(format!("failed to create SSH session: {}", e)))?;
        session.set_tcp_stream(tcp);
        session.set_timeout(TRANSFER_IO_TIMEOUT_MS);
        session
            .handshake()
            .map_err(|e| DeployError::Connect(format!("SSH handshake with {} failed: {}", addr, e)))?;

        session
            .userauth_password(&self.dest.username, self.dest.credential.reveal())
            .map_err(|e| DeployError::Auth(format!("SSH authentication rejected: {}", e)))?;
        if !session.authenticated() {
            return Err(DeployError::Auth("SSH authentication rejected".to_string()));
        }

        self.session = Some(session);
        Ok(())
    }

    fn upload(&mut self, source: &Path) -> Result<u64, DeployError> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| DeployError::Io("upload before connect".to_string()))?;

        let sftp = session
            .sftp()
            .map_err(|e| DeployError::Io(format!("failed to open SFTP channel: {}", e)))?;

        let mut local = File::open(source)
            .map_err(|e| DeployError::Io(format!("failed to open source file: {}", e)))?;
        let mut remote = sftp
            .create(Path::new(&self.dest.remote_path))
            .map_err(|e| {
                DeployError::Io(format!(
                    "failed to create {}: {}",
                    self.dest.remote_path, e
                ))
            })?;

        let mut buf = vec![0u8; TRANSFER_BUFFER_SIZE];
        let mut written: u64 = 0;
        loop {
            let n = local
                .read(&mut buf)
                .map_err(|e| DeployError::Io(format!("read failed: {}", e)))?;
            if n == 0 {
                break;
            }
            remote
                .write_all(&buf[..n])
                .map_err(|e| DeployError::Io(format!("write failed: {}", e)))?;
            written += n as u64;
        }

        Ok(written)
    }

    fn close(&mut self) {
        if let Some(session) = self.session.take() {
            // Best-effort; the TCP stream drops with the session either way
            let _ = session.disconnect(None, "deployment complete", None);
        }
    }
}
