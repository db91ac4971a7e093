//! Line codec for the Berth protocol
//!
//! Messages travel as newline-delimited JSON. The reader enforces a maximum
//! line length so a misbehaving peer cannot grow the buffer without bound,
//! and offers timeout variants for connections that must not idle forever.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt};
use tokio::time::timeout;

use crate::protocol::{ClientMessage, ServerMessage};

/// Maximum accepted request/response line length in bytes
pub const MAX_LINE_LENGTH: usize = 256 * 1024;

/// Default idle timeout between requests on a control connection
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(900);

/// Error type for line codec failures
#[derive(Debug)]
pub enum LineError {
    /// Underlying I/O failure
    Io(io::Error),
    /// The peer sent a line longer than [`MAX_LINE_LENGTH`]
    LineTooLong,
    /// The line was not valid JSON for the expected message type
    Malformed(String),
    /// No complete line arrived within the allotted time
    Timeout,
}

impl std::fmt::Display for LineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "i/o error: {e}"),
            Self::LineTooLong => write!(f, "line exceeds {MAX_LINE_LENGTH} bytes"),
            Self::Malformed(e) => write!(f, "malformed message: {e}"),
            Self::Timeout => write!(f, "timed out waiting for message"),
        }
    }
}

impl std::error::Error for LineError {}

impl From<io::Error> for LineError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<LineError> for io::Error {
    fn from(e: LineError) -> Self {
        match e {
            LineError::Io(inner) => inner,
            LineError::Timeout => io::Error::new(io::ErrorKind::TimedOut, e.to_string()),
            other => io::Error::new(io::ErrorKind::InvalidData, other.to_string()),
        }
    }
}

/// Reads newline-delimited JSON messages from a buffered async reader
pub struct LineReader<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R> LineReader<R> {
    /// Create a new line reader over a buffered reader
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }
}

impl<R: AsyncBufRead + Unpin> LineReader<R> {
    /// Read the next raw line from the stream
    ///
    /// Returns `Ok(None)` on a clean disconnect (EOF with an empty buffer).
    ///
    /// # Errors
    ///
    /// Returns `LineTooLong` if the line exceeds [`MAX_LINE_LENGTH`] and an
    /// I/O error on stream failure. This method has no timeout; production
    /// callers should prefer
    /// [`read_line_with_timeout`](Self::read_line_with_timeout).
    pub async fn read_line(&mut self) -> Result<Option<String>, LineError> {
        self.buf.clear();
        // The take cap bounds memory before the newline arrives: a compliant
        // line of MAX bytes plus its delimiter fits, anything longer trips
        // the limit below.
        let mut limited = (&mut self.reader).take(MAX_LINE_LENGTH as u64 + 1);
        let n = limited.read_until(b'\n', &mut self.buf).await?;
        if n == 0 {
            return Ok(None);
        }
        if !self.buf.ends_with(b"\n") && self.buf.len() > MAX_LINE_LENGTH {
            return Err(LineError::LineTooLong);
        }
        while matches!(self.buf.last(), Some(b'\n') | Some(b'\r')) {
            self.buf.pop();
        }
        String::from_utf8(std::mem::take(&mut self.buf))
            .map(Some)
            .map_err(|e| LineError::Malformed(e.to_string()))
    }

    /// Read the next line, bounded by an idle timeout
    ///
    /// Returns `Ok(None)` on clean disconnect and `Err(Timeout)` if no line
    /// completes within `idle_timeout`.
    pub async fn read_line_with_timeout(
        &mut self,
        idle_timeout: Duration,
    ) -> Result<Option<String>, LineError> {
        match timeout(idle_timeout, self.read_line()).await {
            Ok(result) => result,
            Err(_) => Err(LineError::Timeout),
        }
    }

    /// Read and parse the next client request
    pub async fn read_client_message(
        &mut self,
        idle_timeout: Duration,
    ) -> Result<Option<ClientMessage>, LineError> {
        let Some(line) = self.read_line_with_timeout(idle_timeout).await? else {
            return Ok(None);
        };
        serde_json::from_str(&line)
            .map(Some)
            .map_err(|e| LineError::Malformed(e.to_string()))
    }

    /// Read and parse the next server response (client side)
    pub async fn read_server_message(
        &mut self,
        idle_timeout: Duration,
    ) -> Result<Option<ServerMessage>, LineError> {
        let Some(line) = self.read_line_with_timeout(idle_timeout).await? else {
            return Ok(None);
        };
        serde_json::from_str(&line)
            .map(Some)
            .map_err(|e| LineError::Malformed(e.to_string()))
    }
}

/// Send a server response as one JSON line
pub async fn send_server_message<W>(writer: &mut W, message: &ServerMessage) -> io::Result<()>
where
    W: AsyncWriteExt + Unpin,
{
    let mut line = serde_json::to_vec(message)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    line.push(b'\n');
    writer.write_all(&line).await?;
    writer.flush().await
}

/// Send a client request as one JSON line
pub async fn send_client_message<W>(writer: &mut W, message: &ClientMessage) -> io::Result<()>
where
    W: AsyncWriteExt + Unpin,
{
    let mut line = serde_json::to_vec(message)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    line.push(b'\n');
    writer.write_all(&line).await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use tokio::io::BufReader;

    use super::*;

    #[tokio::test]
    async fn test_read_single_line() {
        let input = Cursor::new(b"{\"type\":\"MonitorStatus\",\"project\":\"p\"}\n".to_vec());
        let mut reader = LineReader::new(BufReader::new(input));
        let msg = reader
            .read_client_message(DEFAULT_IDLE_TIMEOUT)
            .await
            .unwrap()
            .unwrap();
        match msg {
            ClientMessage::MonitorStatus { project } => assert_eq!(project, "p"),
            _ => panic!("wrong variant"),
        }
    }

    #[tokio::test]
    async fn test_read_clean_disconnect() {
        let input = Cursor::new(Vec::new());
        let mut reader = LineReader::new(BufReader::new(input));
        assert!(reader.read_line().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unterminated_final_line() {
        let input = Cursor::new(b"{\"type\":\"MonitorStatus\",\"project\":\"x\"}".to_vec());
        let mut reader = LineReader::new(BufReader::new(input));
        let line = reader.read_line().await.unwrap().unwrap();
        assert!(line.ends_with('}'));
    }

    #[tokio::test]
    async fn test_crlf_stripped() {
        let input = Cursor::new(b"{}\r\n".to_vec());
        let mut reader = LineReader::new(BufReader::new(input));
        assert_eq!(reader.read_line().await.unwrap().unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_line_too_long() {
        let mut input = vec![b'x'; MAX_LINE_LENGTH + 1];
        input.push(b'\n');
        let mut reader = LineReader::new(BufReader::new(Cursor::new(input)));
        assert!(matches!(
            reader.read_line().await,
            Err(LineError::LineTooLong)
        ));
    }

    #[tokio::test]
    async fn test_malformed_json() {
        let input = Cursor::new(b"not json\n".to_vec());
        let mut reader = LineReader::new(BufReader::new(input));
        assert!(matches!(
            reader.read_client_message(DEFAULT_IDLE_TIMEOUT).await,
            Err(LineError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_send_and_read_roundtrip() {
        let mut wire = Vec::new();
        let msg = ServerMessage::MonitorStopResponse { stopped: true };
        send_server_message(&mut wire, &msg).await.unwrap();
        assert!(wire.ends_with(b"\n"));

        let mut reader = LineReader::new(BufReader::new(Cursor::new(wire)));
        let parsed = reader
            .read_server_message(DEFAULT_IDLE_TIMEOUT)
            .await
            .unwrap()
            .unwrap();
        match parsed {
            ServerMessage::MonitorStopResponse { stopped } => assert!(stopped),
            _ => panic!("wrong variant"),
        }
    }

    #[tokio::test]
    async fn test_multiple_lines_sequential() {
        let input = Cursor::new(b"{\"type\":\"MonitorStop\",\"project\":\"a\"}\n{\"type\":\"MonitorStop\",\"project\":\"b\"}\n".to_vec());
        let mut reader = LineReader::new(BufReader::new(input));
        let first = reader
            .read_client_message(DEFAULT_IDLE_TIMEOUT)
            .await
            .unwrap()
            .unwrap();
        let second = reader
            .read_client_message(DEFAULT_IDLE_TIMEOUT)
            .await
            .unwrap()
            .unwrap();
        match (first, second) {
            (
                ClientMessage::MonitorStop { project: a },
                ClientMessage::MonitorStop { project: b },
            ) => {
                assert_eq!(a, "a");
                assert_eq!(b, "b");
            }
            _ => panic!("wrong variants"),
        }
    }
}
