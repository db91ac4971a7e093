//! Berth Common Library
//!
//! Shared protocol types, error kinds, validators, and the line codec used by
//! the Berth deployment server and its clients.

mod error_kind;
pub mod line;
pub mod protocol;
pub mod validators;

pub use error_kind::DeployErrorKind;

/// Default port for Berth control connections
pub const DEFAULT_PORT: u16 = 7710;

/// Default port the visualization process listens on
pub const DEFAULT_MONITOR_PORT: u16 = 6006;

/// Raw bytes per download chunk (encodes to ~64KB of base64 on the wire)
pub const DOWNLOAD_CHUNK_SIZE: usize = 48 * 1024;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_port() {
        assert_eq!(DEFAULT_PORT, 7710);
    }

    #[test]
    fn test_default_monitor_port() {
        assert_eq!(DEFAULT_MONITOR_PORT, 6006);
    }

    #[test]
    fn test_chunk_size_multiple_of_three() {
        // base64 encodes 3-byte groups; a multiple keeps chunks padding-free
        assert_eq!(DOWNLOAD_CHUNK_SIZE % 3, 0);
    }
}
