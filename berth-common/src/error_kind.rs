//! Machine-readable error kinds for deployment and monitoring operations
//!
//! These kinds are serialized to strings in protocol responses, allowing
//! callers to branch on the failure class (e.g., re-prompting for credentials
//! on an auth failure) without parsing the human-readable detail text.

use std::fmt;

/// Error kinds returned in `DeployResponse`, `RunTreeResponse`, and
/// `MonitorStartResponse` messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployErrorKind {
    /// The requested path escapes the caller's workspace
    ///
    /// Security violation; no I/O was performed.
    PathEscape,

    /// The deployment method is not one of download/ssh/ftp
    ///
    /// Rejected before any connection is opened.
    UnsupportedMethod,

    /// A required field is missing or malformed for the chosen method
    InvalidRequest,

    /// The remote end rejected the supplied credentials
    TransportAuth,

    /// The transfer stream failed after the session was established
    TransportIo,

    /// The remote host could not be reached (refused, timeout, DNS)
    TransportConnect,

    /// The visualization process could not be launched
    Spawn,

    /// The requested file, run, or directory does not exist
    NotFound,

    /// The request could not be parsed
    Protocol,
}

impl DeployErrorKind {
    /// Convert to the string representation used in protocol messages
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PathEscape => "path_escape",
            Self::UnsupportedMethod => "unsupported_method",
            Self::InvalidRequest => "invalid_request",
            Self::TransportAuth => "transport_auth",
            Self::TransportIo => "transport_io",
            Self::TransportConnect => "transport_connect",
            Self::Spawn => "spawn",
            Self::NotFound => "not_found",
            Self::Protocol => "protocol",
        }
    }

    /// Parse from string (for client-side handling)
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "path_escape" => Some(Self::PathEscape),
            "unsupported_method" => Some(Self::UnsupportedMethod),
            "invalid_request" => Some(Self::InvalidRequest),
            "transport_auth" => Some(Self::TransportAuth),
            "transport_io" => Some(Self::TransportIo),
            "transport_connect" => Some(Self::TransportConnect),
            "spawn" => Some(Self::Spawn),
            "not_found" => Some(Self::NotFound),
            "protocol" => Some(Self::Protocol),
            _ => None,
        }
    }
}

impl fmt::Display for DeployErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<DeployErrorKind> for String {
    fn from(kind: DeployErrorKind) -> Self {
        kind.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: &[DeployErrorKind] = &[
        DeployErrorKind::PathEscape,
        DeployErrorKind::UnsupportedMethod,
        DeployErrorKind::InvalidRequest,
        DeployErrorKind::TransportAuth,
        DeployErrorKind::TransportIo,
        DeployErrorKind::TransportConnect,
        DeployErrorKind::Spawn,
        DeployErrorKind::NotFound,
        DeployErrorKind::Protocol,
    ];

    #[test]
    fn test_as_str() {
        assert_eq!(DeployErrorKind::PathEscape.as_str(), "path_escape");
        assert_eq!(
            DeployErrorKind::UnsupportedMethod.as_str(),
            "unsupported_method"
        );
        assert_eq!(
            DeployErrorKind::TransportConnect.as_str(),
            "transport_connect"
        );
        assert_eq!(DeployErrorKind::NotFound.as_str(), "not_found");
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(DeployErrorKind::parse("unknown"), None);
        assert_eq!(DeployErrorKind::parse(""), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", DeployErrorKind::Spawn), "spawn");
        assert_eq!(
            format!("{}", DeployErrorKind::TransportAuth),
            "transport_auth"
        );
    }

    #[test]
    fn test_roundtrip() {
        for kind in ALL {
            assert_eq!(DeployErrorKind::parse(kind.as_str()), Some(*kind));
        }
    }

    #[test]
    fn test_into_string() {
        let s: String = DeployErrorKind::TransportIo.into();
        assert_eq!(s, "transport_io");
    }
}
