//! Deployment target hostname validation

/// Maximum length for hostnames (RFC 1035 plus slack for IPv6 literals)
pub const MAX_HOST_LENGTH: usize = 255;

/// Validation error for hostnames
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// Hostname is empty
    Empty,
    /// Hostname exceeds maximum length
    TooLong,
    /// Hostname contains whitespace or control characters
    InvalidCharacters,
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "host is empty"),
            Self::TooLong => write!(f, "host exceeds {MAX_HOST_LENGTH} characters"),
            Self::InvalidCharacters => write!(f, "host contains invalid characters"),
        }
    }
}

impl std::error::Error for HostError {}

/// Validate a deployment target hostname or address literal
///
/// Accepts DNS names, IPv4, and bracketless IPv6 literals. Resolution errors
/// are the transport's to report; this only rejects strings that could never
/// name a host.
///
/// # Errors
///
/// Returns a `HostError` variant describing the validation failure.
pub fn validate_host(host: &str) -> Result<(), HostError> {
    if host.is_empty() {
        return Err(HostError::Empty);
    }
    if host.len() > MAX_HOST_LENGTH {
        return Err(HostError::TooLong);
    }
    for ch in host.chars() {
        if ch.is_whitespace() || ch.is_control() {
            return Err(HostError::InvalidCharacters);
        }
    }
    Ok(())
}
