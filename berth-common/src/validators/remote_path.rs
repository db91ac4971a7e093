//! Remote destination path validation

/// Maximum length for remote destination paths
pub const MAX_REMOTE_PATH_LENGTH: usize = 4096;

/// Validation error for remote destination paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemotePathError {
    /// Remote path is empty
    Empty,
    /// Remote path exceeds maximum length
    TooLong,
    /// Remote path contains null bytes or control characters
    InvalidCharacters,
}

impl std::fmt::Display for RemotePathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "remote path is empty"),
            Self::TooLong => write!(f, "remote path exceeds {MAX_REMOTE_PATH_LENGTH} characters"),
            Self::InvalidCharacters => write!(f, "remote path contains invalid characters"),
        }
    }
}

impl std::error::Error for RemotePathError {}

/// Validate a remote destination path for SCP and FTP uploads
///
/// The remote server interprets the path; this only rejects strings no
/// remote filesystem would accept.
///
/// # Errors
///
/// Returns a `RemotePathError` variant describing the validation failure.
pub fn validate_remote_path(path: &str) -> Result<(), RemotePathError> {
    if path.is_empty() {
        return Err(RemotePathError::Empty);
    }
    if path.len() > MAX_REMOTE_PATH_LENGTH {
        return Err(RemotePathError::TooLong);
    }
    for ch in path.chars() {
        if ch == '\0' || ch.is_control() {
            return Err(RemotePathError::InvalidCharacters);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_paths() {
        assert!(validate_remote_path("/srv/models/checkpoint.pt").is_ok());
        assert!(validate_remote_path("uploads/run42/weights.bin").is_ok());
        assert!(validate_remote_path("C:/deploys/model.onnx").is_ok());
    }

    #[test]
    fn test_empty() {
        assert_eq!(validate_remote_path(""), Err(RemotePathError::Empty));
    }

    #[test]
    fn test_too_long() {
        let long = "a".repeat(MAX_REMOTE_PATH_LENGTH + 1);
        assert_eq!(validate_remote_path(&long), Err(RemotePathError::TooLong));
    }

    #[test]
    fn test_invalid_characters() {
        assert_eq!(
            validate_remote_path("/srv/mod\0els"),
            Err(RemotePathError::InvalidCharacters)
        );
        assert_eq!(
            validate_remote_path("/srv/\nmodels"),
            Err(RemotePathError::InvalidCharacters)
        );
    }
}
