//! Workspace-relative file path validation

/// Maximum length for file paths in characters
pub const MAX_FILE_PATH_LENGTH: usize = 4096;

/// Validation error for file paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilePathError {
    /// Path exceeds maximum length
    TooLong,
    /// Path contains null bytes
    ContainsNull,
    /// Path contains control characters
    InvalidCharacters,
}

impl std::fmt::Display for FilePathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooLong => write!(f, "path exceeds {MAX_FILE_PATH_LENGTH} characters"),
            Self::ContainsNull => write!(f, "path contains null bytes"),
            Self::InvalidCharacters => write!(f, "path contains control characters"),
        }
    }
}

impl std::error::Error for FilePathError {}

/// Validate a workspace-relative file path from the caller
///
/// Checks length, null bytes, and control characters. Traversal (`..`) is
/// deliberately allowed here: the server's path resolver normalizes and
/// confines the path, and must see the original request to classify escapes.
///
/// # Errors
///
/// Returns a `FilePathError` variant describing the validation failure.
pub fn validate_file_path(path: &str) -> Result<(), FilePathError> {
    if path.len() > MAX_FILE_PATH_LENGTH {
        return Err(FilePathError::TooLong);
    }

    for ch in path.chars() {
        if ch == '\0' {
            return Err(FilePathError::ContainsNull);
        }
        if ch.is_control() {
            return Err(FilePathError::InvalidCharacters);
        }
    }

    Ok(())
}
