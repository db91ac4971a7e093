//! Input validators for caller-supplied strings
//!
//! These run at the gateway before any filesystem or network work. They check
//! shape only; traversal safety is the server path resolver's job.

mod file_path;
mod host;
mod remote_path;

pub use file_path::{FilePathError, MAX_FILE_PATH_LENGTH, validate_file_path};
pub use host::{HostError, MAX_HOST_LENGTH, validate_host};
pub use remote_path::{MAX_REMOTE_PATH_LENGTH, RemotePathError, validate_remote_path};
