//! Virtual file view errors

use std::io;
use std::path::Path;

use super::HarnessError;

/// Creates a file not found error
pub fn not_found(path: impl Into<String>) -> HarnessError {
    HarnessError::FileNotFound { path: path.into() }
}

/// Maps an I/O failure on `path` to the matching harness error
pub fn from_io(path: &Path, err: &io::Error) -> HarnessError {
    if err.kind() == io::ErrorKind::NotFound {
        not_found(path.display().to_string())
    } else {
        HarnessError::FileReadFailed {
            path: path.display().to_string(),
            reason: err.to_string(),
        }
    }
}
