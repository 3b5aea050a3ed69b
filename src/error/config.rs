//! Configuration and usage errors

use super::HarnessError;

/// Creates an unknown target environment error
pub fn unknown_target(context: impl Into<String>) -> HarnessError {
    HarnessError::UnknownTarget {
        context: context.into(),
    }
}

/// Creates a malformed expected-layout error
pub fn invalid_layout(message: impl Into<String>) -> HarnessError {
    HarnessError::InvalidLayout {
        message: message.into(),
    }
}

/// Creates an invalid configuration error
pub fn invalid(message: impl Into<String>) -> HarnessError {
    HarnessError::ConfigInvalid {
        message: message.into(),
    }
}

/// Creates a parse failure for a named document
pub fn parse_failed(path: impl Into<String>, reason: impl ToString) -> HarnessError {
    HarnessError::ConfigParseFailed {
        path: path.into(),
        reason: reason.to_string(),
    }
}

/// Creates a read failure for a named document
pub fn read_failed(path: impl Into<String>, reason: impl ToString) -> HarnessError {
    HarnessError::ConfigReadFailed {
        path: path.into(),
        reason: reason.to_string(),
    }
}
