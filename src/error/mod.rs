//! Error types and handling for bundle-harness
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! This module is organized into sub-modules by error domain:
//! - [`config`]: Configuration and usage errors
//! - [`fs`]: Virtual file view errors
//! - [`layout`]: Bundle layout assertion errors
//! - [`runtime`]: Resolution and execution errors

pub mod config;
pub mod fs;
pub mod layout;
pub mod runtime;

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for harness operations
#[derive(Error, Diagnostic, Debug)]
pub enum HarnessError {
    // Configuration errors
    #[error("Unknown target environment: {context}")]
    #[diagnostic(
        code(bundle_harness::config::unknown_target),
        help("Supported targets: browser, node, electron")
    )]
    UnknownTarget { context: String },

    #[error("Invalid expected layout: {message}")]
    #[diagnostic(
        code(bundle_harness::config::invalid_layout),
        help("Every expected bundle needs an `assets` list of base filenames")
    )]
    InvalidLayout { message: String },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(bundle_harness::config::invalid))]
    ConfigInvalid { message: String },

    #[error("Failed to parse {path}: {reason}")]
    #[diagnostic(code(bundle_harness::config::parse_failed))]
    ConfigParseFailed { path: String, reason: String },

    #[error("Failed to read {path}: {reason}")]
    #[diagnostic(code(bundle_harness::config::read_failed))]
    ConfigReadFailed { path: String, reason: String },

    #[error("Bundle graph has no js bundle to execute")]
    #[diagnostic(code(bundle_harness::config::no_entry_bundle))]
    NoEntryBundle,

    #[error("Bundle '{bundle}' has no main entry asset")]
    #[diagnostic(
        code(bundle_harness::config::missing_main_entry),
        help("Set `entry` on the bundle to the id of its main asset")
    )]
    MissingMainEntry { bundle: String },

    // Runtime errors
    #[error("Cannot find module '{specifier}' from '{from}'")]
    #[diagnostic(code(bundle_harness::runtime::module_not_found))]
    ModuleNotFound { specifier: String, from: String },

    /// A value thrown or rejected by executed code. `code` and `stack` are
    /// copied from the thrown object when present; `thrown` is its JSON
    /// snapshot (`null` when it has none)
    #[error("{name}: {message}")]
    #[diagnostic(code(bundle_harness::runtime::execution))]
    Execution {
        name: String,
        message: String,
        code: Option<String>,
        stack: Option<String>,
        thrown: serde_json::Value,
    },

    #[error("Exported promise never settled")]
    #[diagnostic(
        code(bundle_harness::runtime::unsettled_promise),
        help("The promise was still pending after every scheduled task had run")
    )]
    UnsettledPromise,

    #[error("Scheduled task budget of {limit} exceeded")]
    #[diagnostic(
        code(bundle_harness::runtime::task_budget_exceeded),
        help("An interval or self-rescheduling timer is probably never cleared")
    )]
    TaskBudgetExceeded { limit: usize },

    #[error("JavaScript engine error: {message}")]
    #[diagnostic(code(bundle_harness::runtime::engine))]
    Engine { message: String },

    // Layout assertion errors
    #[error("Expected {expected} bundles, got {actual}")]
    #[diagnostic(code(bundle_harness::layout::count_mismatch))]
    BundleCountMismatch { expected: usize, actual: usize },

    #[error("Bundle name mismatch: expected {expected}, got '{actual}'")]
    #[diagnostic(code(bundle_harness::layout::name_mismatch))]
    BundleNameMismatch { expected: String, actual: String },

    #[error("Bundle '{bundle}' type mismatch: expected '{expected}', got '{actual}'")]
    #[diagnostic(code(bundle_harness::layout::type_mismatch))]
    BundleTypeMismatch {
        bundle: String,
        expected: String,
        actual: String,
    },

    #[error("Bundle '{bundle}' assets mismatch: expected [{expected}], got [{actual}]")]
    #[diagnostic(code(bundle_harness::layout::assets_mismatch))]
    BundleAssetsMismatch {
        bundle: String,
        expected: String,
        actual: String,
    },

    // File system errors
    #[error("File not found: {path}")]
    #[diagnostic(code(bundle_harness::fs::not_found))]
    FileNotFound { path: String },

    #[error("Failed to read file: {path}: {reason}")]
    #[diagnostic(code(bundle_harness::fs::read_failed))]
    FileReadFailed { path: String, reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(bundle_harness::fs::io_error))]
    IoError { message: String },
}

impl From<std::io::Error> for HarnessError {
    fn from(err: std::io::Error) -> Self {
        HarnessError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for HarnessError {
    fn from(err: serde_yaml::Error) -> Self {
        HarnessError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for HarnessError {
    fn from(err: serde_json::Error) -> Self {
        HarnessError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, HarnessError>;

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_error_contains {
        ($test_name:ident, $err:expr, $($contains:expr),+ $(,)?) => {
            #[test]
            fn $test_name() {
                let err = $err;
                let error_string = err.to_string();
                $(
                    assert!(error_string.contains($contains),
                        "Error message should contain '{}', got: {}",
                        $contains,
                        error_string
                    );
                )+
            }
        };
    }

    #[test]
    fn test_error_display() {
        let err = HarnessError::UnknownTarget {
            context: "worklet".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown target environment: worklet");
    }

    #[test]
    fn test_error_code() {
        let err = HarnessError::NoEntryBundle;
        assert_eq!(
            err.code().map(|c| c.to_string()),
            Some("bundle_harness::config::no_entry_bundle".to_string())
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let harness_err: HarnessError = io_err.into();
        assert!(matches!(harness_err, HarnessError::IoError { .. }));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let parse_result: std::result::Result<serde_yaml::Value, _> =
            serde_yaml::from_str("invalid: yaml: content: [unclosed");
        let harness_err: HarnessError = parse_result.unwrap_err().into();
        assert!(matches!(harness_err, HarnessError::ConfigParseFailed { .. }));
    }

    #[test]
    fn test_json_error_conversion() {
        let parse_result: std::result::Result<serde_json::Value, _> =
            serde_json::from_str("invalid json content");
        let harness_err: HarnessError = parse_result.unwrap_err().into();
        assert!(matches!(harness_err, HarnessError::ConfigParseFailed { .. }));
    }

    test_error_contains!(
        test_count_mismatch_error,
        layout::count_mismatch(1, 2),
        "Expected 1 bundles, got 2"
    );

    test_error_contains!(
        test_module_not_found_error,
        runtime::module_not_found("./missing", "/dist"),
        "Cannot find module './missing'",
        "/dist"
    );

    test_error_contains!(
        test_execution_error,
        runtime::execution("TypeError", "boom"),
        "TypeError: boom"
    );

    test_error_contains!(
        test_invalid_layout_error,
        config::invalid_layout("entry 0 has no assets"),
        "Invalid expected layout",
        "entry 0"
    );

    test_error_contains!(
        test_file_not_found_error,
        fs::not_found("/dist/index.js"),
        "File not found: /dist/index.js"
    );
}
