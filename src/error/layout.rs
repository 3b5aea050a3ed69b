//! Bundle layout assertion errors

use super::HarnessError;

/// Creates a bundle count mismatch error
pub fn count_mismatch(expected: usize, actual: usize) -> HarnessError {
    HarnessError::BundleCountMismatch { expected, actual }
}

/// Creates a bundle name mismatch error
pub fn name_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> HarnessError {
    HarnessError::BundleNameMismatch {
        expected: expected.into(),
        actual: actual.into(),
    }
}

/// Creates a bundle type mismatch error
pub fn type_mismatch(bundle: &str, expected: &str, actual: &str) -> HarnessError {
    HarnessError::BundleTypeMismatch {
        bundle: bundle.to_string(),
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}

/// Creates an asset list mismatch error
pub fn assets_mismatch(bundle: &str, expected: &[String], actual: &[String]) -> HarnessError {
    HarnessError::BundleAssetsMismatch {
        bundle: bundle.to_string(),
        expected: expected.join(", "),
        actual: actual.join(", "),
    }
}
