//! Command helper utilities

use std::path::Path;

use bundle_harness::HarnessConfig;
use bundle_harness::error::{Result, runtime};

/// Load the harness configuration, or the defaults when no file was given
pub fn load_config(path: Option<&Path>) -> Result<HarnessConfig> {
    match path {
        Some(path) => HarnessConfig::from_file(path),
        None => Ok(HarnessConfig::default()),
    }
}

/// Render a JSON value for the terminal
pub fn pretty_json(value: &serde_json::Value) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(runtime::engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config, HarnessConfig::default());
    }

    #[test]
    fn test_load_config_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("harness.yaml");
        std::fs::write(&path, "output_global: result\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.output_global, "result");
        assert_eq!(config.registry_global, "parcelRequire");
    }

    #[test]
    fn test_load_config_missing_file() {
        let temp = TempDir::new().unwrap();
        let result = load_config(Some(&temp.path().join("missing.yaml")));
        assert!(result.is_err());
    }
}
