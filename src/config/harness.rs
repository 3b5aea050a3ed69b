//! Harness configuration (harness.yaml) data structures

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, config};
use crate::vfs::has_json_extension;

/// Tunables for one harness instance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "snake_case")]
pub struct HarnessConfig {
    /// Extensions probed by the module resolver, in order
    pub extensions: Vec<String>,

    /// package.json fields consulted when resolving a directory
    pub main_fields: Vec<String>,

    /// Global name of the bundler's module registry entry point
    pub registry_global: String,

    /// Global name of the conventional output binding
    pub output_global: String,

    /// Maximum nesting of `require` evaluations
    pub max_require_depth: usize,

    /// Maximum number of scheduled tasks drained in one run
    pub max_tasks: usize,

    /// Contents of `process.env` in node contexts
    pub process_env: BTreeMap<String, String>,

    /// `location.origin` in browser contexts
    pub origin: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            extensions: vec![".js".to_string(), ".json".to_string()],
            main_fields: vec!["main".to_string()],
            registry_global: "parcelRequire".to_string(),
            output_global: "output".to_string(),
            max_require_depth: 256,
            max_tasks: 100_000,
            process_env: BTreeMap::from([("NODE_ENV".to_string(), "test".to_string())]),
            origin: "http://localhost".to_string(),
        }
    }
}

impl HarnessConfig {
    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a `.yaml`, `.yml` or `.json` file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| config::read_failed(path.display().to_string(), e))?;

        let parsed = if has_json_extension(path) {
            serde_json::from_str::<Self>(&content)
                .map_err(|e| config::parse_failed(path.display().to_string(), e))?
        } else {
            serde_yaml::from_str::<Self>(&content)
                .map_err(|e| config::parse_failed(path.display().to_string(), e))?
        };
        parsed.validate()?;
        Ok(parsed)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.extensions.is_empty() {
            return Err(config::invalid("extensions must not be empty"));
        }

        if let Some(bad) = self.extensions.iter().find(|ext| !ext.starts_with('.')) {
            return Err(config::invalid(format!(
                "extension '{}' must start with '.'",
                bad
            )));
        }

        for (field, value) in [
            ("registry_global", &self.registry_global),
            ("output_global", &self.output_global),
        ] {
            if value.trim().is_empty() {
                return Err(config::invalid(format!("{} must not be empty", field)));
            }
        }

        if self.max_require_depth == 0 || self.max_tasks == 0 {
            return Err(config::invalid(
                "max_require_depth and max_tasks must be positive",
            ));
        }

        Ok(())
    }
}
