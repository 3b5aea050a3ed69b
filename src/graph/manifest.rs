//! Serializable bundle graph (graph.yaml / graph.json)

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{AssetView, BundleGraph, BundleView};
use crate::error::{Result, config};
use crate::vfs::has_json_extension;

/// Bundle graph as written by the bundler's reporter
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct GraphManifest {
    #[serde(default)]
    pub bundles: Vec<BundleRecord>,
}

/// One bundle in the manifest
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BundleRecord {
    /// Display name; defaults to the base filename of `file_path`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "type")]
    pub bundle_type: String,

    pub file_path: PathBuf,

    /// Id of the main entry asset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,

    #[serde(default)]
    pub assets: Vec<AssetRecord>,
}

/// One asset in the manifest
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    pub id: String,
    pub file_path: PathBuf,
    #[serde(default)]
    pub env: AssetEnv,
}

/// Declared environment of an asset
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssetEnv {
    pub context: String,
}

impl Default for AssetEnv {
    fn default() -> Self {
        Self {
            context: "browser".to_string(),
        }
    }
}

impl GraphManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a bundle
    #[must_use]
    pub fn bundle(mut self, bundle: BundleRecord) -> Self {
        self.bundles.push(bundle);
        self
    }

    /// Parse a manifest from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let manifest: Self = serde_yaml::from_str(yaml)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Parse a manifest from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let manifest: Self = serde_json::from_str(json)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Load a manifest from a `.yaml`, `.yml` or `.json` file
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

    /// Check entry references and single ownership of assets
    pub fn validate(&self) -> Result<()> {
        let mut owners: HashMap<&str, &Path> = HashMap::new();

        for bundle in &self.bundles {
            for asset in &bundle.assets {
                let owner = bundle.file_path.as_path();
                if let Some(previous) = owners.insert(asset.id.as_str(), owner) {
                    return Err(config::invalid(format!(
                        "asset '{}' belongs to both {} and {}",
                        asset.id,
                        previous.display(),
                        bundle.file_path.display()
                    )));
                }
            }

            if let Some(entry) = &bundle.entry {
                if !bundle.assets.iter().any(|asset| &asset.id == entry) {
                    return Err(config::invalid(format!(
                        "entry '{}' of {} is not one of its assets",
                        entry,
                        bundle.file_path.display()
                    )));
                }
            }
        }

        Ok(())
    }
}

impl BundleRecord {
    pub fn new(bundle_type: impl Into<String>, file_path: impl Into<PathBuf>) -> Self {
        Self {
            name: None,
            bundle_type: bundle_type.into(),
            file_path: file_path.into(),
            entry: None,
            assets: Vec::new(),
        }
    }

    /// Append an asset
    #[must_use]
    pub fn asset(mut self, asset: AssetRecord) -> Self {
        self.assets.push(asset);
        self
    }

    /// Append an asset and mark it as the main entry
    #[must_use]
    pub fn entry_asset(mut self, asset: AssetRecord) -> Self {
        self.entry = Some(asset.id.clone());
        self.assets.push(asset);
        self
    }
}

impl AssetRecord {
    pub fn new(
        id: impl Into<String>,
        file_path: impl Into<PathBuf>,
        context: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            file_path: file_path.into(),
            env: AssetEnv {
                context: context.into(),
            },
        }
    }
}

impl BundleGraph for GraphManifest {
    fn traverse_bundles<'a>(&'a self, visit: &mut dyn FnMut(&'a dyn BundleView)) {
        for bundle in &self.bundles {
            visit(bundle);
        }
    }
}

impl BundleView for BundleRecord {
    fn bundle_type(&self) -> &str {
        &self.bundle_type
    }

    fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn main_entry(&self) -> Option<&dyn AssetView> {
        let entry = self.entry.as_deref()?;
        self.assets
            .iter()
            .find(|asset| asset.id == entry)
            .map(|asset| asset as &dyn AssetView)
    }

    fn traverse_assets<'a>(&'a self, visit: &mut dyn FnMut(&'a dyn AssetView)) {
        for asset in &self.assets {
            visit(asset);
        }
    }

    fn name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| super::base_name(&self.file_path))
    }
}

impl AssetView for AssetRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn env_context(&self) -> &str {
        &self.env.context
    }
}
