//! Bundle layout assertions
//!
//! Compares the bundles a graph actually produced against a declared layout.
//! Both sides are put in a canonical order first (assets case-insensitively,
//! bundles by their first asset), so declaration order never matters.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;
use wax::{CandidatePath, Glob, Pattern};

use crate::error::{HarnessError, Result, config, layout};
use crate::graph::{BundleGraph, base_name};

/// How an expected bundle's name is matched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NameMatcher {
    /// Exact bundle name
    Exact(String),
    /// Glob matched against the bundle's base filename
    Pattern { glob: String },
}

impl NameMatcher {
    pub fn exact(name: impl Into<String>) -> Self {
        NameMatcher::Exact(name.into())
    }

    pub fn glob(pattern: impl Into<String>) -> Self {
        NameMatcher::Pattern {
            glob: pattern.into(),
        }
    }

    /// Exact names compare with the display name, patterns with the base
    /// filename
    fn matches(&self, bundle: &ActualBundle) -> Result<bool> {
        match self {
            NameMatcher::Exact(expected) => Ok(expected == &bundle.name),
            NameMatcher::Pattern { glob } => {
                let pattern = Glob::new(glob).map_err(|e| {
                    config::invalid_layout(format!("invalid name pattern '{}': {}", glob, e))
                })?;
                let candidate = CandidatePath::from(bundle.file_name.as_str());
                Ok(pattern.matched(&candidate).is_some())
            }
        }
    }

    fn subject<'a>(&self, bundle: &'a ActualBundle) -> &'a str {
        match self {
            NameMatcher::Exact(_) => &bundle.name,
            NameMatcher::Pattern { .. } => &bundle.file_name,
        }
    }
}

impl fmt::Display for NameMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameMatcher::Exact(name) => write!(f, "'{}'", name),
            NameMatcher::Pattern { glob } => write!(f, "pattern '{}'", glob),
        }
    }
}

impl From<&str> for NameMatcher {
    fn from(name: &str) -> Self {
        NameMatcher::exact(name)
    }
}

/// One bundle of a declared layout
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedBundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<NameMatcher>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub bundle_type: Option<String>,

    /// Base filenames of the bundle's assets; required
    #[serde(default)]
    pub assets: Option<Vec<String>>,
}

impl ExpectedBundle {
    /// Expect a bundle made of exactly these assets
    pub fn with_assets<I, S>(assets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: None,
            bundle_type: None,
            assets: Some(assets.into_iter().map(Into::into).collect()),
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<NameMatcher>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn of_type(mut self, bundle_type: impl Into<String>) -> Self {
        self.bundle_type = Some(bundle_type.into());
        self
    }

    /// Parse a YAML list of expected bundles
    pub fn list_from_yaml(yaml: &str) -> Result<Vec<Self>> {
        serde_yaml::from_str(yaml).map_err(|e| config::invalid_layout(e.to_string()))
    }

    /// Parse a JSON list of expected bundles
    pub fn list_from_json(json: &str) -> Result<Vec<Self>> {
        serde_json::from_str(json).map_err(|e| config::invalid_layout(e.to_string()))
    }

    /// Load a `.json`, `.yaml` or `.yml` list of expected bundles
    pub fn list_from_file(path: &Path) -> Result<Vec<Self>> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| config::read_failed(path.display().to_string(), e))?;
        if crate::vfs::has_json_extension(path) {
            Self::list_from_json(&content)
        } else {
            Self::list_from_yaml(&content)
        }
    }
}

impl From<&str> for ExpectedBundle {
    fn from(asset: &str) -> Self {
        ExpectedBundle::with_assets([asset])
    }
}

/// A bundle as the graph reports it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActualBundle {
    pub name: String,
    /// Base filename of the bundle's output file
    pub file_name: String,
    pub bundle_type: String,
    pub assets: Vec<String>,
}

/// Collect `{name, type, assets}` for every bundle, in canonical order
pub fn actual_layout(graph: &dyn BundleGraph) -> Vec<ActualBundle> {
    let mut bundles: Vec<ActualBundle> = graph
        .bundles()
        .into_iter()
        .map(|bundle| {
            let mut assets = Vec::new();
            bundle.traverse_assets(&mut |asset| assets.push(base_name(asset.file_path())));
            sort_assets(&mut assets);
            ActualBundle {
                name: bundle.name(),
                file_name: base_name(bundle.file_path()),
                bundle_type: bundle.bundle_type().to_string(),
                assets,
            }
        })
        .collect();
    bundles.sort_by(|a, b| first(&a.assets).cmp(first(&b.assets)));
    bundles
}

/// Check that `graph` is laid out as `expected` describes
pub fn assert_bundle_layout(graph: &dyn BundleGraph, expected: &[ExpectedBundle]) -> Result<()> {
    let mut expected: Vec<(&ExpectedBundle, Vec<String>)> = expected
        .iter()
        .enumerate()
        .map(|(index, bundle)| {
            let mut assets = bundle.assets.clone().ok_or_else(|| {
                config::invalid_layout(format!("expected bundle #{} has no assets list", index + 1))
            })?;
            sort_assets(&mut assets);
            Ok((bundle, assets))
        })
        .collect::<Result<_>>()?;
    expected.sort_by(|a, b| first(&a.1).cmp(first(&b.1)));

    let actual = actual_layout(graph);
    debug!(expected = expected.len(), actual = actual.len(), "comparing bundle layout");

    if expected.len() != actual.len() {
        return Err(layout::count_mismatch(expected.len(), actual.len()));
    }

    for ((want, want_assets), got) in expected.iter().zip(&actual) {
        if let Some(name) = &want.name {
            if !name.matches(got)? {
                return Err(layout::name_mismatch(name.to_string(), name.subject(got)));
            }
        }

        if let Some(bundle_type) = &want.bundle_type {
            if bundle_type != &got.bundle_type {
                return Err(layout::type_mismatch(&got.name, bundle_type, &got.bundle_type));
            }
        }

        if want_assets != &got.assets {
            return Err(layout::assets_mismatch(&got.name, want_assets, &got.assets));
        }
    }

    Ok(())
}

/// Panicking form of [`assert_bundle_layout`] for use inside tests
#[track_caller]
#[allow(clippy::panic)]
pub fn assert_bundles(graph: &dyn BundleGraph, expected: &[ExpectedBundle]) {
    if let Err(err) = assert_bundle_layout(graph, expected) {
        panic!("bundle layout assertion failed: {}", err);
    }
}

/// Whether an error came from a layout comparison rather than bad input
pub fn is_mismatch(err: &HarnessError) -> bool {
    matches!(
        err,
        HarnessError::BundleCountMismatch { .. }
            | HarnessError::BundleNameMismatch { .. }
            | HarnessError::BundleTypeMismatch { .. }
            | HarnessError::BundleAssetsMismatch { .. }
    )
}

fn sort_assets(assets: &mut [String]) {
    assets.sort_by_key(|asset| asset.to_lowercase());
}

fn first(assets: &[String]) -> &str {
    assets.first().map(String::as_str).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{AssetRecord, BundleRecord, GraphManifest};

    fn graph() -> GraphManifest {
        GraphManifest::new()
            .bundle(
                BundleRecord::new("js", "/dist/b.js")
                    .entry_asset(AssetRecord::new("1", "/src/b.js", "browser"))
                    .asset(AssetRecord::new("2", "/src/Shared.js", "browser")),
            )
            .bundle(
                BundleRecord::new("js", "/dist/index.js")
                    .entry_asset(AssetRecord::new("3", "/src/index.js", "browser")),
            )
    }

    #[test]
    fn test_order_insensitive() {
        let expected = vec![
            ExpectedBundle::with_assets(["index.js"]),
            ExpectedBundle::with_assets(["Shared.js", "b.js"]),
        ];
        assert!(assert_bundle_layout(&graph(), &expected).is_ok());
    }

    #[test]
    fn test_assets_sorted_case_insensitively() {
        let actual = actual_layout(&graph());
        assert_eq!(actual[0].assets, vec!["b.js", "Shared.js"]);
        assert_eq!(actual[1].name, "index.js");
    }

    #[test]
    fn test_count_mismatch() {
        let err = assert_bundle_layout(&graph(), &[ExpectedBundle::with_assets(["index.js"])])
            .unwrap_err();
        assert!(matches!(
            err,
            HarnessError::BundleCountMismatch {
                expected: 1,
                actual: 2
            }
        ));
        assert_eq!(err.to_string(), "Expected 1 bundles, got 2");
        assert!(is_mismatch(&err));
    }

    #[test]
    fn test_exact_name_and_type() {
        let expected = vec![
            ExpectedBundle::with_assets(["b.js", "Shared.js"])
                .named("b.js")
                .of_type("js"),
            ExpectedBundle::with_assets(["index.js"]).named("index.js"),
        ];
        assert!(assert_bundle_layout(&graph(), &expected).is_ok());

        let wrong_type = vec![
            ExpectedBundle::with_assets(["b.js", "Shared.js"]).of_type("css"),
            ExpectedBundle::with_assets(["index.js"]),
        ];
        let err = assert_bundle_layout(&graph(), &wrong_type).unwrap_err();
        assert!(matches!(err, HarnessError::BundleTypeMismatch { .. }));
    }

    #[test]
    fn test_glob_name() {
        let expected = vec![
            ExpectedBundle::with_assets(["b.js", "Shared.js"]).named(NameMatcher::glob("*.js")),
            ExpectedBundle::with_assets(["index.js"]).named(NameMatcher::glob("index.*")),
        ];
        assert!(assert_bundle_layout(&graph(), &expected).is_ok());

        let mismatch = vec![
            ExpectedBundle::with_assets(["b.js", "Shared.js"]).named(NameMatcher::glob("*.css")),
            ExpectedBundle::with_assets(["index.js"]),
        ];
        let err = assert_bundle_layout(&graph(), &mismatch).unwrap_err();
        assert!(matches!(err, HarnessError::BundleNameMismatch { .. }));
        assert!(err.to_string().contains("pattern '*.css'"));
    }

    #[test]
    fn test_glob_matches_file_name_not_display_name() {
        let mut bundle = BundleRecord::new("js", "/dist/index.1a2b.js")
            .entry_asset(AssetRecord::new("1", "/src/index.js", "browser"));
        bundle.name = Some("main".to_string());
        let graph = GraphManifest::new().bundle(bundle);

        let by_pattern =
            vec![ExpectedBundle::with_assets(["index.js"]).named(NameMatcher::glob("index.*.js"))];
        assert!(assert_bundle_layout(&graph, &by_pattern).is_ok());

        let by_name = vec![ExpectedBundle::with_assets(["index.js"]).named("main")];
        assert!(assert_bundle_layout(&graph, &by_name).is_ok());

        let wrong =
            vec![ExpectedBundle::with_assets(["index.js"]).named(NameMatcher::glob("main*"))];
        let err = assert_bundle_layout(&graph, &wrong).unwrap_err();
        assert!(err.to_string().contains("got 'index.1a2b.js'"));
    }

    #[test]
    fn test_asset_mismatch() {
        let expected = vec![
            ExpectedBundle::with_assets(["b.js"]),
            ExpectedBundle::with_assets(["index.js"]),
        ];
        let err = assert_bundle_layout(&graph(), &expected).unwrap_err();
        assert!(matches!(err, HarnessError::BundleAssetsMismatch { .. }));
        assert!(err.to_string().contains("b.js, Shared.js"));
    }

    #[test]
    fn test_missing_assets_is_usage_error() {
        let expected = vec![
            ExpectedBundle {
                name: Some(NameMatcher::exact("b.js")),
                ..Default::default()
            },
            ExpectedBundle::with_assets(["index.js"]),
        ];
        let err = assert_bundle_layout(&graph(), &expected).unwrap_err();
        assert!(matches!(err, HarnessError::InvalidLayout { .. }));
        assert!(!is_mismatch(&err));
    }

    #[test]
    fn test_yaml_layout() {
        let expected = ExpectedBundle::list_from_yaml(
            r#"
- name: index.js
  assets: [index.js]
- name: { glob: "b.*" }
  type: js
  assets: [b.js, Shared.js]
"#,
        )
        .unwrap();
        assert_eq!(expected[1].name, Some(NameMatcher::glob("b.*")));
        assert!(assert_bundle_layout(&graph(), &expected).is_ok());
    }

    #[test]
    #[should_panic(expected = "bundle layout assertion failed")]
    fn test_assert_bundles_panics() {
        assert_bundles(&graph(), &[]);
    }
}
