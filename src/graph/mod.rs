//! Bundle graph contract consumed by the harness
//!
//! The bundler owns the graph; the harness only walks it. [`GraphManifest`]
//! is a serializable implementation for graphs written to disk or built in
//! tests.

mod manifest;

use std::path::Path;

pub use manifest::{AssetEnv, AssetRecord, BundleRecord, GraphManifest};

/// A queryable graph of output bundles
pub trait BundleGraph {
    /// Visit every bundle in traversal order
    fn traverse_bundles<'a>(&'a self, visit: &mut dyn FnMut(&'a dyn BundleView));

    /// Collect bundles in traversal order
    fn bundles(&self) -> Vec<&dyn BundleView> {
        let mut bundles = Vec::new();
        self.traverse_bundles(&mut |bundle| bundles.push(bundle));
        bundles
    }
}

/// One output bundle
pub trait BundleView {
    /// Output type (`js`, `css`, ...)
    fn bundle_type(&self) -> &str;

    /// Resolved output file path
    fn file_path(&self) -> &Path;

    /// Main entry asset, if the bundle has one
    fn main_entry(&self) -> Option<&dyn AssetView>;

    /// Visit every constituent asset
    fn traverse_assets<'a>(&'a self, visit: &mut dyn FnMut(&'a dyn AssetView));

    /// Bundle name, the base filename of its output path
    fn name(&self) -> String {
        base_name(self.file_path())
    }
}

/// One source-level asset tracked inside a bundle
pub trait AssetView {
    fn id(&self) -> &str;

    fn file_path(&self) -> &Path;

    /// Declared execution environment (`browser`, `node`, `electron`)
    fn env_context(&self) -> &str;
}

/// Base filename of a path, empty when there is none
pub fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
