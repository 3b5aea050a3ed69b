//! Common test utilities for bundle-harness integration tests

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use bundle_harness::graph::{AssetRecord, BundleRecord};
use bundle_harness::{
    ExecuteOptions, Execution, Globals, GraphManifest, Harness, HarnessConfig, MemoryFs, Result,
};
use tempfile::TempDir;

/// In-memory bundler output plus the graph describing it
pub struct Fixture {
    pub files: Arc<MemoryFs>,
    pub graph: GraphManifest,
    pub config: HarnessConfig,
    pub host_modules: Vec<(String, String)>,
}

impl Fixture {
    /// One js bundle at `/dist/index.js` whose entry asset runs in `context`
    pub fn new(context: &str, source: &str) -> Self {
        let files = Arc::new(MemoryFs::new());
        files.write_file("/dist/index.js", source);
        Self {
            files,
            graph: single_bundle("/dist/index.js", context),
            config: HarnessConfig::default(),
            host_modules: Vec::new(),
        }
    }

    pub fn node(source: &str) -> Self {
        Self::new("node", source)
    }

    pub fn browser(source: &str) -> Self {
        Self::new("browser", source)
    }

    /// Add a file to the virtual output
    pub fn file(self, path: &str, contents: &str) -> Self {
        self.files.write_file(path, contents);
        self
    }

    pub fn host_module(mut self, name: &str, source: &str) -> Self {
        self.host_modules.push((name.to_string(), source.to_string()));
        self
    }

    pub fn harness(&self) -> Harness {
        let mut harness = Harness::new(self.files.clone()).with_config(self.config.clone());
        for (name, source) in &self.host_modules {
            harness = harness.with_host_module(name.clone(), source.clone());
        }
        harness
    }

    pub fn execute(&self) -> Result<Execution> {
        self.execute_with(Globals::new(), ExecuteOptions::default())
    }

    pub fn execute_with(&self, globals: Globals, options: ExecuteOptions) -> Result<Execution> {
        futures_lite::future::block_on(self.harness().execute(&self.graph, globals, options))
    }

    /// Execute and return the export as JSON, panicking on failure
    pub fn json(&self) -> serde_json::Value {
        let mut execution = self.execute().expect("execution failed");
        execution.to_json().expect("export is not JSON")
    }
}

/// A graph with a single js bundle whose entry asset runs in `context`
pub fn single_bundle(file_path: &str, context: &str) -> GraphManifest {
    GraphManifest::new().bundle(
        BundleRecord::new("js", file_path)
            .entry_asset(AssetRecord::new("entry", "/src/index.js", context)),
    )
}

/// A temporary output directory for CLI tests
pub struct TestOutput {
    pub temp: TempDir,
    pub path: PathBuf,
}

impl TestOutput {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().to_path_buf();
        Self { temp, path }
    }

    /// Write a file below the output directory
    pub fn write_file(&self, path: &str, content: &str) -> PathBuf {
        let file_path = self.path.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }
}

impl Default for TestOutput {
    fn default() -> Self {
        Self::new()
    }
}
