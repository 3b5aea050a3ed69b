//! bundle-harness - sandboxed execution of bundler output
//!
//! Runs the bundles a module bundler produced against a virtual file view, in
//! a browser, node or electron flavored context, and hands back what the entry
//! bundle exported. A separate assertion engine checks how a bundle graph is
//! split into bundles.
//!
//! ```no_run
//! use std::sync::Arc;
//! use bundle_harness::{ExecuteOptions, Globals, GraphManifest, Harness, MemoryFs};
//!
//! # fn main() -> bundle_harness::Result<()> {
//! let files = Arc::new(MemoryFs::new());
//! files.write_file("/dist/index.js", "module.exports = 42;");
//! let graph = GraphManifest::from_yaml(
//!     "bundles:\n  - type: js\n    filePath: /dist/index.js\n    entry: a\n    assets:\n      - { id: a, filePath: /src/index.js, env: { context: node } }\n",
//! )?;
//!
//! let mut execution = futures_lite::future::block_on(
//!     Harness::new(files).execute(&graph, Globals::new(), ExecuteOptions::default()),
//! )?;
//! assert_eq!(execution.to_json()?, serde_json::json!(42));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod graph;
pub mod layout;
pub mod scheduler;
pub mod text;
pub mod vfs;

mod js;
mod loader;
mod runtime;

pub use config::HarnessConfig;
pub use context::{GlobalValue, Globals, Target};
pub use error::{HarnessError, Result};
pub use executor::{ExecuteOptions, Execution, Harness};
pub use graph::{AssetView, BundleGraph, BundleView, GraphManifest};
pub use layout::{ExpectedBundle, NameMatcher, assert_bundle_layout, assert_bundles};
pub use runtime::{ConsoleLevel, ConsoleMessage};
pub use text::normalize_newlines;
pub use vfs::{FileView, MemoryFs};
