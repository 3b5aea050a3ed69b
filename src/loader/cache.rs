//! Per-run module cache
//!
//! Entries go in before a module's code runs, so a cyclic `require` sees the
//! partially populated `module.exports` instead of evaluating twice.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use boa_engine::JsValue;

use crate::context::ExecutionContext;

#[derive(Debug, Default)]
pub(crate) struct ModuleCache {
    modules: HashMap<PathBuf, ExecutionContext>,
    host: HashMap<String, JsValue>,
}

impl ModuleCache {
    pub(crate) fn get(&self, path: &Path) -> Option<&ExecutionContext> {
        self.modules.get(path)
    }

    pub(crate) fn insert(&mut self, path: PathBuf, context: ExecutionContext) {
        self.modules.insert(path, context);
    }

    /// Forget a module whose evaluation threw
    pub(crate) fn remove(&mut self, path: &Path) -> Option<ExecutionContext> {
        self.modules.remove(path)
    }

    pub(crate) fn host(&self, name: &str) -> Option<JsValue> {
        self.host.get(name).cloned()
    }

    pub(crate) fn insert_host(&mut self, name: &str, exports: JsValue) {
        self.host.insert(name.to_string(), exports);
    }

    /// Cached file paths, sorted
    pub(crate) fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.modules.keys().cloned().collect();
        paths.sort();
        paths
    }

    pub(crate) fn clear(&mut self) {
        self.modules.clear();
        self.host.clear();
    }
}
