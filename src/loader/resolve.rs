//! Node-style module resolution over the virtual file view
//!
//! Paths are normalized lexically and never canonicalized, so a module reached
//! through a symlinked `node_modules` entry keeps the path it was required by.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::HarnessConfig;
use crate::vfs::{FileView, FileViewExt, normalize_path};

/// Core modules of the real runtime; never looked up on disk
const CORE_MODULES: &[&str] = &[
    "assert",
    "buffer",
    "child_process",
    "crypto",
    "events",
    "fs",
    "http",
    "https",
    "module",
    "net",
    "os",
    "path",
    "querystring",
    "stream",
    "string_decoder",
    "timers",
    "tty",
    "url",
    "util",
    "vm",
    "worker_threads",
    "zlib",
];

/// Where a specifier leads
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Resolution {
    /// A file inside the virtual file view
    File(PathBuf),
    /// A module the host environment has to provide
    Host(String),
}

pub(crate) struct Resolver<'a> {
    files: &'a dyn FileView,
    extensions: &'a [String],
    main_fields: &'a [String],
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(files: &'a dyn FileView, config: &'a HarnessConfig) -> Self {
        Self {
            files,
            extensions: &config.extensions,
            main_fields: &config.main_fields,
        }
    }

    /// Resolve `specifier` as required from a file in `basedir`.
    ///
    /// Relative and absolute specifiers must exist in the file view. Core
    /// modules, and bare names no `node_modules` directory provides, fall
    /// through to the host.
    pub(crate) fn resolve(&self, specifier: &str, basedir: &Path) -> Option<Resolution> {
        if specifier.is_empty() {
            return None;
        }

        if let Some(core) = core_module(specifier) {
            return Some(Resolution::Host(core.to_string()));
        }

        if is_path_specifier(specifier) {
            let target = normalize_path(&basedir.join(specifier));
            let found = self
                .load_as_file(&target)
                .or_else(|| self.load_as_directory(&target));
            debug!(specifier, basedir = %basedir.display(), found = ?found, "resolved path specifier");
            return found.map(Resolution::File);
        }

        match self.load_node_modules(specifier, basedir) {
            Some(path) => {
                debug!(specifier, path = %path.display(), "resolved package");
                Some(Resolution::File(path))
            }
            None => Some(Resolution::Host(specifier.to_string())),
        }
    }

    fn load_as_file(&self, path: &Path) -> Option<PathBuf> {
        if self.files.is_file_sync(path) {
            return Some(path.to_path_buf());
        }
        self.extensions.iter().find_map(|ext| {
            let mut candidate = path.as_os_str().to_owned();
            candidate.push(ext);
            let candidate = PathBuf::from(candidate);
            self.files.is_file_sync(&candidate).then_some(candidate)
        })
    }

    fn load_index(&self, dir: &Path) -> Option<PathBuf> {
        self.extensions.iter().find_map(|ext| {
            let candidate = dir.join(format!("index{}", ext));
            self.files.is_file_sync(&candidate).then_some(candidate)
        })
    }

    fn load_as_directory(&self, dir: &Path) -> Option<PathBuf> {
        if !self.files.is_dir_sync(dir) {
            return None;
        }

        let manifest = dir.join("package.json");
        if self.files.is_file_sync(&manifest) {
            for main in self.package_mains(&manifest) {
                let target = normalize_path(&dir.join(&main));
                if let Some(found) = self.load_as_file(&target).or_else(|| self.load_index(&target)) {
                    return Some(found);
                }
            }
        }

        self.load_index(dir)
    }

    /// Entry points named by `package.json`, in configured field order
    fn package_mains(&self, manifest: &Path) -> Vec<String> {
        let parsed = self
            .files
            .read_string_sync(manifest)
            .ok()
            .and_then(|text| serde_json::from_str::<serde_json::Value>(&text).ok());

        let Some(package) = parsed else {
            warn!(manifest = %manifest.display(), "ignoring unreadable package.json");
            return Vec::new();
        };

        self.main_fields
            .iter()
            .filter_map(|field| package.get(field).and_then(|v| v.as_str()))
            .filter(|main| !main.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn load_node_modules(&self, specifier: &str, basedir: &Path) -> Option<PathBuf> {
        basedir
            .ancestors()
            .filter(|dir| dir.file_name().is_none_or(|name| name != "node_modules"))
            .find_map(|dir| {
                let target = normalize_path(&dir.join("node_modules").join(specifier));
                self.load_as_file(&target)
                    .or_else(|| self.load_as_directory(&target))
            })
    }
}

fn is_path_specifier(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
        || specifier.starts_with('/')
}

fn core_module(specifier: &str) -> Option<&str> {
    if let Some(name) = specifier.strip_prefix("node:") {
        return Some(name);
    }
    CORE_MODULES.contains(&specifier).then_some(specifier)
}
