//! Virtual file view consumed by the harness
//!
//! The harness never touches the real filesystem while executing bundles.
//! Everything is read through a [`FileView`], whose operations are async.
//! Script evaluation is synchronous, so the few places that must read a file
//! while JavaScript is running (module resolution, `fs` shim, simulated script
//! loads, `fetch`) go through [`block_on`], the single sync-over-async bridge.

mod memory;

use std::io;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

pub use memory::MemoryFs;

/// Kind of entry reported by [`FileView::stat`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    File,
    Directory,
}

/// Result of a stat call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub kind: FileKind,
    pub len: u64,
}

impl FileStat {
    pub fn is_file(&self) -> bool {
        self.kind == FileKind::File
    }

    pub fn is_directory(&self) -> bool {
        self.kind == FileKind::Directory
    }
}

/// Read-only async access to bundler output
#[async_trait]
pub trait FileView: Send + Sync {
    /// Read a file's raw bytes
    async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Stat a path, following symbolic links
    async fn stat(&self, path: &Path) -> io::Result<FileStat>;

    /// Read a file as UTF-8 text
    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let bytes = self.read_file(path).await?;
        String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

/// Block the current thread until `future` resolves.
///
/// Only module resolution and host bindings invoked from running scripts call
/// this; the public execution API stays async.
pub fn block_on<F: Future>(future: F) -> F::Output {
    futures_lite::future::block_on(future)
}

/// Synchronous probes over a [`FileView`], used while scripts run
pub(crate) trait FileViewExt {
    fn is_file_sync(&self, path: &Path) -> bool;
    fn is_dir_sync(&self, path: &Path) -> bool;
    fn read_sync(&self, path: &Path) -> io::Result<Vec<u8>>;
    fn read_string_sync(&self, path: &Path) -> io::Result<String>;
}

impl<T: FileView + ?Sized> FileViewExt for T {
    fn is_file_sync(&self, path: &Path) -> bool {
        block_on(self.stat(path)).is_ok_and(|stat| stat.is_file())
    }

    fn is_dir_sync(&self, path: &Path) -> bool {
        block_on(self.stat(path)).is_ok_and(|stat| stat.is_directory())
    }

    fn read_sync(&self, path: &Path) -> io::Result<Vec<u8>> {
        block_on(self.read_file(path))
    }

    fn read_string_sync(&self, path: &Path) -> io::Result<String> {
        block_on(self.read_to_string(path))
    }
}

/// Lexically normalize a virtual path.
///
/// Collapses `.` and `..` without consulting any filesystem, so symbolic
/// links stay in the path exactly as written.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let climbing = matches!(
                    out.components().next_back(),
                    None | Some(Component::ParentDir)
                );
                if !climbing {
                    out.pop();
                } else if !out.has_root() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Join `relative` onto `base` the way `path.join` does: a leading `/` on
/// `relative` does not reset to the root.
pub fn join_virtual(base: &Path, relative: &str) -> PathBuf {
    normalize_path(&base.join(relative.trim_start_matches('/')))
}

/// Whether `path` names a `.json` document
pub(crate) fn has_json_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Directory portion of a virtual path
pub fn dirname(path: &Path) -> PathBuf {
    path.parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_collapses_dots() {
        assert_eq!(
            normalize_path(Path::new("/dist/./a/../b/index.js")),
            PathBuf::from("/dist/b/index.js")
        );
    }

    #[test]
    fn test_normalize_path_root_parent() {
        assert_eq!(normalize_path(Path::new("/../a")), PathBuf::from("/a"));
    }

    #[test]
    fn test_join_virtual_ignores_leading_slash() {
        assert_eq!(
            join_virtual(Path::new("/dist"), "/chunk.js"),
            PathBuf::from("/dist/chunk.js")
        );
        assert_eq!(
            join_virtual(Path::new("/dist/js"), "../data.txt"),
            PathBuf::from("/dist/data.txt")
        );
    }

    #[test]
    fn test_dirname() {
        assert_eq!(dirname(Path::new("/dist/index.js")), PathBuf::from("/dist"));
        assert_eq!(dirname(Path::new("/")), PathBuf::from("/"));
    }
}
