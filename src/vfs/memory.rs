//! In-memory overlay filesystem

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use walkdir::WalkDir;

use super::{FileKind, FileStat, FileView, dirname, normalize_path};

/// Symlink chains longer than this are reported as loops
const MAX_LINK_HOPS: usize = 40;

#[derive(Debug, Clone)]
enum Node {
    File(Vec<u8>),
    Dir,
    Symlink(PathBuf),
}

type Nodes = BTreeMap<PathBuf, Node>;

/// A writable in-memory filesystem implementing [`FileView`]
#[derive(Debug)]
pub struct MemoryFs {
    nodes: RwLock<Nodes>,
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFs {
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(PathBuf::from("/"), Node::Dir);
        Self {
            nodes: RwLock::new(nodes),
        }
    }

    fn read_nodes(&self) -> RwLockReadGuard<'_, Nodes> {
        self.nodes.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_nodes(&self) -> RwLockWriteGuard<'_, Nodes> {
        self.nodes.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Create a directory and all of its ancestors
    pub fn mkdir_p(&self, path: impl AsRef<Path>) {
        let path = normalize_path(path.as_ref());
        let mut nodes = self.write_nodes();
        insert_dirs(&mut nodes, &path);
    }

    /// Write (or overwrite) a file, creating parent directories
    pub fn write_file(&self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) {
        let path = normalize_path(path.as_ref());
        let mut nodes = self.write_nodes();
        insert_dirs(&mut nodes, &dirname(&path));
        nodes.insert(path, Node::File(contents.into()));
    }

    /// Create a symbolic link at `link` pointing to `target`.
    ///
    /// Relative targets are interpreted from the link's directory.
    pub fn symlink(&self, target: impl AsRef<Path>, link: impl AsRef<Path>) {
        let link = normalize_path(link.as_ref());
        let mut nodes = self.write_nodes();
        insert_dirs(&mut nodes, &dirname(&link));
        nodes.insert(link, Node::Symlink(target.as_ref().to_path_buf()));
    }

    /// Remove a path and everything below it
    pub fn rimraf(&self, path: impl AsRef<Path>) {
        let path = normalize_path(path.as_ref());
        let mut nodes = self.write_nodes();
        nodes.retain(|key, _| !key.starts_with(&path));
        if path == Path::new("/") {
            nodes.insert(PathBuf::from("/"), Node::Dir);
        }
    }

    /// Whether anything exists at `path` after following links
    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        let nodes = self.read_nodes();
        resolve_links(&nodes, path.as_ref())
            .map(|resolved| nodes.contains_key(&resolved))
            .unwrap_or(false)
    }

    /// Snapshot every file under `real_dir` into this filesystem at `mount`.
    ///
    /// Returns the number of files copied.
    pub fn load_dir(&self, real_dir: &Path, mount: &Path) -> io::Result<usize> {
        let root = dunce::canonicalize(real_dir)?;
        let mut copied = 0;

        for entry in WalkDir::new(&root).follow_links(true) {
            let entry = entry.map_err(io::Error::other)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(&root).map_err(io::Error::other)?;
            let contents = std::fs::read(entry.path())?;
            let relative = relative.to_string_lossy().replace('\\', "/");
            self.write_file(mount.join(relative), contents);
            copied += 1;
        }

        tracing::debug!(root = %root.display(), mount = %mount.display(), copied, "loaded directory snapshot");
        Ok(copied)
    }
}

fn insert_dirs(nodes: &mut Nodes, dir: &Path) {
    let mut current = PathBuf::new();
    for component in dir.components() {
        current.push(component);
        nodes.entry(current.clone()).or_insert(Node::Dir);
    }
}

/// Follow symbolic links in every prefix of `path`
fn resolve_links(nodes: &Nodes, path: &Path) -> io::Result<PathBuf> {
    let mut current = normalize_path(path);

    for _ in 0..MAX_LINK_HOPS {
        let mut prefix = PathBuf::new();
        let mut redirected = None;

        for component in current.components() {
            prefix.push(component);
            if let Some(Node::Symlink(target)) = nodes.get(&prefix) {
                let rest = current.strip_prefix(&prefix).unwrap_or(Path::new(""));
                let base = if target.is_absolute() {
                    target.clone()
                } else {
                    dirname(&prefix).join(target)
                };
                redirected = Some(normalize_path(&base.join(rest)));
                break;
            }
        }

        match redirected {
            Some(next) => current = next,
            None => return Ok(current),
        }
    }

    Err(io::Error::other(format!(
        "too many levels of symbolic links: {}",
        path.display()
    )))
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("no such file or directory: {}", path.display()),
    )
}

#[async_trait]
impl FileView for MemoryFs {
    async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        let nodes = self.read_nodes();
        let resolved = resolve_links(&nodes, path)?;
        match nodes.get(&resolved) {
            Some(Node::File(bytes)) => Ok(bytes.clone()),
            Some(_) => Err(io::Error::other(format!(
                "is a directory: {}",
                path.display()
            ))),
            None => Err(not_found(path)),
        }
    }

    async fn stat(&self, path: &Path) -> io::Result<FileStat> {
        let nodes = self.read_nodes();
        let resolved = resolve_links(&nodes, path)?;
        match nodes.get(&resolved) {
            Some(Node::File(bytes)) => Ok(FileStat {
                kind: FileKind::File,
                len: bytes.len() as u64,
            }),
            Some(_) => Ok(FileStat {
                kind: FileKind::Directory,
                len: 0,
            }),
            None => Err(not_found(path)),
        }
    }
}
