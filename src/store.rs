//! File store backing the server
//!
//! The store is the directory subtree below a fixed root. Entries are
//! addressed by request targets ("/a/b.txt"), which are always resolved
//! relative to the root. Files can be read and created, never replaced or
//! deleted.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

/// Result type for file store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// File store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} resolves outside the store root")]
    OutsideRoot(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// File system subtree rooted at a configured path
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileStore { root: root.into() }
    }

    /// The store root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a target onto a path below the root
    ///
    /// Only plain components are accepted; `..`, a second root or a drive
    /// prefix would escape the subtree.
    pub fn resolve(&self, target: &str) -> Result<PathBuf> {
        let relative = Path::new(target.trim_start_matches('/'));
        let mut path = self.root.clone();

        for component in relative.components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(StoreError::OutsideRoot(target.to_string()));
                }
            }
        }

        if path == self.root {
            return Err(StoreError::NotFound(target.to_string()));
        }

        Ok(path)
    }

    /// Whether `target` names an existing regular file
    pub fn is_file(&self, target: &str) -> bool {
        self.resolve(target).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Whether anything exists at `target`
    pub fn exists(&self, target: &str) -> bool {
        self.resolve(target).map(|p| p.exists()).unwrap_or(false)
    }

    /// Read the full contents of the regular file at `target`
    pub fn read(&self, target: &str) -> Result<Vec<u8>> {
        let path = self.resolve(target)?;
        if !path.is_file() {
            return Err(StoreError::NotFound(target.to_string()));
        }

        fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound(target.to_string()),
            _ => StoreError::Io(e),
        })
    }

    /// Create a new file at `target` holding `contents`
    ///
    /// Creation is exclusive: an existing entry of any kind yields
    /// `AlreadyExists` and is left untouched. If writing fails after the
    /// file was created, the partial file is removed.
    pub fn create(&self, target: &str, contents: &[u8]) -> Result<()> {
        let path = self.resolve(target)?;

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => StoreError::AlreadyExists(target.to_string()),
                io::ErrorKind::NotFound => StoreError::NotFound(target.to_string()),
                _ => StoreError::Io(e),
            })?;

        if let Err(e) = file.write_all(contents).and_then(|_| file.sync_all()) {
            drop(file);
            let _ = fs::remove_file(&path);
            return Err(StoreError::Io(e));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve() {
        let store = FileStore::new("/srv/www");

        assert_eq!(
            store.resolve("/index.html").unwrap(),
            PathBuf::from("/srv/www/index.html")
        );
        assert_eq!(
            store.resolve("/docs/./a.txt").unwrap(),
            PathBuf::from("/srv/www/docs/a.txt")
        );
        assert!(matches!(
            store.resolve("/../etc/passwd"),
            Err(StoreError::OutsideRoot(_))
        ));
        assert!(matches!(
            store.resolve("/docs/../../x"),
            Err(StoreError::OutsideRoot(_))
        ));
        assert!(matches!(store.resolve("/"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_create_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        assert!(!store.exists("/new.txt"));
        store.create("/new.txt", b"data").unwrap();

        assert!(store.is_file("/new.txt"));
        assert_eq!(store.read("/new.txt").unwrap(), b"data");
        assert_eq!(fs::read(dir.path().join("new.txt")).unwrap(), b"data");
    }

    #[test]
    fn test_create_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store.create("/once.txt", b"first").unwrap();
        let err = store.create("/once.txt", b"second").unwrap_err();

        assert!(matches!(err, StoreError::AlreadyExists(_)));
        assert_eq!(store.read("/once.txt").unwrap(), b"first");
    }

    #[test]
    fn test_create_over_directory_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let store = FileStore::new(dir.path());

        assert!(matches!(
            store.create("/sub", b"x"),
            Err(StoreError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_create_in_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        assert!(matches!(
            store.create("/nope/file.txt", b"x"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_read_missing_and_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let store = FileStore::new(dir.path());

        assert!(matches!(store.read("/missing.txt"), Err(StoreError::NotFound(_))));
        assert!(matches!(store.read("/sub"), Err(StoreError::NotFound(_))));
        assert!(!store.is_file("/sub"));
        assert!(store.exists("/sub"));
    }
}
