//! In-memory file system implementation

use crate::error::{VfsError, VfsResult};
use crate::VirtualFileSystem;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

/// An in-memory file system implementation.
///
/// All files live in a `BTreeMap`; nothing is ever written to disk. Cloning
/// shares the underlying storage, so the compiler can hand a clone to its
/// output sink and the loader still sees the artifacts.
///
/// # Example
/// ```
/// use dodgem_vfs::{MemoryFileSystem, VirtualFileSystem};
/// use std::path::Path;
///
/// let fs = MemoryFileSystem::new();
/// fs.write_file(Path::new("/test.dg"), b"class A {}").unwrap();
/// let content = fs.read_file(Path::new("/test.dg")).unwrap();
/// assert_eq!(content, b"class A {}");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    files: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryFileSystem {
    /// Create a new empty memory file system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory file system pre-populated with files.
    pub fn with_files<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: AsRef<str>,
    {
        let fs = Self::new();
        {
            let mut map = fs.files.write().unwrap();
            for (path, content) in files {
                map.insert(path.as_ref().to_string(), content);
            }
        }
        fs
    }

    /// Normalize a path string for internal storage.
    /// Uses forward slashes consistently for cross-platform compatibility.
    fn normalize_path(path: &Path) -> String {
        path.to_string_lossy().replace('\\', "/")
    }
}

impl VirtualFileSystem for MemoryFileSystem {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let normalized = Self::normalize_path(path);
        let files = self.files.read().map_err(|_| VfsError::LockPoisoned {
            path: normalized.clone(),
        })?;

        files
            .get(&normalized)
            .cloned()
            .ok_or(VfsError::NotFound { path: normalized })
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()> {
        let normalized = Self::normalize_path(path);
        let mut files = self.files.write().map_err(|_| VfsError::LockPoisoned {
            path: normalized.clone(),
        })?;
        files.insert(normalized, content.to_vec());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let normalized = Self::normalize_path(path);
        match self.files.read() {
            Ok(files) => files.contains_key(&normalized),
            Err(_) => false,
        }
    }

    fn remove_file(&self, path: &Path) -> VfsResult<()> {
        let normalized = Self::normalize_path(path);
        let mut files = self.files.write().map_err(|_| VfsError::LockPoisoned {
            path: normalized.clone(),
        })?;
        files
            .remove(&normalized)
            .map(|_| ())
            .ok_or(VfsError::NotFound { path: normalized })
    }

    fn list_files(&self, prefix: &Path) -> VfsResult<Vec<String>> {
        let normalized = Self::normalize_path(prefix);
        let files = self.files.read().map_err(|_| VfsError::LockPoisoned {
            path: normalized.clone(),
        })?;
        Ok(files
            .keys()
            .filter(|k| k.starts_with(&normalized))
            .cloned()
            .collect())
    }
}
