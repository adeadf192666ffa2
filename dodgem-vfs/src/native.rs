//! Native OS file system implementation

use crate::error::{VfsError, VfsResult};
use crate::VirtualFileSystem;
use std::path::Path;

/// File system backed by the host OS.
///
/// Used by the CLI to read source files; the compile pipeline itself only
/// ever writes through `MemoryFileSystem`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeFileSystem;

impl NativeFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl VirtualFileSystem for NativeFileSystem {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => VfsError::NotFound {
                path: path.display().to_string(),
            },
            std::io::ErrorKind::PermissionDenied => VfsError::PermissionDenied {
                path: path.display().to_string(),
            },
            _ => VfsError::from(e),
        })
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()> {
        std::fs::write(path, content).map_err(VfsError::from)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn remove_file(&self, path: &Path) -> VfsResult<()> {
        std::fs::remove_file(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => VfsError::NotFound {
                path: path.display().to_string(),
            },
            _ => VfsError::from(e),
        })
    }

    fn list_files(&self, prefix: &Path) -> VfsResult<Vec<String>> {
        let dir = if prefix.is_dir() {
            prefix
        } else {
            prefix.parent().unwrap_or(Path::new("."))
        };

        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() && path.starts_with(prefix) {
                files.push(path.to_string_lossy().replace('\\', "/"));
            }
        }
        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_nonexistent() {
        let fs = NativeFileSystem::new();
        let result = fs.read_file(Path::new("/definitely/not/a/real/path.dg"));
        assert!(matches!(result.unwrap_err(), VfsError::NotFound { .. }));
    }

    #[test]
    fn test_exists_on_missing_path() {
        let fs = NativeFileSystem::new();
        assert!(!fs.exists(Path::new("/definitely/not/a/real/path.dg")));
    }
}
