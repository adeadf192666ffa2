//! VirtualFileSystem trait definition

use crate::error::VfsResult;
use std::path::Path;

/// Virtual File System trait
///
/// Provides a unified interface for file operations, decoupling the compiler
/// pipeline from any particular storage backend.
///
/// # Implementations
/// - `MemoryFileSystem`: In-memory file system (sources and compiled
///   artifacts never touch disk)
/// - `NativeFileSystem`: Native OS file system (CLI source input)
pub trait VirtualFileSystem: Send + Sync {
    /// Read file contents as bytes
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>>;

    /// Write file contents, creating the file if absent and truncating it
    /// otherwise
    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()>;

    /// Check whether the path exists
    fn exists(&self, path: &Path) -> bool;

    /// Remove a file; `NotFound` if it does not exist
    fn remove_file(&self, path: &Path) -> VfsResult<()>;

    /// List every file path that starts with the given prefix
    fn list_files(&self, prefix: &Path) -> VfsResult<Vec<String>>;
}
