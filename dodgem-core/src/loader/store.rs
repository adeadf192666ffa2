//! In-memory artifact store

use std::path::Path;

use dodgem_vfs::{MemoryFileSystem, VfsResult, VirtualFileSystem};

/// Compiled artifact file extension
pub const ARTIFACT_EXTENSION: &str = "dgc";

const CLASS_ROOT: &str = "/classes";

/// Destination for compiled artifacts. The compiler writes through this
/// trait so it never decides where bytes land.
pub trait ArtifactSink {
    fn write_artifact(&self, fqn: &str, bytes: &[u8]) -> VfsResult<()>;
}

/// Artifact store backed by an in-memory filesystem. Clones share the
/// same underlying storage.
#[derive(Debug, Clone, Default)]
pub struct ArtifactStore {
    fs: MemoryFileSystem,
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn path_for(fqn: &str) -> String {
        format!("{CLASS_ROOT}/{fqn}.{ARTIFACT_EXTENSION}")
    }

    pub fn contains(&self, fqn: &str) -> bool {
        self.fs.exists(Path::new(&Self::path_for(fqn)))
    }

    pub fn get(&self, fqn: &str) -> Option<Vec<u8>> {
        self.fs.read_file(Path::new(&Self::path_for(fqn))).ok()
    }

    /// Fully-qualified names of every stored artifact
    pub fn names(&self) -> Vec<String> {
        let prefix = format!("{CLASS_ROOT}/");
        let suffix = format!(".{ARTIFACT_EXTENSION}");
        self.fs
            .list_files(Path::new(&prefix))
            .unwrap_or_default()
            .into_iter()
            .filter_map(|path| {
                path.strip_prefix(&prefix)?
                    .strip_suffix(&suffix)
                    .map(|fqn| fqn.to_string())
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.names().len()
    }

    pub fn is_empty(&self) -> bool {
        self.names().is_empty()
    }

    /// Copy every artifact into another store. Used to publish a staging
    /// store's contents in one pass after a fully clean compile.
    pub fn commit_into(&self, target: &ArtifactStore) -> VfsResult<()> {
        for fqn in self.names() {
            if let Some(bytes) = self.get(&fqn) {
                target.write_artifact(&fqn, &bytes)?;
            }
        }
        Ok(())
    }
}

impl ArtifactSink for ArtifactStore {
    fn write_artifact(&self, fqn: &str, bytes: &[u8]) -> VfsResult<()> {
        self.fs.write_file(Path::new(&Self::path_for(fqn)), bytes)
    }
}
