//! Source units and their in-memory materialization

use dodgem_vfs::{MemoryFileSystem, VfsResult, VirtualFileSystem};

/// Source file extension
pub const SOURCE_EXTENSION: &str = "dg";

const SOURCE_ROOT: &str = "/src";

/// One compilation unit: the name it is submitted under plus its source
/// text, held verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    unit_name: String,
    source_text: String,
}

impl SourceUnit {
    pub fn new(unit_name: impl Into<String>, source_text: impl Into<String>) -> Self {
        Self {
            unit_name: unit_name.into(),
            source_text: source_text.into(),
        }
    }

    pub fn unit_name(&self) -> &str {
        &self.unit_name
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    /// Path the unit occupies in a session filesystem
    pub fn memory_path(&self) -> String {
        format!("{SOURCE_ROOT}/{}.{SOURCE_EXTENSION}", self.unit_name)
    }

    /// Write the unmodified source text into the session filesystem;
    /// returns the path written
    pub fn materialize_into(&self, fs: &MemoryFileSystem) -> VfsResult<String> {
        let path = self.memory_path();
        fs.write_file(std::path::Path::new(&path), self.source_text.as_bytes())?;
        Ok(path)
    }
}
