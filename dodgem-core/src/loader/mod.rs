//! Class loading: local-store-first resolution with parent fallback
//!
//! Each loader instance gets a process-unique id, and every class it
//! resolves from its own store carries that id in its [`TypeId`]. Two
//! loaders given identical bytes therefore produce classes that behave the
//! same but are distinct types, mirroring loader-scoped type identity.

pub mod store;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dodgem_config::Phase;
use dodgem_log::{debug, Logger};

use crate::binary::{decode_class, ReadError};
use crate::runtime::image::ClassImage;

pub use store::{ArtifactSink, ArtifactStore, ARTIFACT_EXTENSION};

static LOADER_SEQ: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, PartialEq)]
pub enum LoadError {
    /// No artifact for the name in this loader or any parent
    NotFound { name: String },
    /// Artifact bytes failed header or bytecode verification
    VerificationFailure { name: String, reason: String },
    /// Artifact decoded structurally but cannot be linked
    LinkageFailure { name: String, reason: String },
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::NotFound { name } => write!(f, "Class '{name}' not found"),
            LoadError::VerificationFailure { name, reason } => {
                write!(f, "Verification of class '{name}' failed: {reason}")
            }
            LoadError::LinkageFailure { name, reason } => {
                write!(f, "Linkage of class '{name}' failed: {reason}")
            }
        }
    }
}

impl std::error::Error for LoadError {}

/// Identity of a loaded class: the defining loader plus the class name.
/// Equal names loaded by different loaders compare unequal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeId {
    pub loader: u64,
    pub name: String,
}

/// A class resolved by some loader
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedClass {
    image: ClassImage,
    type_id: TypeId,
}

impl LoadedClass {
    pub fn name(&self) -> &str {
        &self.image.fqn
    }

    pub fn type_id(&self) -> &TypeId {
        &self.type_id
    }

    pub fn image(&self) -> &ClassImage {
        &self.image
    }
}

/// Loads classes from its own artifact store first, falling back to an
/// optional parent loader
pub struct ClassLoader {
    store: ArtifactStore,
    parent: Option<Arc<ClassLoader>>,
    id: u64,
    logger: Arc<Logger>,
}

impl ClassLoader {
    pub fn new(store: ArtifactStore, logger: Arc<Logger>) -> Self {
        Self {
            store,
            parent: None,
            id: LOADER_SEQ.fetch_add(1, Ordering::Relaxed),
            logger,
        }
    }

    pub fn with_parent(store: ArtifactStore, parent: Arc<ClassLoader>, logger: Arc<Logger>) -> Self {
        Self {
            store,
            parent: Some(parent),
            id: LOADER_SEQ.fetch_add(1, Ordering::Relaxed),
            logger,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Resolve a class by fully-qualified name. The local store wins over
    /// the parent; classes served by the parent keep the parent's identity.
    pub fn load(&self, fqn: &str) -> Result<LoadedClass, LoadError> {
        if let Some(bytes) = self.store.get(fqn) {
            let image = decode_class(&bytes).map_err(|err| classify_read_error(fqn, err))?;
            if image.fqn != fqn {
                return Err(LoadError::LinkageFailure {
                    name: fqn.to_string(),
                    reason: format!("artifact declares class '{}'", image.fqn),
                });
            }
            debug!(
                self.logger,
                target: Phase::Loader.target(),
                "loader {} defined {}",
                self.id,
                fqn
            );
            return Ok(LoadedClass {
                image,
                type_id: TypeId {
                    loader: self.id,
                    name: fqn.to_string(),
                },
            });
        }
        if let Some(parent) = &self.parent {
            return parent.load(fqn);
        }
        Err(LoadError::NotFound {
            name: fqn.to_string(),
        })
    }
}

/// Header failures are verification errors; decode and bytecode-check
/// failures are linkage errors
fn classify_read_error(fqn: &str, err: ReadError) -> LoadError {
    let name = fqn.to_string();
    let reason = err.to_string();
    match err {
        ReadError::BadMagic
        | ReadError::UnsupportedVersion(..)
        | ReadError::ChecksumMismatch => LoadError::VerificationFailure { name, reason },
        _ => LoadError::LinkageFailure { name, reason },
    }
}
