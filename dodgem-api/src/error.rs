//! Errors surfaced by the embedding API

use thiserror::Error;

use dodgem_core::{DiagnosticReport, LoadError, RuntimeError};
use dodgem_vfs::VfsError;

/// The declared `package.Class` of a unit does not match the name it was
/// submitted under
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unit submitted as '{requested}' declares class '{declared}'")]
pub struct SourceError {
    pub requested: String,
    pub declared: String,
}

/// Failure while constructing an instance or invoking a method through a
/// [`crate::TypeHandle`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvocationError {
    #[error("No method named '{name}'")]
    NoSuchMethod { name: String },
    #[error("Method '{method}' expects {expected} arguments, got {got}")]
    ArityMismatch {
        method: String,
        expected: u8,
        got: usize,
    },
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Top-level error of the compile-and-load pipeline
#[derive(Debug, Error)]
pub enum DodgemError {
    #[error(transparent)]
    Source(#[from] SourceError),
    /// Compilation produced at least one ERROR diagnostic; no artifacts
    /// were published
    #[error("Compilation failed:\n{0}")]
    Compile(DiagnosticReport),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Invocation(#[from] InvocationError),
    #[error("Source materialization failed: {0}")]
    Materialize(#[from] VfsError),
}

impl DodgemError {
    /// Diagnostics attached to a compile failure, when this is one
    pub fn diagnostics(&self) -> Option<&DiagnosticReport> {
        match self {
            DodgemError::Compile(report) => Some(report),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_message() {
        let err = SourceError {
            requested: "a.B".to_string(),
            declared: "a.C".to_string(),
        };
        assert_eq!(err.to_string(), "Unit submitted as 'a.B' declares class 'a.C'");
    }

    #[test]
    fn test_diagnostics_accessor() {
        use dodgem_core::Diagnostic;
        let mut report = DiagnosticReport::new();
        report.push(Diagnostic::error("a.B", "broken"));
        let err = DodgemError::Compile(report);
        assert!(err.diagnostics().is_some());

        let err = DodgemError::Load(LoadError::NotFound {
            name: "a.B".to_string(),
        });
        assert!(err.diagnostics().is_none());
    }
}
