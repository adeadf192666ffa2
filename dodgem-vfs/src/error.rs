//! Filesystem error type shared by the memory and native backends

use std::fmt;

pub type VfsResult<T> = Result<T, VfsError>;

/// What went wrong during a filesystem operation.
///
/// `LockPoisoned` is specific to [`crate::MemoryFileSystem`]: its file table
/// sits behind an `RwLock`, and a panic while the lock was held leaves the
/// table unusable for every clone sharing it.
#[derive(Debug, Clone, PartialEq)]
pub enum VfsError {
    /// No file at the given path
    NotFound { path: String },

    /// The host denied access to the path
    PermissionDenied { path: String },

    /// The in-memory file table lock was poisoned by a panicking holder
    LockPoisoned { path: String },

    /// Any other host IO failure, carried as text
    Io { message: String },
}

impl fmt::Display for VfsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VfsError::NotFound { path } => write!(f, "No file at '{path}'"),
            VfsError::PermissionDenied { path } => write!(f, "Access denied for '{path}'"),
            VfsError::LockPoisoned { path } => {
                write!(f, "File table lock poisoned while accessing '{path}'")
            }
            VfsError::Io { message } => write!(f, "IO failure: {message}"),
        }
    }
}

impl std::error::Error for VfsError {}

impl From<std::io::Error> for VfsError {
    fn from(err: std::io::Error) -> Self {
        VfsError::Io {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_path() {
        let err = VfsError::LockPoisoned {
            path: "/src/a.dg".to_string(),
        };
        assert!(err.to_string().contains("/src/a.dg"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err = VfsError::from(io);
        assert!(matches!(err, VfsError::Io { .. }));
        assert!(err.to_string().contains("disk gone"));
    }
}
