//! Error types for `jaso-core`.
//!
//! All fallible operations in the core library return [`CoreResult<T>`],
//! which is an alias for `Result<T, CoreError>`.

use std::path::PathBuf;

/// Unified error type for all core operations.
///
/// Each variant captures just enough context for the caller to display
/// a meaningful message through the alert collaborator.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The target path does not exist.
    #[error("path not found: {0}")]
    NotFound(PathBuf),

    /// The process lacks permission to access the path.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// A directory was expected but the path points to something else.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A sibling with the canonical name already exists; the rename was not attempted.
    #[error("already exists: {0}")]
    AlreadyExists(PathBuf),

    /// `start` was called on a session that is not idle.
    #[error("watch session already started")]
    AlreadyStarted,

    /// The directory picker returned nothing.
    #[error("no directory selected")]
    NoDirectorySelected,

    /// The OS watch primitive refused or lost the subscription.
    #[error("watch error: {0}")]
    Watch(String),

    /// Failed to parse a TOML configuration file.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// An I/O error that doesn't fit a more specific variant.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<notify::Error> for CoreError {
    fn from(e: notify::Error) -> Self {
        CoreError::Watch(e.to_string())
    }
}

impl CoreError {
    /// Maps an I/O error on `path` to the most specific variant.
    pub(crate) fn from_io(path: &std::path::Path, e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => CoreError::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => CoreError::PermissionDenied(path.to_path_buf()),
            _ => CoreError::Io(e),
        }
    }
}

/// Convenience alias used throughout `jaso-core`.
pub type CoreResult<T> = Result<T, CoreError>;
