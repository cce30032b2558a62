//! Path confinement for files served from disk
//!
//! Page and template names come straight from request paths. Before any of
//! them touches the filesystem they are resolved against a root directory and
//! rejected if they escape it.

use std::path::{Path, PathBuf};

/// Error types for path validation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SecurityError {
    /// Path is outside the allowed root directory. The message omits the path.
    #[error("Access denied: path outside allowed directory")]
    PathTraversal { path: String },

    /// Path does not exist or is inaccessible
    #[error("Invalid path: {reason}")]
    InvalidPath { path: String, reason: String },

    /// Root directory is invalid
    #[error("Invalid directory '{path}': {reason}")]
    InvalidRoot { path: String, reason: String },
}

/// Result type for security operations
pub type SecurityResult<T> = Result<T, SecurityError>;

/// Validate that a path is within the allowed root directory.
///
/// 1. Relative paths are joined onto `root`
/// 2. Both are canonicalized to resolve `..`, `.`, and symlinks
/// 3. The canonical path must start with the canonical root
///
/// Returns the canonical path. Fails if either path does not exist.
pub fn validate_path(path: &str, root: &Path) -> SecurityResult<PathBuf> {
    let requested = PathBuf::from(path);

    let absolute = if requested.is_absolute() {
        requested
    } else {
        root.join(&requested)
    };

    let root_canonical = root
        .canonicalize()
        .map_err(|e| SecurityError::InvalidRoot {
            path: root.display().to_string(),
            reason: e.to_string(),
        })?;

    let canonical = absolute
        .canonicalize()
        .map_err(|e| SecurityError::InvalidPath {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

    if !canonical.starts_with(&root_canonical) {
        return Err(SecurityError::PathTraversal {
            path: path.to_string(),
        });
    }

    Ok(canonical)
}

/// Fast pre-check for obvious traversal attempts, before touching the disk.
pub fn is_suspicious_path(path: &str) -> bool {
    path.contains("..")
        || path.contains("//")
        || path.starts_with('/')
        || path.contains('\\')
        || path.contains('\0')
        || path.contains('~')
}
