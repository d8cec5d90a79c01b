/*!
 * VFS Error Types
 * Errors reported by file operations providers
 */

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// VFS operation result
///
/// # Must Use
/// VFS operations can fail and must be handled to prevent data loss
#[must_use = "VFS operations can fail and must be handled"]
pub type VfsResult<T> = Result<T, VfsError>;

/// Provider errors
///
/// All error variants include context strings that should be non-empty.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "error", content = "details")]
pub enum VfsError {
    #[error("Not found: {0}")]
    NotFound(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Already exists: {0}")]
    AlreadyExists(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Permission denied: {0}")]
    PermissionDenied(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Not a directory: {0}")]
    NotADirectory(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Is a directory: {0}")]
    IsADirectory(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Directory not empty: {0}")]
    NotEmpty(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Invalid path: {0}")]
    InvalidPath(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("I/O error: {0}")]
    IoError(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Cross-device link")]
    CrossDevice,
}

impl VfsError {
    /// Convert std::io::Error to VfsError, keeping the operation as context
    pub fn from_io(e: std::io::Error, context: impl Into<String>) -> Self {
        use std::io::ErrorKind;
        let context = context.into();
        match e.kind() {
            ErrorKind::NotFound => return VfsError::NotFound(context),
            ErrorKind::PermissionDenied => return VfsError::PermissionDenied(context),
            ErrorKind::AlreadyExists => return VfsError::AlreadyExists(context),
            _ => {}
        }
        match e.raw_os_error() {
            Some(libc::EISDIR) => VfsError::IsADirectory(context),
            Some(libc::ENOTDIR) => VfsError::NotADirectory(context),
            Some(libc::ENOTEMPTY) => VfsError::NotEmpty(context),
            Some(libc::EXDEV) => VfsError::CrossDevice,
            _ => VfsError::IoError(format!("{}: {}", context, e)),
        }
    }
}

/// Deserialize and validate non-empty string for error messages
pub(super) fn deserialize_nonempty_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    if s.is_empty() {
        return Err(serde::de::Error::custom("error message must not be empty"));
    }
    Ok(s)
}
