/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use crate::vfs::VfsError;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sandboxed access result
///
/// # Must Use
/// File access can fail and must be handled to prevent silent data loss
#[must_use = "file access operations can fail and must be handled"]
pub type FsAccessResult<T> = Result<T, FsAccessError>;

/// Errors crossing the public boundary of the access layer
///
/// Every OS failure is translated into exactly one of these kinds before it
/// leaves a component. The payload is a human-readable reason.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum FsAccessError {
    #[error("Invalid path: {0}")]
    #[diagnostic(
        code(access::invalid_path),
        help("Paths must be non-empty, NUL-free, and have at least one existing ancestor.")
    )]
    InvalidPath(String),

    #[error("Path is outside the sandbox: {0}")]
    #[diagnostic(
        code(access::outside_sandbox),
        help("Resolve a security-scoped bookmark and start accessing it to reach paths outside the sandbox root.")
    )]
    OutsideSandbox(String),

    #[error("Not found: {0}")]
    #[diagnostic(code(access::not_found))]
    NotFound(String),

    #[error("Already exists: {0}")]
    #[diagnostic(
        code(access::already_exists),
        help("Pass overwrite=true or remove the existing item first.")
    )]
    AlreadyExists(String),

    #[error("Read failed: {0}")]
    #[diagnostic(code(access::read_failure))]
    ReadFailure(String),

    #[error("Write failed: {0}")]
    #[diagnostic(code(access::write_failure))]
    WriteFailure(String),

    #[error("Bookmark creation failed: {0}")]
    #[diagnostic(
        code(bookmark::creation_failed),
        help("The target must exist and be readable when the bookmark is created.")
    )]
    CreationFailure(String),

    #[error("Bookmark resolution failed: {0}")]
    #[diagnostic(
        code(bookmark::resolution_failed),
        help("The token may be corrupt, sealed with another key, or its target deleted.")
    )]
    ResolutionFailure(String),

    #[error("Secure erase failed: {0}")]
    #[diagnostic(
        code(erase::failed),
        help("The target was not removed. Inspect it before retrying.")
    )]
    EraseFailure(String),

    #[error("Unexpected item type: {0}")]
    #[diagnostic(code(access::unexpected_item_type))]
    UnexpectedItemType(String),
}

impl FsAccessError {
    /// Short machine-readable kind, used as a structured log field
    pub fn kind(&self) -> &'static str {
        match self {
            FsAccessError::InvalidPath(_) => "invalid_path",
            FsAccessError::OutsideSandbox(_) => "outside_sandbox",
            FsAccessError::NotFound(_) => "not_found",
            FsAccessError::AlreadyExists(_) => "already_exists",
            FsAccessError::ReadFailure(_) => "read_failure",
            FsAccessError::WriteFailure(_) => "write_failure",
            FsAccessError::CreationFailure(_) => "creation_failure",
            FsAccessError::ResolutionFailure(_) => "resolution_failure",
            FsAccessError::EraseFailure(_) => "erase_failure",
            FsAccessError::UnexpectedItemType(_) => "unexpected_item_type",
        }
    }

    /// Reason string without the kind prefix
    pub fn reason(&self) -> &str {
        match self {
            FsAccessError::InvalidPath(r)
            | FsAccessError::OutsideSandbox(r)
            | FsAccessError::NotFound(r)
            | FsAccessError::AlreadyExists(r)
            | FsAccessError::ReadFailure(r)
            | FsAccessError::WriteFailure(r)
            | FsAccessError::CreationFailure(r)
            | FsAccessError::ResolutionFailure(r)
            | FsAccessError::EraseFailure(r)
            | FsAccessError::UnexpectedItemType(r) => r,
        }
    }

    /// Translate a provider error for a read-side operation
    pub fn from_read(err: VfsError) -> Self {
        match err {
            VfsError::NotFound(r) => FsAccessError::NotFound(r),
            VfsError::AlreadyExists(r) => FsAccessError::AlreadyExists(r),
            VfsError::InvalidPath(r) => FsAccessError::InvalidPath(r),
            VfsError::NotADirectory(r) | VfsError::IsADirectory(r) => {
                FsAccessError::UnexpectedItemType(r)
            }
            other => FsAccessError::ReadFailure(other.to_string()),
        }
    }

    /// Translate a provider error for a write-side operation
    pub fn from_write(err: VfsError) -> Self {
        match err {
            VfsError::NotFound(r) => FsAccessError::NotFound(r),
            VfsError::AlreadyExists(r) => FsAccessError::AlreadyExists(r),
            VfsError::InvalidPath(r) => FsAccessError::InvalidPath(r),
            VfsError::NotADirectory(r) | VfsError::IsADirectory(r) => {
                FsAccessError::UnexpectedItemType(r)
            }
            other => FsAccessError::WriteFailure(other.to_string()),
        }
    }
}

/// Configuration errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ConfigError {
    #[error("Missing configuration value: {0}")]
    #[diagnostic(code(config::missing), help("Set the environment variable or config field."))]
    Missing(String),

    #[error("Invalid configuration value for {key}: {reason}")]
    #[diagnostic(code(config::invalid))]
    Invalid { key: String, reason: String },
}
