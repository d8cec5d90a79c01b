/*!
 * Sandboxed FS Library
 * Sandbox-constrained secure file access exposed as a library
 */

pub mod access;
pub mod core;
pub mod monitoring;
pub mod security;
pub mod vfs;

// Re-exports
pub use access::{AccessIntent, SandboxedFileAccess};
pub use crate::core::{
    AccessConfig, BookmarkConfig, ConfigError, EraseConfig, FsAccessError, FsAccessResult,
    XattrConfig,
};
pub use monitoring::{init_tracing, OperationSpan};
pub use security::{
    AccessScope, ActiveScope, AttributeKind, AttributeValue, BookmarkToken, EraseRequest,
    ExtendedAttributeStore, PathValidator, ResolvedBookmark, SandboxRoot, SecureEraser,
    SecurityBookmarkManager, ValidatedPath,
};
pub use vfs::{Entry, FileSystem, FileType, LocalFS, Metadata, OpenFile, OpenFlags, VfsError};
