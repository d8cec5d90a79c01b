/*!
 * Security Module
 * Path containment, extended attributes, bookmarks and secure erase
 */

pub mod bookmark;
pub mod erase;
pub mod path;
pub mod xattr;

// Re-export for convenience
pub use bookmark::{
    AccessScope, ActiveScope, BookmarkToken, FileIdentity, ResolvedBookmark,
    SecurityBookmarkManager,
};
pub use erase::{EraseRequest, SecureEraser};
pub use path::{PathValidator, SandboxRoot, ValidatedPath};
pub use xattr::{AttributeKind, AttributeValue, ExtendedAttributeStore};
