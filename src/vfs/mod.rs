/*!
 * Virtual File System Module
 * File operations provider consumed by the sandboxed access layer
 */

pub mod local;
pub mod traits;
pub mod types;

// Re-exports
pub use local::LocalFS;
pub use traits::{FileSystem, OpenFile};
pub use types::{Entry, FileType, Metadata, OpenFlags, VfsError, VfsResult};
