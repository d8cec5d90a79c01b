/*!
 * VFS Types
 * Shared types for file operations providers
 */

mod entry;
mod errors;
mod file_type;
mod metadata;
mod open_flags;

pub use entry::Entry;
pub use errors::{VfsError, VfsResult};
pub use file_type::FileType;
pub use metadata::Metadata;
pub use open_flags::OpenFlags;
