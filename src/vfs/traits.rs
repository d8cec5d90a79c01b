/*!
 * VFS Traits
 * File operations provider abstraction
 */

use std::io::{Read, Seek, Write};
use std::path::Path;

use super::types::*;

/// Plain file operations provider
///
/// Implementations perform no sandbox validation of their own; callers are
/// expected to hand in paths that were already checked. Paths are absolute
/// host paths.
pub trait FileSystem: Send + Sync {
    /// Read entire file contents
    fn read(&self, path: &Path) -> VfsResult<Vec<u8>>;

    /// Write entire file contents (create or overwrite)
    fn write(&self, path: &Path, data: &[u8]) -> VfsResult<()>;

    /// Create empty file, failing if it already exists
    fn create(&self, path: &Path) -> VfsResult<()>;

    /// Delete file (or symlink)
    fn delete(&self, path: &Path) -> VfsResult<()>;

    /// Check if file/directory exists
    fn exists(&self, path: &Path) -> bool;

    /// Get file metadata, following symlinks
    fn metadata(&self, path: &Path) -> VfsResult<Metadata>;

    /// List directory contents without following symlinks
    fn list_dir(&self, path: &Path) -> VfsResult<Vec<Entry>>;

    /// Create directory (including parents)
    fn create_dir(&self, path: &Path) -> VfsResult<()>;

    /// Remove directory (must be empty)
    fn remove_dir(&self, path: &Path) -> VfsResult<()>;

    /// Copy file
    fn copy(&self, from: &Path, to: &Path) -> VfsResult<()>;

    /// Move/rename file or directory
    fn rename(&self, from: &Path, to: &Path) -> VfsResult<()>;

    /// Open file with specified flags
    fn open(&self, path: &Path, flags: OpenFlags) -> VfsResult<Box<dyn OpenFile>>;

    /// Get provider name
    fn name(&self) -> &str;
}

/// Open file handle trait
///
/// Represents an open file with read/write/seek capabilities.
/// Automatically closed when dropped.
pub trait OpenFile: Read + Write + Seek + Send + Sync {
    /// Sync file data to storage
    fn sync(&mut self) -> VfsResult<()>;
}
