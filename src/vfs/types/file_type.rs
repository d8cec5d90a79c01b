/*!
 * VFS File Type Enum
 * Defines the type of filesystem objects
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// File type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    File,
    Directory,
    Symlink,
    /// Devices, fifos and sockets
    Special,
    #[default]
    Unknown,
}

impl FileType {
    /// Classify a std file type without following symlinks
    pub fn from_std(ft: std::fs::FileType) -> Self {
        if ft.is_symlink() {
            FileType::Symlink
        } else if ft.is_dir() {
            FileType::Directory
        } else if ft.is_file() {
            FileType::File
        } else {
            FileType::Special
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FileType::File => write!(f, "file"),
            FileType::Directory => write!(f, "directory"),
            FileType::Symlink => write!(f, "symlink"),
            FileType::Special => write!(f, "special file"),
            FileType::Unknown => write!(f, "unknown"),
        }
    }
}
