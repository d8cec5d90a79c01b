/*!
 * VFS Directory Entry
 * Represents entries in a directory listing
 */

use super::file_type::FileType;
use crate::core::serde::is_default;
use serde::{Deserialize, Serialize};

/// Directory entry
///
/// Names come from the OS listing and are single path components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Entry {
    pub name: String,
    #[serde(skip_serializing_if = "is_default", default)]
    pub file_type: FileType,
}

impl Entry {
    pub(crate) fn new(name: String, file_type: FileType) -> Self {
        Self { name, file_type }
    }

    #[inline]
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        matches!(self.file_type, FileType::Directory)
    }

    #[inline]
    #[must_use]
    pub const fn is_file(&self) -> bool {
        matches!(self.file_type, FileType::File)
    }
}
