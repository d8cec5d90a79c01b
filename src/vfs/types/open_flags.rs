/*!
 * VFS Open Flags
 * Flags for file opening operations
 */

use crate::core::serde::is_false;
use serde::{Deserialize, Serialize};

/// File open flags (only true flags are serialized)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", default, deny_unknown_fields)]
pub struct OpenFlags {
    #[serde(skip_serializing_if = "is_false")]
    pub read: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub write: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub append: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub truncate: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub create: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub create_new: bool,
}

impl OpenFlags {
    /// Write in place: no create, no truncate, no append
    #[inline]
    #[must_use]
    pub fn overwrite_in_place() -> Self {
        Self {
            write: true,
            ..Default::default()
        }
    }
}
