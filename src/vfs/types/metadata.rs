/*!
 * VFS Metadata
 * File metadata including timestamps
 */

use super::file_type::FileType;
use crate::core::serde::{is_false, is_zero_u64, system_time_micros};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// File metadata
///
/// Timestamps are serialized as microseconds since UNIX epoch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct Metadata {
    pub file_type: FileType,
    #[serde(skip_serializing_if = "is_zero_u64", default)]
    pub size: u64,
    #[serde(skip_serializing_if = "is_false", default)]
    pub readonly: bool,
    #[serde(with = "system_time_micros")]
    pub modified: SystemTime,
    #[serde(with = "system_time_micros")]
    pub created: SystemTime,
}

impl Metadata {
    /// Convert std::fs::Metadata
    pub fn from_std(md: &std::fs::Metadata) -> Self {
        Self {
            file_type: FileType::from_std(md.file_type()),
            size: md.len(),
            readonly: md.permissions().readonly(),
            modified: md.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            created: md.created().unwrap_or(SystemTime::UNIX_EPOCH),
        }
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
