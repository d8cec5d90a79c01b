/*!
 * File Identity
 * Device and inode pairs that survive renames within a filesystem
 */

use std::fs;
use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;
use walkdir::WalkDir;

/// (device, inode) of a file, following symlinks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileIdentity {
    pub dev: u64,
    pub ino: u64,
}

impl FileIdentity {
    pub fn of(path: &Path) -> io::Result<Self> {
        Ok(Self::from_metadata(&fs::metadata(path)?))
    }

    pub fn from_metadata(md: &fs::Metadata) -> Self {
        Self {
            dev: md.dev(),
            ino: md.ino(),
        }
    }

    /// Whether `path` currently names this file
    pub fn matches(&self, path: &Path) -> bool {
        Self::of(path).map(|id| id == *self).unwrap_or(false)
    }
}

/// Search below `dir` for an entry with `identity`, at most `max_depth` levels down
///
/// Symlinks are not followed. Unreadable subdirectories are skipped.
pub fn relocate(dir: &Path, identity: FileIdentity, max_depth: usize) -> Option<PathBuf> {
    if max_depth == 0 {
        return None;
    }

    let found = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(max_depth)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .find(|entry| {
            entry
                .metadata()
                .map(|md| FileIdentity::from_metadata(&md) == identity)
                .unwrap_or(false)
        })
        .map(|entry| entry.into_path());

    if let Some(ref path) = found {
        debug!(dir = %dir.display(), found = %path.display(), sensitive = true, "relocated bookmarked item");
    }
    found
}
