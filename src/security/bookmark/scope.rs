/*!
 * Access Scopes
 * Reference-counted grants for resolved bookmark targets
 */

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
struct ScopeEntry {
    read_only: bool,
    is_dir: bool,
    active: usize,
}

/// An active grant covering some path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveScope {
    pub root: PathBuf,
    pub read_only: bool,
}

/// Grants handed out by bookmark resolution, keyed by canonical path
///
/// A path can only be started once it has been granted. Starts nest and
/// must be matched by the same number of stops.
///
/// Grants outlive their last stop so a resolved path can be started again
/// without re-resolving. The map therefore holds one entry per distinct
/// resolved target for the lifetime of the manager; re-resolving a target
/// reuses its entry.
#[derive(Debug, Default)]
pub(crate) struct ScopeRegistry {
    entries: DashMap<PathBuf, ScopeEntry>,
}

impl ScopeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a grant; flags are replaced, the active count kept
    pub fn grant(&self, path: PathBuf, read_only: bool, is_dir: bool) {
        self.entries
            .entry(path)
            .and_modify(|e| {
                e.read_only = read_only;
                e.is_dir = is_dir;
            })
            .or_insert(ScopeEntry {
                read_only,
                is_dir,
                active: 0,
            });
    }

    pub fn start(&self, path: &Path) -> bool {
        match self.entries.get_mut(path) {
            Some(mut entry) => {
                entry.active += 1;
                debug!(path = %path.display(), sensitive = true, active = entry.active, "started accessing");
                true
            }
            None => false,
        }
    }

    /// Returns false when there was no matching start
    pub fn stop(&self, path: &Path) -> bool {
        let balanced = match self.entries.get_mut(path) {
            Some(mut entry) if entry.active > 0 => {
                entry.active -= 1;
                debug!(path = %path.display(), sensitive = true, active = entry.active, "stopped accessing");
                true
            }
            _ => false,
        };
        if !balanced {
            warn!(
                path = %path.display(),
                sensitive = true,
                "stop accessing without a matching start"
            );
        }
        balanced
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn active_count(&self, path: &Path) -> usize {
        self.entries.get(path).map(|e| e.active).unwrap_or(0)
    }

    /// Most specific active grant covering `path`
    ///
    /// A file grant covers exactly its path; a directory grant covers everything below it.
    pub fn covering(&self, path: &Path) -> Option<ActiveScope> {
        self.entries
            .iter()
            .filter(|e| e.active > 0)
            .filter(|e| path == e.key().as_path() || (e.is_dir && path.starts_with(e.key())))
            .max_by_key(|e| e.key().components().count())
            .map(|e| ActiveScope {
                root: e.key().clone(),
                read_only: e.read_only,
            })
    }
}

/// RAII guard for an active scope; stops accessing when dropped
#[derive(Debug)]
#[must_use = "the scope ends as soon as the guard is dropped"]
pub struct AccessScope {
    registry: Arc<ScopeRegistry>,
    path: PathBuf,
}

impl AccessScope {
    /// Start accessing `path`, or None when it has no grant
    pub(crate) fn begin(registry: Arc<ScopeRegistry>, path: PathBuf) -> Option<Self> {
        if registry.start(&path) {
            Some(Self { registry, path })
        } else {
            None
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for AccessScope {
    fn drop(&mut self) {
        self.registry.stop(&self.path);
    }
}
