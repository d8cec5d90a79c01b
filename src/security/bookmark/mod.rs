/*!
 * Security-Scoped Bookmarks
 * Persistable tokens that grant access to paths outside the sandbox
 *
 * A token records where a file was and what it was (device and inode). On
 * resolution a moved file is found again by identity near its old location
 * and reported as stale so the caller can re-create the token. Resolving
 * grants the path; accessing it is then bracketed by start/stop calls.
 */

mod identity;
mod scope;
mod token;

pub use identity::FileIdentity;
pub use scope::{AccessScope, ActiveScope};
pub use token::BookmarkToken;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use self::scope::ScopeRegistry;
use self::token::{BookmarkRecord, TokenSealer};
use crate::core::config::BookmarkConfig;
use crate::core::errors::{FsAccessError, FsAccessResult};

/// Outcome of resolving a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedBookmark {
    pub path: PathBuf,
    /// The target is no longer where the token says; re-create the token
    pub stale: bool,
    pub read_only: bool,
}

/// Creates and resolves bookmark tokens and tracks access scopes
#[derive(Debug)]
pub struct SecurityBookmarkManager {
    sealer: TokenSealer,
    relocation_depth: usize,
    scopes: Arc<ScopeRegistry>,
}

impl SecurityBookmarkManager {
    pub fn new(config: &BookmarkConfig) -> FsAccessResult<Self> {
        let sealer = match config.signing_key {
            Some(ref key) => TokenSealer::new(key.as_bytes())?,
            None => TokenSealer::random()?,
        };
        Ok(Self {
            sealer,
            relocation_depth: config.relocation_depth,
            scopes: Arc::new(ScopeRegistry::new()),
        })
    }

    /// Create a token for an existing, readable item at a canonical path
    pub fn create(&self, path: &Path, read_only: bool) -> FsAccessResult<BookmarkToken> {
        let md = fs::metadata(path).map_err(|e| {
            FsAccessError::CreationFailure(format!("{}: {}", path.display(), e))
        })?;
        ensure_readable(path, md.is_dir())?;

        let record = BookmarkRecord {
            path: path.to_path_buf(),
            identity: FileIdentity::from_metadata(&md),
            read_only,
            is_dir: md.is_dir(),
            created: SystemTime::now(),
        };
        let token = self.sealer.seal(&record)?;
        debug!(path = %path.display(), sensitive = true, read_only, size = token.len(), "created bookmark");
        Ok(token)
    }

    /// Resolve a token and grant its current path
    pub fn resolve(&self, token: &BookmarkToken) -> FsAccessResult<ResolvedBookmark> {
        let record = self.sealer.open(token)?;
        let (path, stale) = self.locate(&record)?;

        let is_dir = fs::metadata(&path).map(|md| md.is_dir()).unwrap_or(record.is_dir);
        self.scopes.grant(path.clone(), record.read_only, is_dir);

        if stale {
            info!(
                recorded = %record.path.display(),
                resolved = %path.display(),
                sensitive = true,
                "bookmark is stale"
            );
        }
        Ok(ResolvedBookmark {
            path,
            stale,
            read_only: record.read_only,
        })
    }

    fn locate(&self, record: &BookmarkRecord) -> FsAccessResult<(PathBuf, bool)> {
        if record.identity.matches(&record.path) {
            return Ok((record.path.clone(), false));
        }

        if let Some(parent) = record.path.parent() {
            if let Some(moved) = identity::relocate(parent, record.identity, self.relocation_depth) {
                return Ok((moved, true));
            }
        }

        if fs::symlink_metadata(&record.path).is_ok() {
            return Ok((record.path.clone(), true));
        }

        Err(FsAccessError::ResolutionFailure(format!(
            "{} no longer exists and was not found nearby",
            record.path.display()
        )))
    }

    /// Begin accessing a resolved path; false when it was never granted
    pub fn start_accessing(&self, path: &Path) -> bool {
        self.scopes.start(path)
    }

    /// End one access started with [`Self::start_accessing`]
    ///
    /// An unbalanced stop is logged and otherwise ignored.
    pub fn stop_accessing(&self, path: &Path) {
        self.scopes.stop(path);
    }

    /// Start accessing and return a guard that stops on drop
    pub fn access(&self, path: &Path) -> Option<AccessScope> {
        AccessScope::begin(Arc::clone(&self.scopes), path.to_path_buf())
    }

    pub fn is_accessing(&self, path: &Path) -> bool {
        self.scopes.active_count(path) > 0
    }

    /// The active scope admitting `path`, if any
    pub fn active_scope_for(&self, path: &Path) -> Option<ActiveScope> {
        self.scopes.covering(path)
    }
}

fn ensure_readable(path: &Path, is_dir: bool) -> FsAccessResult<()> {
    let readable = if is_dir {
        fs::read_dir(path).map(|_| ())
    } else {
        fs::File::open(path).map(|_| ())
    };
    readable.map_err(|e| {
        FsAccessError::CreationFailure(format!("{} is not readable: {}", path.display(), e))
    })
}
