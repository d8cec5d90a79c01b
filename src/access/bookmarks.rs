/*!
 * Bookmark Operations
 * Token creation and resolution, access scopes
 */

use std::path::Path;

use tracing::warn;

use super::SandboxedFileAccess;
use crate::core::errors::FsAccessResult;
use crate::monitoring::OperationSpan;
use crate::security::{AccessScope, BookmarkToken, ResolvedBookmark};
use crate::vfs::FileSystem;

impl<F: FileSystem + ?Sized> SandboxedFileAccess<F> {
    /// Bookmark any existing path; not subject to containment
    pub fn create_bookmark(&self, path: &Path, read_only: bool) -> FsAccessResult<BookmarkToken> {
        let span = OperationSpan::with_path("create_bookmark", path);
        let _guard = span.enter();
        span.complete(
            self.validator
                .canonicalize(path)
                .and_then(|canonical| self.bookmarks.create(&canonical, read_only)),
        )
    }

    /// Resolve a token and grant its target for scoped access
    pub fn resolve_bookmark(&self, token: &BookmarkToken) -> FsAccessResult<ResolvedBookmark> {
        let span = OperationSpan::new("resolve_bookmark");
        let _guard = span.enter();
        let result = self.bookmarks.resolve(token);
        if let Ok(ref resolved) = result {
            span.record_debug("stale", resolved.stale);
        }
        span.complete(result)
    }

    /// Begin accessing a resolved bookmark target; false when it was never granted
    pub fn start_accessing(&self, path: &Path) -> bool {
        let span = OperationSpan::with_path("start_accessing", path);
        let _guard = span.enter();
        match self.validator.canonicalize(path) {
            Ok(canonical) => self.bookmarks.start_accessing(&canonical),
            Err(e) => {
                warn!(reason = e.reason(), "cannot start accessing");
                false
            }
        }
    }

    pub fn stop_accessing(&self, path: &Path) {
        let span = OperationSpan::with_path("stop_accessing", path);
        let _guard = span.enter();
        match self.validator.canonicalize(path) {
            Ok(canonical) => self.bookmarks.stop_accessing(&canonical),
            Err(e) => warn!(reason = e.reason(), "cannot stop accessing"),
        }
    }

    /// Start accessing and get a guard that stops when dropped
    pub fn scoped_access(&self, path: &Path) -> Option<AccessScope> {
        let span = OperationSpan::with_path("scoped_access", path);
        let _guard = span.enter();
        self.validator
            .canonicalize(path)
            .ok()
            .and_then(|canonical| self.bookmarks.access(&canonical))
    }
}
