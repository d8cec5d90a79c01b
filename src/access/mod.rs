/*!
 * Sandboxed File Access
 * Composition root: validates every path before delegating to a provider
 *
 * Wraps a non-validating [`FileSystem`] and owns the path validator, the
 * attribute store, the bookmark manager and the secure eraser. Paths outside
 * the sandbox root are admitted only while a bookmark access scope covers
 * them.
 */

mod attributes;
mod bookmarks;
mod files;

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::core::config::AccessConfig;
use crate::core::errors::{FsAccessError, FsAccessResult};
use crate::monitoring::OperationSpan;
use crate::security::{
    ExtendedAttributeStore, PathValidator, SandboxRoot, SecureEraser, SecurityBookmarkManager,
    ValidatedPath,
};
use crate::vfs::{FileSystem, LocalFS};

/// What the caller is about to do with a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessIntent {
    Read,
    Write,
}

/// Sandbox-constrained file access over a [`FileSystem`] provider
pub struct SandboxedFileAccess<F: FileSystem + ?Sized = LocalFS> {
    fs: Arc<F>,
    validator: PathValidator,
    attributes: ExtendedAttributeStore,
    bookmarks: SecurityBookmarkManager,
    eraser: SecureEraser<F>,
}

impl SandboxedFileAccess<LocalFS> {
    /// Access layer over the host filesystem
    pub fn from_config(config: AccessConfig) -> FsAccessResult<Self> {
        Self::new(config, Arc::new(LocalFS::new()))
    }
}

impl<F: FileSystem + ?Sized> SandboxedFileAccess<F> {
    pub fn new(config: AccessConfig, fs: Arc<F>) -> FsAccessResult<Self> {
        let span = OperationSpan::with_path("init", &config.sandbox_root);
        let _guard = span.enter();
        span.complete(Self::build(config, fs))
    }

    fn build(config: AccessConfig, fs: Arc<F>) -> FsAccessResult<Self> {
        config
            .validate()
            .map_err(|e| FsAccessError::InvalidPath(format!("invalid configuration: {}", e)))?;

        if config.create_root && !fs.exists(&config.sandbox_root) {
            fs.create_dir(&config.sandbox_root)
                .map_err(FsAccessError::from_write)?;
            debug!(root = %config.sandbox_root.display(), sensitive = true, "created sandbox root");
        }

        let root = SandboxRoot::new(&config.sandbox_root)?;
        info!(
            root = %root.as_path().display(),
            sensitive = true,
            provider = fs.name(),
            erase_passes = config.erase.passes,
            "sandboxed file access ready"
        );

        Ok(Self {
            validator: PathValidator::new(root),
            attributes: ExtendedAttributeStore::new(config.xattr),
            bookmarks: SecurityBookmarkManager::new(&config.bookmark)?,
            eraser: SecureEraser::new(Arc::clone(&fs), config.erase),
            fs,
        })
    }

    /// Canonical sandbox root
    pub fn root(&self) -> &Path {
        self.validator.root().as_path()
    }

    pub fn validator(&self) -> &PathValidator {
        &self.validator
    }

    pub fn attributes(&self) -> &ExtendedAttributeStore {
        &self.attributes
    }

    pub fn bookmarks(&self) -> &SecurityBookmarkManager {
        &self.bookmarks
    }

    pub fn eraser(&self) -> &SecureEraser<F> {
        &self.eraser
    }

    pub fn provider(&self) -> &F {
        &self.fs
    }

    /// Containment check only; scopes are not consulted
    pub fn validate(&self, path: &Path) -> FsAccessResult<ValidatedPath> {
        let span = OperationSpan::with_path("validate", path);
        let _guard = span.enter();
        span.complete(self.validator.validate(path))
    }

    /// Validate against the root, falling back to an active access scope
    pub fn authorize(&self, path: &Path, intent: AccessIntent) -> FsAccessResult<ValidatedPath> {
        let reason = match self.validator.validate(path) {
            Ok(validated) => return Ok(validated),
            Err(FsAccessError::OutsideSandbox(reason)) => reason,
            Err(e) => return Err(e),
        };

        let canonical = self.validator.canonicalize(path)?;
        match self.bookmarks.active_scope_for(&canonical) {
            Some(scope) if intent == AccessIntent::Write && scope.read_only => {
                Err(FsAccessError::OutsideSandbox(format!(
                    "{} is covered by a read-only access scope at {}",
                    canonical.display(),
                    scope.root.display()
                )))
            }
            Some(scope) => {
                debug!(
                    path = %canonical.display(),
                    scope = %scope.root.display(),
                    sensitive = true,
                    ?intent,
                    "admitted by access scope"
                );
                Ok(ValidatedPath::new(canonical))
            }
            None => Err(FsAccessError::OutsideSandbox(reason)),
        }
    }
}
