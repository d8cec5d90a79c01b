/*!
 * Sandbox Path Validation
 * Canonicalizes paths and checks containment under the sandbox root
 *
 * Validation is re-run on every call and never cached: the target may not
 * exist yet, and a symlink in its chain can be retargeted between calls.
 * The window between validating a path and using it (TOCTOU) is not closed
 * here; an attacker able to swap a component for a symlink after validation
 * can still redirect the subsequent I/O.
 */

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{FsAccessError, FsAccessResult};

/// A canonical absolute path produced by [`PathValidator`]
///
/// Cannot be constructed from unchecked input outside this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ValidatedPath {
    canonical: PathBuf,
    is_dir: bool,
}

impl ValidatedPath {
    pub(crate) fn new(canonical: PathBuf) -> Self {
        let is_dir = canonical.is_dir();
        Self { canonical, is_dir }
    }

    /// Get the canonical path
    pub fn as_path(&self) -> &Path {
        &self.canonical
    }

    /// Directory hint captured at validation time
    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    /// Component-wise containment check
    pub fn is_within(&self, base: &Path) -> bool {
        self.canonical.starts_with(base)
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.canonical
    }
}

impl AsRef<Path> for ValidatedPath {
    fn as_ref(&self) -> &Path {
        &self.canonical
    }
}

/// The single canonical directory every validated path must fall under
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SandboxRoot(PathBuf);

impl SandboxRoot {
    /// Canonicalize an existing directory into a sandbox root
    pub fn new(path: &Path) -> FsAccessResult<Self> {
        if path.as_os_str().is_empty() {
            return Err(FsAccessError::InvalidPath("sandbox root is empty".into()));
        }
        let canonical = fs::canonicalize(path).map_err(|e| {
            FsAccessError::InvalidPath(format!("sandbox root {}: {}", path.display(), e))
        })?;
        if !canonical.is_dir() {
            return Err(FsAccessError::UnexpectedItemType(format!(
                "sandbox root {} is not a directory",
                canonical.display()
            )));
        }
        Ok(Self(canonical))
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

/// Canonicalizes paths and decides sandbox containment
#[derive(Debug, Clone)]
pub struct PathValidator {
    root: SandboxRoot,
}

impl PathValidator {
    pub fn new(root: SandboxRoot) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &SandboxRoot {
        &self.root
    }

    /// Validate a raw path against the sandbox root
    ///
    /// Relative input is interpreted relative to the root.
    pub fn validate(&self, raw: &Path) -> FsAccessResult<ValidatedPath> {
        let canonical = self.canonicalize(raw)?;
        if !is_contained(&canonical, self.root.as_path()) {
            return Err(FsAccessError::OutsideSandbox(format!(
                "{} resolves to {} outside {}",
                raw.display(),
                canonical.display(),
                self.root.as_path().display()
            )));
        }
        Ok(ValidatedPath::new(canonical))
    }

    /// Canonicalize without the containment check
    ///
    /// Used for bookmark creation and for paths admitted by an active access scope.
    pub fn canonicalize(&self, raw: &Path) -> FsAccessResult<PathBuf> {
        check_raw(raw)?;
        let absolute = if raw.is_absolute() {
            raw.to_path_buf()
        } else {
            self.root.as_path().join(raw)
        };
        canonicalize_lenient(&absolute).map_err(|e| {
            FsAccessError::InvalidPath(format!("cannot resolve {}: {}", raw.display(), e))
        })
    }

    /// Canonicalize an arbitrary path and wrap it without containment
    pub(crate) fn unchecked(&self, raw: &Path) -> FsAccessResult<ValidatedPath> {
        Ok(ValidatedPath::new(self.canonicalize(raw)?))
    }
}

/// Reject empty and NUL-containing input
fn check_raw(raw: &Path) -> FsAccessResult<()> {
    let bytes = raw.as_os_str().as_encoded_bytes();
    if bytes.is_empty() {
        return Err(FsAccessError::InvalidPath("path is empty".into()));
    }
    if bytes.contains(&0) {
        return Err(FsAccessError::InvalidPath(format!(
            "path contains a NUL byte: {}",
            raw.display()
        )));
    }
    Ok(())
}

/// Containment holds when every root component matches the path's, in order
pub fn is_contained(path: &Path, root: &Path) -> bool {
    let mut path_components = path.components();
    for root_component in root.components() {
        match path_components.next() {
            Some(c) if c == root_component => {}
            _ => return false,
        }
    }
    true
}

/// Symlink hops followed through dangling links before giving up
const MAX_SYMLINK_HOPS: usize = 40;

/// Canonicalize a path that may not exist yet
///
/// `.`/`..` are resolved lexically first. The longest existing prefix is then
/// canonicalized (all symlinks followed, including a final one) and the
/// missing tail appended. A dangling symlink is followed to where its target
/// would be created. Fails only when no ancestor can be resolved.
pub fn canonicalize_lenient(path: &Path) -> io::Result<PathBuf> {
    let mut current = PathBuf::from(path_clean::clean(path));
    for _ in 0..MAX_SYMLINK_HOPS {
        match resolve_existing_prefix(&current)? {
            Resolution::Done(resolved) => return Ok(resolved),
            Resolution::Retarget(next) => current = next,
        }
    }
    Err(io::Error::new(
        io::ErrorKind::Other,
        "too many levels of symbolic links",
    ))
}

enum Resolution {
    Done(PathBuf),
    Retarget(PathBuf),
}

fn resolve_existing_prefix(path: &Path) -> io::Result<Resolution> {
    let mut existing = path;
    let mut tail: Vec<&OsStr> = Vec::new();

    loop {
        match fs::canonicalize(existing) {
            Ok(mut resolved) => {
                for name in tail.iter().rev() {
                    resolved.push(name);
                }
                return Ok(Resolution::Done(resolved));
            }
            Err(e) if is_missing(&e) => {
                let is_link = fs::symlink_metadata(existing)
                    .map(|md| md.file_type().is_symlink())
                    .unwrap_or(false);
                if is_link {
                    let target = fs::read_link(existing)?;
                    // Relative targets resolve against the link's real directory
                    let base = fs::canonicalize(existing.parent().unwrap_or_else(|| Path::new("/")))?;
                    let mut next = base.join(target);
                    for name in tail.iter().rev() {
                        next.push(name);
                    }
                    return Ok(Resolution::Retarget(PathBuf::from(path_clean::clean(&next))));
                }

                let name = match existing.components().next_back() {
                    Some(Component::Normal(name)) => name,
                    _ => return Err(e),
                };
                tail.push(name);
                existing = match existing.parent() {
                    Some(parent) if !parent.as_os_str().is_empty() => parent,
                    _ => return Err(e),
                };
            }
            Err(e) => return Err(e),
        }
    }
}

/// A missing component, or a dangling final symlink
fn is_missing(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::NotFound || e.raw_os_error() == Some(libc::ENOTDIR)
}
