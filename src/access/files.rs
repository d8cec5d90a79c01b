/*!
 * File Operations
 * Validated read, write, copy, move, list and delete
 */

use std::path::Path;

use tracing::debug;

use super::{AccessIntent, SandboxedFileAccess};
use crate::core::errors::{FsAccessError, FsAccessResult};
use crate::monitoring::OperationSpan;
use crate::security::ValidatedPath;
use crate::vfs::{Entry, FileSystem, FileType, Metadata, VfsError};

impl<F: FileSystem + ?Sized> SandboxedFileAccess<F> {
    pub fn exists(&self, path: &Path) -> FsAccessResult<bool> {
        let span = OperationSpan::with_path("exists", path);
        let _guard = span.enter();
        span.complete(
            self.authorize(path, AccessIntent::Read)
                .map(|target| self.fs.exists(target.as_path())),
        )
    }

    pub fn metadata(&self, path: &Path) -> FsAccessResult<Metadata> {
        let span = OperationSpan::with_path("metadata", path);
        let _guard = span.enter();
        span.complete(self.authorize(path, AccessIntent::Read).and_then(|target| {
            self.fs
                .metadata(target.as_path())
                .map_err(FsAccessError::from_read)
        }))
    }

    pub fn read_file(&self, path: &Path) -> FsAccessResult<Vec<u8>> {
        let span = OperationSpan::with_path("read_file", path);
        let _guard = span.enter();
        let result = self.authorize(path, AccessIntent::Read).and_then(|target| {
            self.fs.read(target.as_path()).map_err(FsAccessError::from_read)
        });
        if let Ok(ref data) = result {
            span.record_debug("bytes", data.len());
        }
        span.complete(result)
    }

    /// Write a whole file, creating missing parents
    ///
    /// Without `overwrite` an existing file is `AlreadyExists`.
    pub fn write_file(&self, path: &Path, data: &[u8], overwrite: bool) -> FsAccessResult<()> {
        let span = OperationSpan::with_path("write_file", path);
        let _guard = span.enter();
        span.record_debug("bytes", data.len());
        span.complete(self.write_file_inner(path, data, overwrite))
    }

    fn write_file_inner(&self, path: &Path, data: &[u8], overwrite: bool) -> FsAccessResult<()> {
        let target = self.authorize(path, AccessIntent::Write)?;
        if let Ok(md) = self.fs.metadata(target.as_path()) {
            if md.is_dir() {
                return Err(FsAccessError::UnexpectedItemType(format!(
                    "{} is a directory",
                    target.as_path().display()
                )));
            }
            if !overwrite {
                return Err(FsAccessError::AlreadyExists(format!(
                    "{}",
                    target.as_path().display()
                )));
            }
        }
        self.fs
            .write(target.as_path(), data)
            .map_err(FsAccessError::from_write)
    }

    /// Create an empty file; `AlreadyExists` if anything is there
    pub fn create_file(&self, path: &Path) -> FsAccessResult<()> {
        let span = OperationSpan::with_path("create_file", path);
        let _guard = span.enter();
        span.complete(self.authorize(path, AccessIntent::Write).and_then(|target| {
            self.fs
                .create(target.as_path())
                .map_err(FsAccessError::from_write)
        }))
    }

    /// Create a directory and any missing parents
    pub fn create_directory(&self, path: &Path) -> FsAccessResult<()> {
        let span = OperationSpan::with_path("create_directory", path);
        let _guard = span.enter();
        span.complete(self.authorize(path, AccessIntent::Write).and_then(|target| {
            match self.fs.metadata(target.as_path()) {
                Ok(md) if md.is_dir() => Ok(()),
                Ok(_) => Err(FsAccessError::AlreadyExists(format!(
                    "{} exists and is not a directory",
                    target.as_path().display()
                ))),
                Err(_) => self
                    .fs
                    .create_dir(target.as_path())
                    .map_err(FsAccessError::from_write),
            }
        }))
    }

    /// Entries sorted by name
    pub fn list_directory(&self, path: &Path) -> FsAccessResult<Vec<Entry>> {
        let span = OperationSpan::with_path("list_directory", path);
        let _guard = span.enter();
        span.complete(self.authorize(path, AccessIntent::Read).and_then(|target| {
            let mut entries = self
                .fs
                .list_dir(target.as_path())
                .map_err(FsAccessError::from_read)?;
            entries.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(entries)
        }))
    }

    /// Copy a file or directory tree; the destination must not exist
    ///
    /// Symlinks inside a copied tree are skipped.
    pub fn copy_item(&self, from: &Path, to: &Path) -> FsAccessResult<()> {
        let span = OperationSpan::with_path("copy_item", from);
        let _guard = span.enter();
        span.record_debug("to", to);
        span.complete(self.copy_item_inner(from, to))
    }

    fn copy_item_inner(&self, from: &Path, to: &Path) -> FsAccessResult<()> {
        let source = self.authorize(from, AccessIntent::Read)?;
        let dest = self.authorize(to, AccessIntent::Write)?;
        self.ensure_vacant(&dest)?;
        self.copy_tree(source.as_path(), dest.as_path())
    }

    /// Move a file or directory; the destination must not exist
    ///
    /// Across devices the tree is copied then removed. Trees holding symlinks
    /// or special files are refused there, before anything is copied.
    pub fn move_item(&self, from: &Path, to: &Path) -> FsAccessResult<()> {
        let span = OperationSpan::with_path("move_item", from);
        let _guard = span.enter();
        span.record_debug("to", to);
        span.complete(self.move_item_inner(from, to))
    }

    fn move_item_inner(&self, from: &Path, to: &Path) -> FsAccessResult<()> {
        let source = self.authorize(from, AccessIntent::Write)?;
        let dest = self.authorize(to, AccessIntent::Write)?;
        self.ensure_not_root(&source)?;
        self.ensure_vacant(&dest)?;

        match self.fs.rename(source.as_path(), dest.as_path()) {
            Ok(()) => Ok(()),
            Err(VfsError::CrossDevice) => {
                debug!("rename crosses devices, copying instead");
                self.ensure_regular_tree(source.as_path())?;
                self.copy_tree(source.as_path(), dest.as_path())?;
                self.remove_tree(source.as_path())
            }
            Err(e) => Err(FsAccessError::from_write(e)),
        }
    }

    /// Remove a file or directory tree, optionally overwriting file contents first
    pub fn delete(&self, path: &Path, secure: bool) -> FsAccessResult<()> {
        let span = OperationSpan::with_path(if secure { "secure_delete" } else { "delete" }, path);
        let _guard = span.enter();
        span.complete(self.delete_inner(path, secure))
    }

    /// Shorthand for `delete(path, true)`
    pub fn secure_delete(&self, path: &Path) -> FsAccessResult<()> {
        self.delete(path, true)
    }

    fn delete_inner(&self, path: &Path, secure: bool) -> FsAccessResult<()> {
        let target = self.authorize(path, AccessIntent::Write)?;
        self.ensure_not_root(&target)?;
        if !self.fs.exists(target.as_path()) {
            return Err(FsAccessError::NotFound(format!(
                "{}",
                target.as_path().display()
            )));
        }

        if secure {
            self.eraser.erase_tree(&target)
        } else {
            self.remove_tree(target.as_path())
        }
    }

    fn ensure_vacant(&self, dest: &ValidatedPath) -> FsAccessResult<()> {
        if self.fs.exists(dest.as_path()) {
            return Err(FsAccessError::AlreadyExists(format!(
                "{}",
                dest.as_path().display()
            )));
        }
        Ok(())
    }

    fn ensure_not_root(&self, target: &ValidatedPath) -> FsAccessResult<()> {
        if target.as_path() == self.root() {
            return Err(FsAccessError::InvalidPath(
                "the sandbox root itself cannot be moved or deleted".into(),
            ));
        }
        Ok(())
    }

    fn copy_tree(&self, from: &Path, to: &Path) -> FsAccessResult<()> {
        let md = self.fs.metadata(from).map_err(FsAccessError::from_read)?;
        if !md.is_dir() {
            return self.fs.copy(from, to).map_err(FsAccessError::from_write);
        }
        if to.starts_with(from) {
            return Err(FsAccessError::InvalidPath(format!(
                "cannot copy {} into itself",
                from.display()
            )));
        }

        self.fs.create_dir(to).map_err(FsAccessError::from_write)?;
        for entry in self.fs.list_dir(from).map_err(FsAccessError::from_read)? {
            let (src, dst) = (from.join(&entry.name), to.join(&entry.name));
            match entry.file_type {
                FileType::Directory => self.copy_tree(&src, &dst)?,
                FileType::File => self.fs.copy(&src, &dst).map_err(FsAccessError::from_write)?,
                _ => debug!(path = %src.display(), sensitive = true, "skipped non-regular entry"),
            }
        }
        Ok(())
    }

    /// Fail on the first entry `copy_tree` would skip
    fn ensure_regular_tree(&self, path: &Path) -> FsAccessResult<()> {
        let md = self.fs.metadata(path).map_err(FsAccessError::from_read)?;
        if !md.is_dir() {
            return Ok(());
        }
        for entry in self.fs.list_dir(path).map_err(FsAccessError::from_read)? {
            let child = path.join(&entry.name);
            match entry.file_type {
                FileType::Directory => self.ensure_regular_tree(&child)?,
                FileType::File => {}
                other => {
                    return Err(FsAccessError::UnexpectedItemType(format!(
                        "{} is a {:?} and cannot be moved across devices",
                        child.display(),
                        other
                    )))
                }
            }
        }
        Ok(())
    }

    /// Plain recursive removal; symlinks are unlinked, never followed
    fn remove_tree(&self, path: &Path) -> FsAccessResult<()> {
        let md = self.fs.metadata(path).map_err(FsAccessError::from_write)?;
        if !md.is_dir() {
            return self.fs.delete(path).map_err(FsAccessError::from_write);
        }
        for entry in self.fs.list_dir(path).map_err(FsAccessError::from_read)? {
            let child = path.join(&entry.name);
            if entry.is_dir() {
                self.remove_tree(&child)?;
            } else {
                self.fs.delete(&child).map_err(FsAccessError::from_write)?;
            }
        }
        self.fs.remove_dir(path).map_err(FsAccessError::from_write)
    }
}
