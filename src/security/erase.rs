/*!
 * Secure Erase
 * Overwrite-before-remove deletion through the file provider
 *
 * Each pass rewrites the existing bytes in place with random data from the OS
 * RNG and syncs. The file is only removed after every pass succeeded; any
 * overwrite failure leaves it present. Journaling and copy-on-write
 * filesystems as well as SSD wear levelling may keep older copies of the
 * data: this is best effort, not a forensic guarantee.
 */

use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::core::config::EraseConfig;
use crate::core::errors::{FsAccessError, FsAccessResult};
use crate::security::path::ValidatedPath;
use crate::vfs::{FileSystem, FileType, OpenFile, OpenFlags, VfsError};

/// One file scheduled for overwriting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EraseRequest {
    pub target: PathBuf,
    pub length: u64,
    pub passes: u32,
}

/// Overwrites and removes files and directory trees
pub struct SecureEraser<F: FileSystem + ?Sized> {
    fs: Arc<F>,
    config: EraseConfig,
}

impl<F: FileSystem + ?Sized> SecureEraser<F> {
    pub fn new(fs: Arc<F>, config: EraseConfig) -> Self {
        Self { fs, config }
    }

    pub fn passes(&self) -> u32 {
        self.config.passes.max(1)
    }

    /// Erase one regular file
    pub fn erase(&self, path: &ValidatedPath) -> FsAccessResult<()> {
        let md = self.fs.metadata(path.as_path()).map_err(erase_error)?;
        if md.is_dir() {
            return Err(FsAccessError::UnexpectedItemType(format!(
                "{} is a directory; use erase_tree",
                path.as_path().display()
            )));
        }
        if !md.is_file() {
            return Err(FsAccessError::UnexpectedItemType(format!(
                "{} is not a regular file",
                path.as_path().display()
            )));
        }
        self.erase_file(path.as_path(), md.size)
    }

    /// Erase a directory depth-first, or a single file
    ///
    /// Symlinks inside the tree are unlinked, never followed.
    pub fn erase_tree(&self, path: &ValidatedPath) -> FsAccessResult<()> {
        let md = self.fs.metadata(path.as_path()).map_err(erase_error)?;
        if !md.is_dir() {
            return self.erase(path);
        }
        let files = self.erase_dir(path.as_path())?;
        info!(files, passes = self.passes(), "securely erased directory tree");
        Ok(())
    }

    fn erase_dir(&self, dir: &Path) -> FsAccessResult<usize> {
        let mut files = 0;
        for entry in self.fs.list_dir(dir).map_err(erase_error)? {
            let child = dir.join(&entry.name);
            match entry.file_type {
                FileType::Directory => files += self.erase_dir(&child)?,
                FileType::File => {
                    let md = self.fs.metadata(&child).map_err(erase_error)?;
                    self.erase_file(&child, md.size)?;
                    files += 1;
                }
                FileType::Symlink | FileType::Special | FileType::Unknown => {
                    self.fs.delete(&child).map_err(erase_error)?;
                    debug!(path = %child.display(), sensitive = true, "unlinked without overwrite");
                }
            }
        }
        self.fs.remove_dir(dir).map_err(erase_error)?;
        Ok(files)
    }

    fn erase_file(&self, path: &Path, length: u64) -> FsAccessResult<()> {
        let request = EraseRequest {
            target: path.to_path_buf(),
            length,
            passes: self.passes(),
        };

        if let Err(e) = self.overwrite(&request) {
            error!(
                path = %path.display(),
                sensitive = true,
                reason = %e,
                "overwrite failed; file left in place"
            );
            return Err(e);
        }

        self.fs.delete(path).map_err(erase_error)?;
        debug!(path = %path.display(), sensitive = true, length, passes = request.passes, "erased file");
        Ok(())
    }

    fn overwrite(&self, request: &EraseRequest) -> FsAccessResult<()> {
        if request.length == 0 {
            return Ok(());
        }

        let mut handle = self
            .fs
            .open(&request.target, OpenFlags::overwrite_in_place())
            .map_err(erase_error)?;
        let chunk = (self.config.chunk_size.max(1) as u64).min(request.length) as usize;
        let mut buf = vec![0u8; chunk];

        for _ in 0..request.passes {
            fill_pass(&mut *handle, &mut buf, request.length, |b| {
                OsRng.try_fill_bytes(b).map_err(|e| {
                    FsAccessError::EraseFailure(format!("random source failed: {}", e))
                })
            })?;
        }
        if self.config.zero_final_pass {
            fill_pass(&mut *handle, &mut buf, request.length, |b| {
                b.fill(0);
                Ok(())
            })?;
        }
        Ok(())
    }
}

/// Rewrite `length` bytes from offset 0, refilling `buf` per chunk, then sync
fn fill_pass<G>(file: &mut dyn OpenFile, buf: &mut [u8], length: u64, mut fill: G) -> FsAccessResult<()>
where
    G: FnMut(&mut [u8]) -> FsAccessResult<()>,
{
    file.seek(SeekFrom::Start(0)).map_err(io_failure)?;
    let mut remaining = length;
    while remaining > 0 {
        let n = (buf.len() as u64).min(remaining) as usize;
        fill(&mut buf[..n])?;
        file.write_all(&buf[..n]).map_err(io_failure)?;
        remaining -= n as u64;
    }
    file.flush().map_err(io_failure)?;
    file.sync().map_err(erase_error)
}

fn io_failure(e: std::io::Error) -> FsAccessError {
    FsAccessError::EraseFailure(format!("overwrite: {}", e))
}

fn erase_error(e: VfsError) -> FsAccessError {
    match e {
        VfsError::NotFound(r) => FsAccessError::NotFound(r),
        other => FsAccessError::EraseFailure(other.to_string()),
    }
}
