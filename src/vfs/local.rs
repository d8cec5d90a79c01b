/*!
 * Local Filesystem Backend
 * Wraps std::fs for host filesystem access
 */

use std::fs;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use super::traits::{FileSystem, OpenFile};
use super::types::*;

/// Host filesystem provider using std::fs
///
/// Operates directly on absolute host paths and performs no containment
/// checks. Wrap it in [`crate::SandboxedFileAccess`] to get validation.
#[derive(Debug, Clone, Default)]
pub struct LocalFS;

impl LocalFS {
    pub fn new() -> Self {
        Self
    }

    fn ensure_parent(path: &Path) -> VfsResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                VfsError::from_io(e, format!("create parent dirs for {}", path.display()))
            })?;
        }
        Ok(())
    }
}

impl FileSystem for LocalFS {
    fn read(&self, path: &Path) -> VfsResult<Vec<u8>> {
        fs::read(path).map_err(|e| VfsError::from_io(e, format!("read {}", path.display())))
    }

    fn write(&self, path: &Path, data: &[u8]) -> VfsResult<()> {
        Self::ensure_parent(path)?;
        fs::write(path, data).map_err(|e| VfsError::from_io(e, format!("write {}", path.display())))
    }

    fn create(&self, path: &Path) -> VfsResult<()> {
        Self::ensure_parent(path)?;
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| VfsError::from_io(e, format!("create {}", path.display())))?;
        Ok(())
    }

    fn delete(&self, path: &Path) -> VfsResult<()> {
        fs::remove_file(path).map_err(|e| VfsError::from_io(e, format!("delete {}", path.display())))
    }

    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn metadata(&self, path: &Path) -> VfsResult<Metadata> {
        let md = fs::metadata(path)
            .map_err(|e| VfsError::from_io(e, format!("metadata {}", path.display())))?;
        Ok(Metadata::from_std(&md))
    }

    fn list_dir(&self, path: &Path) -> VfsResult<Vec<Entry>> {
        let entries = fs::read_dir(path)
            .map_err(|e| VfsError::from_io(e, format!("list_dir {}", path.display())))?;

        let mut result = Vec::new();
        for entry in entries {
            let entry = entry
                .map_err(|e| VfsError::from_io(e, format!("read dir entry in {}", path.display())))?;
            let name = entry.file_name().into_string().map_err(|raw| {
                VfsError::InvalidPath(format!("invalid UTF-8 in filename {:?}", raw))
            })?;
            let file_type = entry
                .file_type()
                .map_err(|e| VfsError::from_io(e, format!("get file type for {}", name)))?;

            result.push(Entry::new(name, FileType::from_std(file_type)));
        }

        Ok(result)
    }

    fn create_dir(&self, path: &Path) -> VfsResult<()> {
        fs::create_dir_all(path)
            .map_err(|e| VfsError::from_io(e, format!("create_dir {}", path.display())))
    }

    fn remove_dir(&self, path: &Path) -> VfsResult<()> {
        fs::remove_dir(path)
            .map_err(|e| VfsError::from_io(e, format!("remove_dir {}", path.display())))
    }

    fn copy(&self, from: &Path, to: &Path) -> VfsResult<()> {
        Self::ensure_parent(to)?;
        fs::copy(from, to).map_err(|e| {
            VfsError::from_io(e, format!("copy {} to {}", from.display(), to.display()))
        })?;
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> VfsResult<()> {
        Self::ensure_parent(to)?;
        fs::rename(from, to).map_err(|e| {
            VfsError::from_io(e, format!("rename {} to {}", from.display(), to.display()))
        })
    }

    fn open(&self, path: &Path, flags: OpenFlags) -> VfsResult<Box<dyn OpenFile>> {
        let file = fs::OpenOptions::new()
            .read(flags.read)
            .write(flags.write)
            .append(flags.append)
            .truncate(flags.truncate)
            .create(flags.create)
            .create_new(flags.create_new)
            .open(path)
            .map_err(|e| VfsError::from_io(e, format!("open {}", path.display())))?;

        Ok(Box::new(LocalFile { file }))
    }

    fn name(&self) -> &str {
        "local"
    }
}

/// Local file handle
struct LocalFile {
    file: fs::File,
}

impl Read for LocalFile {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.file.read(buf)
    }
}

impl Write for LocalFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.file.flush()
    }
}

impl Seek for LocalFile {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.file.seek(pos)
    }
}

impl OpenFile for LocalFile {
    fn sync(&mut self) -> VfsResult<()> {
        self.file
            .sync_all()
            .map_err(|e| VfsError::IoError(format!("sync: {}", e)))
    }
}
