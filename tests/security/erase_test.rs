/*!
 * Secure Erase Integration Tests
 * Overwrite verification and abort-before-removal via an instrumented provider
 */

use sandboxed_fs::vfs::VfsResult;
use sandboxed_fs::{
    AccessConfig, Entry, EraseConfig, FileSystem, FsAccessError, LocalFS, Metadata, OpenFile,
    OpenFlags, SandboxedFileAccess,
};
use std::fs;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// LocalFS with switches for skipping deletes and failing overwrites
#[derive(Default)]
struct InstrumentedFs {
    inner: LocalFS,
    keep_deleted: bool,
    fail_writes: bool,
    syncs: Arc<AtomicUsize>,
}

struct InstrumentedFile {
    inner: Box<dyn OpenFile>,
    fail_writes: bool,
    syncs: Arc<AtomicUsize>,
}

impl Read for InstrumentedFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for InstrumentedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::Other, "injected write failure"));
        }
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl Seek for InstrumentedFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

impl OpenFile for InstrumentedFile {
    fn sync(&mut self) -> VfsResult<()> {
        self.syncs.fetch_add(1, Ordering::SeqCst);
        self.inner.sync()
    }
}

impl FileSystem for InstrumentedFs {
    fn read(&self, path: &Path) -> VfsResult<Vec<u8>> {
        self.inner.read(path)
    }

    fn write(&self, path: &Path, data: &[u8]) -> VfsResult<()> {
        self.inner.write(path, data)
    }

    fn create(&self, path: &Path) -> VfsResult<()> {
        self.inner.create(path)
    }

    fn delete(&self, path: &Path) -> VfsResult<()> {
        if self.keep_deleted {
            return Ok(());
        }
        self.inner.delete(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn metadata(&self, path: &Path) -> VfsResult<Metadata> {
        self.inner.metadata(path)
    }

    fn list_dir(&self, path: &Path) -> VfsResult<Vec<Entry>> {
        self.inner.list_dir(path)
    }

    fn create_dir(&self, path: &Path) -> VfsResult<()> {
        self.inner.create_dir(path)
    }

    fn remove_dir(&self, path: &Path) -> VfsResult<()> {
        self.inner.remove_dir(path)
    }

    fn copy(&self, from: &Path, to: &Path) -> VfsResult<()> {
        self.inner.copy(from, to)
    }

    fn rename(&self, from: &Path, to: &Path) -> VfsResult<()> {
        self.inner.rename(from, to)
    }

    fn open(&self, path: &Path, flags: OpenFlags) -> VfsResult<Box<dyn OpenFile>> {
        Ok(Box::new(InstrumentedFile {
            inner: self.inner.open(path, flags)?,
            fail_writes: self.fail_writes,
            syncs: Arc::clone(&self.syncs),
        }))
    }

    fn name(&self) -> &str {
        "instrumented"
    }
}

fn access_with(temp: &TempDir, fs: InstrumentedFs, erase: EraseConfig) -> SandboxedFileAccess<InstrumentedFs> {
    let mut config = AccessConfig::new(temp.path());
    config.erase = erase;
    SandboxedFileAccess::new(config, Arc::new(fs)).unwrap()
}

#[test]
fn test_overwrite_randomizes_in_place() {
    let temp = TempDir::new().unwrap();
    let original = vec![b'A'; 150_000];
    fs::write(temp.path().join("secret.bin"), &original).unwrap();

    let fs_impl = InstrumentedFs {
        keep_deleted: true,
        ..Default::default()
    };
    let access = access_with(&temp, fs_impl, EraseConfig::default());
    access.secure_delete(Path::new("secret.bin")).unwrap();

    let after = fs::read(temp.path().join("secret.bin")).unwrap();
    assert_eq!(after.len(), original.len());
    assert_ne!(after, original);
}

#[test]
fn test_zero_final_pass_leaves_zeros() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("secret.bin"), vec![b'A'; 1000]).unwrap();

    let fs_impl = InstrumentedFs {
        keep_deleted: true,
        ..Default::default()
    };
    let erase = EraseConfig {
        passes: 2,
        zero_final_pass: true,
        ..EraseConfig::default()
    };
    let access = access_with(&temp, fs_impl, erase);
    access.secure_delete(Path::new("secret.bin")).unwrap();

    let after = fs::read(temp.path().join("secret.bin")).unwrap();
    assert_eq!(after, vec![0u8; 1000]);
}

#[test]
fn test_each_pass_is_synced() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.bin"), vec![1u8; 10]).unwrap();

    let syncs = Arc::new(AtomicUsize::new(0));
    let fs_impl = InstrumentedFs {
        syncs: Arc::clone(&syncs),
        ..Default::default()
    };
    let erase = EraseConfig {
        passes: 3,
        zero_final_pass: true,
        ..EraseConfig::default()
    };
    let access = access_with(&temp, fs_impl, erase);
    access.delete(Path::new("a.bin"), true).unwrap();

    assert_eq!(syncs.load(Ordering::SeqCst), 4);
    assert!(!temp.path().join("a.bin").exists());
}

#[test]
fn test_overwrite_failure_preserves_file() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("keep.txt"), b"important").unwrap();

    let fs_impl = InstrumentedFs {
        fail_writes: true,
        ..Default::default()
    };
    let access = access_with(&temp, fs_impl, EraseConfig::default());

    assert!(matches!(
        access.secure_delete(Path::new("keep.txt")),
        Err(FsAccessError::EraseFailure(_))
    ));
    assert_eq!(fs::read(temp.path().join("keep.txt")).unwrap(), b"important");
}

#[test]
fn test_tree_failure_keeps_remaining_files() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("tree")).unwrap();
    fs::write(temp.path().join("tree/a.txt"), b"a").unwrap();

    let fs_impl = InstrumentedFs {
        fail_writes: true,
        ..Default::default()
    };
    let access = access_with(&temp, fs_impl, EraseConfig::default());

    assert!(access.secure_delete(Path::new("tree")).is_err());
    assert!(temp.path().join("tree/a.txt").exists());
}

#[test]
fn test_secure_delete_of_empty_file_and_tree() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("tree/inner")).unwrap();
    fs::write(temp.path().join("tree/empty"), b"").unwrap();
    fs::write(temp.path().join("tree/inner/data"), vec![9u8; 4096]).unwrap();

    let access = access_with(&temp, InstrumentedFs::default(), EraseConfig::default());
    access.secure_delete(Path::new("tree")).unwrap();
    assert!(!temp.path().join("tree").exists());
    assert!(matches!(
        access.secure_delete(Path::new("tree")),
        Err(FsAccessError::NotFound(_))
    ));
}
