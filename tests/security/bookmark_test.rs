/*!
 * Bookmark Integration Tests
 * Staleness, sealing keys and scoped access outside the sandbox
 */

use pretty_assertions::assert_eq;
use sandboxed_fs::{
    AccessConfig, BookmarkConfig, BookmarkToken, FsAccessError, SandboxedFileAccess,
    SecurityBookmarkManager,
};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

struct Setup {
    _sandbox: TempDir,
    _outside: TempDir,
    access: SandboxedFileAccess,
    outside: PathBuf,
}

fn setup() -> Setup {
    let sandbox = TempDir::new().unwrap();
    let outside_dir = TempDir::new().unwrap();
    let outside = fs::canonicalize(outside_dir.path()).unwrap();
    let access = SandboxedFileAccess::from_config(AccessConfig::new(sandbox.path())).unwrap();
    Setup {
        _sandbox: sandbox,
        _outside: outside_dir,
        access,
        outside,
    }
}

#[test]
fn test_rename_makes_bookmark_stale() {
    let s = setup();
    let a = s.outside.join("a.txt");
    fs::write(&a, b"payload").unwrap();

    let token = s.access.create_bookmark(&a, false).unwrap();
    let b = s.outside.join("b.txt");
    fs::rename(&a, &b).unwrap();

    let resolved = s.access.resolve_bookmark(&token).unwrap();
    assert!(resolved.stale);
    assert_eq!(resolved.path, b);
}

#[test]
fn test_unmoved_bookmark_is_fresh() {
    let s = setup();
    let a = s.outside.join("a.txt");
    fs::write(&a, b"payload").unwrap();

    let token = s.access.create_bookmark(&a, true).unwrap();
    let resolved = s.access.resolve_bookmark(&token).unwrap();
    assert!(!resolved.stale);
    assert!(resolved.read_only);
    assert_eq!(resolved.path, a);
}

#[test]
fn test_create_bookmark_rejects_bad_input() {
    let s = setup();
    assert!(matches!(
        s.access.create_bookmark(std::path::Path::new(""), false),
        Err(FsAccessError::InvalidPath(_))
    ));
    assert!(matches!(
        s.access.create_bookmark(&s.outside.join("missing"), false),
        Err(FsAccessError::CreationFailure(_))
    ));
}

#[test]
fn test_outside_access_only_while_scoped() {
    let s = setup();
    let file = s.outside.join("notes.txt");
    fs::write(&file, b"outside").unwrap();

    assert!(matches!(
        s.access.read_file(&file),
        Err(FsAccessError::OutsideSandbox(_))
    ));
    assert!(!s.access.start_accessing(&file));

    let token = s.access.create_bookmark(&file, false).unwrap();
    s.access.resolve_bookmark(&token).unwrap();
    assert!(s.access.start_accessing(&file));
    assert_eq!(s.access.read_file(&file).unwrap(), b"outside");
    s.access.write_file(&file, b"changed", true).unwrap();

    s.access.stop_accessing(&file);
    assert!(matches!(
        s.access.read_file(&file),
        Err(FsAccessError::OutsideSandbox(_))
    ));
}

#[test]
fn test_nested_starts_need_matching_stops() {
    let s = setup();
    let file = s.outside.join("nested.txt");
    fs::write(&file, b"x").unwrap();
    let token = s.access.create_bookmark(&file, false).unwrap();
    s.access.resolve_bookmark(&token).unwrap();

    assert!(s.access.start_accessing(&file));
    assert!(s.access.start_accessing(&file));
    s.access.stop_accessing(&file);
    assert!(s.access.read_file(&file).is_ok());
    s.access.stop_accessing(&file);
    assert!(s.access.read_file(&file).is_err());

    // unbalanced stop is logged, not fatal
    s.access.stop_accessing(&file);
}

#[test]
fn test_read_only_scope_refuses_writes() {
    let s = setup();
    let file = s.outside.join("ro.txt");
    fs::write(&file, b"keep").unwrap();
    let token = s.access.create_bookmark(&file, true).unwrap();
    s.access.resolve_bookmark(&token).unwrap();

    let _scope = s.access.scoped_access(&file).unwrap();
    assert_eq!(s.access.read_file(&file).unwrap(), b"keep");
    assert!(matches!(
        s.access.write_file(&file, b"nope", true),
        Err(FsAccessError::OutsideSandbox(_))
    ));
    assert!(matches!(
        s.access.delete(&file, false),
        Err(FsAccessError::OutsideSandbox(_))
    ));
    assert_eq!(fs::read(&file).unwrap(), b"keep");
}

#[test]
fn test_directory_scope_covers_children() {
    let s = setup();
    let dir = s.outside.join("project");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("a.txt"), b"a").unwrap();

    let token = s.access.create_bookmark(&dir, false).unwrap();
    s.access.resolve_bookmark(&token).unwrap();
    {
        let _scope = s.access.scoped_access(&dir).unwrap();
        assert_eq!(s.access.read_file(&dir.join("a.txt")).unwrap(), b"a");
        s.access.write_file(&dir.join("sub/b.txt"), b"b", false).unwrap();
        assert_eq!(s.access.list_directory(&dir).unwrap().len(), 2);
    }
    assert!(matches!(
        s.access.read_file(&dir.join("a.txt")),
        Err(FsAccessError::OutsideSandbox(_))
    ));
}

#[test]
fn test_token_persists_across_instances_with_shared_key() {
    let outside = TempDir::new().unwrap();
    let file = fs::canonicalize(outside.path()).unwrap().join("doc.txt");
    fs::write(&file, b"x").unwrap();

    let config = BookmarkConfig {
        signing_key: Some("shared secret".into()),
        ..BookmarkConfig::default()
    };
    let token = SecurityBookmarkManager::new(&config).unwrap().create(&file, false).unwrap();

    let stored = serde_json::to_string(&token).unwrap();
    let restored: BookmarkToken = serde_json::from_str(&stored).unwrap();
    let resolved = SecurityBookmarkManager::new(&config).unwrap().resolve(&restored).unwrap();
    assert_eq!(resolved.path, file);
    assert!(!resolved.stale);

    let stranger = SecurityBookmarkManager::new(&BookmarkConfig::default()).unwrap();
    assert!(matches!(
        stranger.resolve(&restored),
        Err(FsAccessError::ResolutionFailure(_))
    ));
}

#[test]
fn test_garbage_token_fails() {
    let s = setup();
    let token = BookmarkToken::from_bytes(b"definitely not a bookmark token, just some bytes".to_vec());
    assert!(matches!(
        s.access.resolve_bookmark(&token),
        Err(FsAccessError::ResolutionFailure(_))
    ));
}

#[test]
fn test_concurrent_scopes_balance() {
    let s = setup();
    let file = s.outside.join("shared.txt");
    fs::write(&file, b"x").unwrap();
    let token = s.access.create_bookmark(&file, false).unwrap();
    s.access.resolve_bookmark(&token).unwrap();

    let access = Arc::new(s.access);
    std::thread::scope(|scope| {
        for _ in 0..8 {
            let access = Arc::clone(&access);
            let file = file.clone();
            scope.spawn(move || {
                for _ in 0..50 {
                    assert!(access.start_accessing(&file));
                    assert!(access.read_file(&file).is_ok());
                    access.stop_accessing(&file);
                }
            });
        }
    });

    assert!(!access.bookmarks().is_accessing(&file));
}
