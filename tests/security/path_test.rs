/*!
 * Path Validation Integration Tests
 * Containment, traversal and symlink handling against a real directory tree
 */

use proptest::prelude::*;
use sandboxed_fs::{FsAccessError, PathValidator, SandboxRoot};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn validator(temp: &TempDir) -> PathValidator {
    PathValidator::new(SandboxRoot::new(temp.path()).unwrap())
}

#[test]
fn test_absolute_paths_inside_and_outside() {
    let temp = TempDir::new().unwrap();
    let v = validator(&temp);
    let root = v.root().as_path().to_path_buf();

    assert!(v.validate(&root.join("docs/readme.txt")).is_ok());
    assert!(v.validate(&root).is_ok());
    assert!(matches!(
        v.validate(Path::new("/etc/hosts")),
        Err(FsAccessError::OutsideSandbox(_))
    ));
}

#[test]
fn test_dot_dot_out_of_root() {
    let temp = TempDir::new().unwrap();
    let v = validator(&temp);
    let root = v.root().as_path().to_path_buf();

    let escaped = root.join("../etc/hosts");
    assert!(matches!(
        v.validate(&escaped),
        Err(FsAccessError::OutsideSandbox(_))
    ));
    assert!(matches!(
        v.validate(Path::new("../../etc/passwd")),
        Err(FsAccessError::OutsideSandbox(_))
    ));
}

#[test]
fn test_sibling_with_shared_prefix_is_outside() {
    let parent = TempDir::new().unwrap();
    let root = parent.path().join("sandbox");
    let sibling = parent.path().join("sandbox-other");
    fs::create_dir(&root).unwrap();
    fs::create_dir(&sibling).unwrap();

    let v = PathValidator::new(SandboxRoot::new(&root).unwrap());
    assert!(matches!(
        v.validate(&sibling.join("file")),
        Err(FsAccessError::OutsideSandbox(_))
    ));
}

#[test]
fn test_symlinked_directory_inside_root_is_allowed() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("real")).unwrap();
    std::os::unix::fs::symlink(temp.path().join("real"), temp.path().join("alias")).unwrap();

    let v = validator(&temp);
    let path = v.validate(Path::new("alias/new.txt")).unwrap();
    assert_eq!(path.as_path(), v.root().as_path().join("real/new.txt"));
}

#[test]
fn test_dangling_link_behind_escaping_directory_is_outside() {
    let temp = TempDir::new().unwrap();
    let outside = TempDir::new().unwrap();
    fs::create_dir(outside.path().join("x")).unwrap();
    std::os::unix::fs::symlink(outside.path().join("x"), temp.path().join("linkdir")).unwrap();
    std::os::unix::fs::symlink("../y", outside.path().join("x/d")).unwrap();
    fs::create_dir(temp.path().join("y")).unwrap();

    let v = validator(&temp);
    match v.validate(Path::new("linkdir/d")) {
        Err(FsAccessError::OutsideSandbox(reason)) => {
            let real = fs::canonicalize(outside.path()).unwrap().join("y");
            assert!(reason.contains(&real.display().to_string()), "{}", reason);
        }
        other => panic!("expected OutsideSandbox, got {:?}", other),
    }
}

#[test]
fn test_is_dir_hint() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("docs")).unwrap();
    let v = validator(&temp);
    assert!(v.validate(Path::new("docs")).unwrap().is_dir());
    assert!(!v.validate(Path::new("docs/none")).unwrap().is_dir());
}

fn segment() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["a", "b", "docs", ".", "..", "x.txt"])
}

proptest! {
    #[test]
    fn prop_containment_matches_lexical_prefix(segments in prop::collection::vec(segment(), 1..8)) {
        let temp = TempDir::new().unwrap();
        let v = validator(&temp);
        let root = v.root().as_path().to_path_buf();

        let relative: PathBuf = segments.iter().collect();
        let expected = path_clean::clean(root.join(&relative)).starts_with(&root);

        match v.validate(&relative) {
            Ok(path) => {
                prop_assert!(expected);
                prop_assert!(path.is_within(&root));
            }
            Err(FsAccessError::OutsideSandbox(_)) => prop_assert!(!expected),
            Err(other) => prop_assert!(false, "unexpected error {:?}", other),
        }
    }
}
