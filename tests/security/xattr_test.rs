/*!
 * Extended Attribute Integration Tests
 * Skipped when the temporary filesystem rejects user attributes
 */

use pretty_assertions::assert_eq;
use sandboxed_fs::{
    AttributeKind, AttributeValue, ExtendedAttributeStore, FsAccessError, PathValidator,
    SandboxRoot, ValidatedPath, XattrConfig,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::{Duration, UNIX_EPOCH};
use tempfile::TempDir;

struct Fixture {
    _temp: TempDir,
    store: ExtendedAttributeStore,
    file: ValidatedPath,
    validator: PathValidator,
}

/// None when user attributes are unavailable here
fn fixture_with(config: XattrConfig) -> Option<Fixture> {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("file.txt"), b"content").unwrap();
    let validator = PathValidator::new(SandboxRoot::new(temp.path()).unwrap());
    let file = validator.validate(Path::new("file.txt")).unwrap();
    let store = ExtendedAttributeStore::new(config);

    if !store.supports_attributes(&file) {
        eprintln!("skipping: filesystem does not support user extended attributes");
        return None;
    }
    Some(Fixture {
        _temp: temp,
        store,
        file,
        validator,
    })
}

fn fixture() -> Option<Fixture> {
    fixture_with(XattrConfig::default())
}

fn user_names(names: Vec<String>) -> Vec<String> {
    names
        .into_iter()
        .filter(|n| !(n.starts_with("security.") || n.starts_with("system.") || n.starts_with("trusted.")))
        .collect()
}

#[test]
fn test_set_then_raw_is_byte_identical() {
    let Some(fx) = fixture() else { return };
    let values = vec![
        AttributeValue::from("v1"),
        AttributeValue::I32(-5),
        AttributeValue::U64(u64::MAX),
        AttributeValue::Bool(true),
        AttributeValue::Bytes(vec![0, 255, 1]),
        AttributeValue::Uri("https://example.com/a".into()),
    ];
    for (i, value) in values.iter().enumerate() {
        let name = format!("com.example.v{}", i);
        fx.store.set(&fx.file, &name, value).unwrap();
        assert_eq!(fx.store.get_raw(&fx.file, &name).unwrap(), value.to_bytes().unwrap());
    }
}

#[test]
fn test_typed_reads() {
    let Some(fx) = fixture() else { return };
    let when = UNIX_EPOCH + Duration::from_micros(1_700_000_000_123_456);
    let mut map = BTreeMap::new();
    map.insert("owner".to_string(), AttributeValue::from("alice"));
    map.insert("rev".to_string(), AttributeValue::I64(3));
    let map = AttributeValue::Map(map);

    fx.store.set(&fx.file, "com.example.when", &AttributeValue::Timestamp(when)).unwrap();
    fx.store.set(&fx.file, "com.example.meta", &map).unwrap();

    assert_eq!(
        fx.store.get_as(&fx.file, "com.example.when", AttributeKind::Timestamp).unwrap(),
        AttributeValue::Timestamp(when)
    );
    assert_eq!(
        fx.store.get_as(&fx.file, "com.example.meta", AttributeKind::Map).unwrap(),
        map
    );
}

#[test]
fn test_utf8_heuristic() {
    let Some(fx) = fixture() else { return };
    fx.store.set(&fx.file, "com.example.text", &AttributeValue::from("hello")).unwrap();
    fx.store
        .set(&fx.file, "com.example.blob", &AttributeValue::Bytes(vec![0xff, 0xfe]))
        .unwrap();

    assert_eq!(
        fx.store.get(&fx.file, "com.example.text").unwrap(),
        AttributeValue::String("hello".into())
    );
    assert_eq!(
        fx.store.get(&fx.file, "com.example.blob").unwrap(),
        AttributeValue::Bytes(vec![0xff, 0xfe])
    );
}

#[test]
fn test_list_and_remove() {
    let Some(fx) = fixture() else { return };
    assert!(user_names(fx.store.list(&fx.file).unwrap()).is_empty());

    fx.store.set(&fx.file, "com.example.tag", &AttributeValue::from("v1")).unwrap();
    fx.store.set(&fx.file, "com.example.other", &AttributeValue::from("v2")).unwrap();
    let mut names = user_names(fx.store.list(&fx.file).unwrap());
    names.sort();
    assert_eq!(names, vec!["com.example.other", "com.example.tag"]);

    fx.store.remove(&fx.file, "com.example.tag").unwrap();
    assert_eq!(user_names(fx.store.list(&fx.file).unwrap()), vec!["com.example.other"]);
}

#[test]
fn test_empty_value() {
    let Some(fx) = fixture() else { return };
    fx.store.set_raw(&fx.file, "com.example.empty", b"").unwrap();
    assert!(fx.store.get_raw(&fx.file, "com.example.empty").unwrap().is_empty());
}

#[test]
fn test_missing_attribute_and_file() {
    let Some(fx) = fixture() else { return };
    assert!(matches!(
        fx.store.get(&fx.file, "com.example.none"),
        Err(FsAccessError::NotFound(_))
    ));
    assert!(matches!(
        fx.store.remove(&fx.file, "com.example.none"),
        Err(FsAccessError::NotFound(_))
    ));

    let missing = fx.validator.validate(Path::new("missing.txt")).unwrap();
    assert!(matches!(
        fx.store.get(&missing, "com.example.tag"),
        Err(FsAccessError::NotFound(_))
    ));
    assert!(matches!(
        fx.store.list(&missing),
        Err(FsAccessError::ReadFailure(_))
    ));
    assert!(matches!(
        fx.store.set(&missing, "com.example.tag", &AttributeValue::from("x")),
        Err(FsAccessError::WriteFailure(_))
    ));
}

#[test]
fn test_oversized_value_rejected() {
    let config = XattrConfig {
        max_value_size: 16,
        ..XattrConfig::default()
    };
    let Some(fx) = fixture_with(config) else { return };
    let err = fx
        .store
        .set_raw(&fx.file, "com.example.big", &[0u8; 17])
        .unwrap_err();
    assert!(matches!(err, FsAccessError::WriteFailure(_)));
    assert!(err.reason().contains("exceeds"));
}

#[test]
fn test_invalid_names() {
    let Some(fx) = fixture() else { return };
    assert!(matches!(
        fx.store.get(&fx.file, ""),
        Err(FsAccessError::ReadFailure(_))
    ));
    assert!(matches!(
        fx.store.set(&fx.file, "", &AttributeValue::from("x")),
        Err(FsAccessError::WriteFailure(_))
    ));
}
