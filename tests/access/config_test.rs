/*!
 * Configuration Tests
 * Environment loading; serialized because tests share the process environment
 */

use sandboxed_fs::core::config::{ENV_BOOKMARK_KEY, ENV_CREATE_ROOT, ENV_ERASE_PASSES, ENV_ROOT};
use sandboxed_fs::{AccessConfig, ConfigError, SandboxedFileAccess};
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

fn clear_env() {
    for key in [ENV_ROOT, ENV_CREATE_ROOT, ENV_ERASE_PASSES, ENV_BOOKMARK_KEY] {
        env::remove_var(key);
    }
}

#[test]
#[serial]
fn test_from_env_requires_root() {
    clear_env();
    assert_eq!(
        AccessConfig::from_env(),
        Err(ConfigError::Missing(ENV_ROOT.into()))
    );
}

#[test]
#[serial]
fn test_from_env_reads_all_keys() {
    clear_env();
    env::set_var(ENV_ROOT, "/srv/sandbox");
    env::set_var(ENV_CREATE_ROOT, "true");
    env::set_var(ENV_ERASE_PASSES, "3");
    env::set_var(ENV_BOOKMARK_KEY, "k");

    let config = AccessConfig::from_env().unwrap();
    clear_env();

    assert_eq!(config.sandbox_root, PathBuf::from("/srv/sandbox"));
    assert!(config.create_root);
    assert_eq!(config.erase.passes, 3);
    assert_eq!(config.bookmark.signing_key.as_deref(), Some("k"));
}

#[test]
#[serial]
fn test_from_env_rejects_bad_passes() {
    clear_env();
    env::set_var(ENV_ROOT, "/srv/sandbox");
    env::set_var(ENV_ERASE_PASSES, "many");
    let bad = AccessConfig::from_env();
    env::set_var(ENV_ERASE_PASSES, "0");
    let zero = AccessConfig::from_env();
    clear_env();

    assert!(matches!(bad, Err(ConfigError::Invalid { ref key, .. }) if key == ENV_ERASE_PASSES));
    assert!(matches!(zero, Err(ConfigError::Invalid { ref key, .. }) if key == "erase.passes"));
}

#[test]
#[serial]
fn test_env_config_builds_access() {
    clear_env();
    let temp = TempDir::new().unwrap();
    env::set_var(ENV_ROOT, temp.path());
    let config = AccessConfig::from_env();
    clear_env();

    let access = SandboxedFileAccess::from_config(config.unwrap()).unwrap();
    assert!(access.root().is_dir());
}
