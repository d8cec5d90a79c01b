/*!
 * Access Configuration
 * Sandbox root, erase, attribute and bookmark settings
 */

use super::errors::ConfigError;
use crate::core::serde::is_false;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable naming the sandbox root
pub const ENV_ROOT: &str = "SANDBOX_FS_ROOT";
/// Environment variable enabling creation of a missing root
pub const ENV_CREATE_ROOT: &str = "SANDBOX_FS_CREATE_ROOT";
/// Environment variable with the overwrite pass count
pub const ENV_ERASE_PASSES: &str = "SANDBOX_FS_ERASE_PASSES";
/// Environment variable with the bookmark sealing key
pub const ENV_BOOKMARK_KEY: &str = "SANDBOX_FS_BOOKMARK_KEY";

/// Top-level configuration for [`crate::SandboxedFileAccess`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct AccessConfig {
    pub sandbox_root: PathBuf,
    #[serde(default, skip_serializing_if = "is_false")]
    pub create_root: bool,
    #[serde(default)]
    pub erase: EraseConfig,
    #[serde(default)]
    pub xattr: XattrConfig,
    #[serde(default)]
    pub bookmark: BookmarkConfig,
}

/// Secure erase settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct EraseConfig {
    /// Random overwrite passes; at least one
    pub passes: u32,
    /// Write zeros after the random passes
    pub zero_final_pass: bool,
    /// Bytes written per write call
    pub chunk_size: usize,
}

impl Default for EraseConfig {
    fn default() -> Self {
        Self {
            passes: 1,
            zero_final_pass: false,
            chunk_size: 64 * 1024,
        }
    }
}

/// Extended attribute settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct XattrConfig {
    /// Values larger than this are refused before reaching the OS
    pub max_value_size: usize,
    /// Namespace prepended to unqualified names where the OS requires one
    pub default_namespace: String,
}

impl Default for XattrConfig {
    fn default() -> Self {
        Self {
            max_value_size: 64 * 1024,
            default_namespace: "user.".to_string(),
        }
    }
}

/// Bookmark settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct BookmarkConfig {
    /// Directory levels searched below the recorded parent when relocating a moved item
    pub relocation_depth: usize,
    /// Key sealing tokens; tokens only resolve under the key that created them.
    /// A random per-instance key is used when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signing_key: Option<String>,
}

impl Default for BookmarkConfig {
    fn default() -> Self {
        Self {
            relocation_depth: 2,
            signing_key: None,
        }
    }
}

impl AccessConfig {
    /// Configuration with defaults for everything but the root
    pub fn new<P: Into<PathBuf>>(sandbox_root: P) -> Self {
        Self {
            sandbox_root: sandbox_root.into(),
            create_root: false,
            erase: EraseConfig::default(),
            xattr: XattrConfig::default(),
            bookmark: BookmarkConfig::default(),
        }
    }

    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - SANDBOX_FS_ROOT: sandbox root (required)
    /// - SANDBOX_FS_CREATE_ROOT: create the root if missing (default: false)
    /// - SANDBOX_FS_ERASE_PASSES: overwrite passes (default: 1)
    /// - SANDBOX_FS_BOOKMARK_KEY: bookmark sealing key (default: random)
    pub fn from_env() -> Result<Self, ConfigError> {
        let root = std::env::var(ENV_ROOT).map_err(|_| ConfigError::Missing(ENV_ROOT.into()))?;
        let mut config = Self::new(root);

        if let Ok(value) = std::env::var(ENV_CREATE_ROOT) {
            config.create_root = value == "1" || value.eq_ignore_ascii_case("true");
        }

        if let Ok(value) = std::env::var(ENV_ERASE_PASSES) {
            config.erase.passes = value.parse().map_err(|e| ConfigError::Invalid {
                key: ENV_ERASE_PASSES.into(),
                reason: format!("{}", e),
            })?;
        }

        if let Ok(value) = std::env::var(ENV_BOOKMARK_KEY) {
            if !value.is_empty() {
                config.bookmark.signing_key = Some(value);
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Builder-style override of the erase pass count
    pub fn with_erase_passes(mut self, passes: u32) -> Self {
        self.erase.passes = passes;
        self
    }

    /// Builder-style override of the bookmark key
    pub fn with_signing_key(mut self, key: impl Into<String>) -> Self {
        self.bookmark.signing_key = Some(key.into());
        self
    }

    /// Reject settings the components cannot honour
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sandbox_root.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                key: "sandbox_root".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.erase.passes == 0 {
            return Err(ConfigError::Invalid {
                key: "erase.passes".into(),
                reason: "at least one overwrite pass is required".into(),
            });
        }
        if self.erase.chunk_size == 0 {
            return Err(ConfigError::Invalid {
                key: "erase.chunk_size".into(),
                reason: "must be positive".into(),
            });
        }
        if self.xattr.max_value_size == 0 {
            return Err(ConfigError::Invalid {
                key: "xattr.max_value_size".into(),
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }
}
