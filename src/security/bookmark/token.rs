/*!
 * Bookmark Tokens
 * Sealed, self-describing records of a bookmarked file
 *
 * Layout: [SFBM][version][u32 LE length][bincode record][HMAC-SHA256 tag]
 * The tag covers everything before it, so a token only opens under the key
 * that sealed it.
 */

use std::fmt;
use std::path::PathBuf;
use std::time::SystemTime;

use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::identity::FileIdentity;
use crate::core::bincode;
use crate::core::errors::{FsAccessError, FsAccessResult};
use crate::core::serde::system_time_micros;

const TOKEN_MAGIC: &[u8; 4] = b"SFBM";
const TOKEN_VERSION: u8 = 1;
const TAG_LEN: usize = 32;

type HmacSha256 = Hmac<Sha256>;

/// Opaque persistable bookmark bytes
///
/// Store these between runs and hand them back to
/// [`super::SecurityBookmarkManager::resolve`].
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookmarkToken(Vec<u8>);

impl BookmarkToken {
    /// Wrap bytes previously obtained from [`BookmarkToken::as_bytes`]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for BookmarkToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BookmarkToken({} bytes)", self.0.len())
    }
}

/// What a token remembers about its target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct BookmarkRecord {
    pub path: PathBuf,
    pub identity: FileIdentity,
    pub read_only: bool,
    pub is_dir: bool,
    #[serde(with = "system_time_micros")]
    pub created: SystemTime,
}

/// HMAC-SHA256 sealing key
pub(crate) struct TokenSealer {
    mac: HmacSha256,
}

impl TokenSealer {
    /// Sealer for a caller-supplied key
    pub fn new(key: &[u8]) -> FsAccessResult<Self> {
        let mac = HmacSha256::new_from_slice(key).map_err(|e| {
            FsAccessError::CreationFailure(format!("invalid bookmark key: {}", e))
        })?;
        Ok(Self { mac })
    }

    /// Sealer with a fresh key from the OS RNG
    pub fn random() -> FsAccessResult<Self> {
        let mut key = [0u8; TAG_LEN];
        OsRng.try_fill_bytes(&mut key).map_err(|e| {
            FsAccessError::CreationFailure(format!("cannot generate bookmark key: {}", e))
        })?;
        Self::new(&key)
    }

    pub fn seal(&self, record: &BookmarkRecord) -> FsAccessResult<BookmarkToken> {
        let mut bytes = bincode::to_framed(TOKEN_MAGIC, TOKEN_VERSION, record)
            .map_err(|e| FsAccessError::CreationFailure(e.to_string()))?;
        let tag = self.tag(&bytes);
        bytes.extend_from_slice(&tag);
        Ok(BookmarkToken(bytes))
    }

    pub fn open(&self, token: &BookmarkToken) -> FsAccessResult<BookmarkRecord> {
        let bytes = token.as_bytes();
        if bytes.len() <= TAG_LEN {
            return Err(FsAccessError::ResolutionFailure(format!(
                "token of {} bytes is too short",
                bytes.len()
            )));
        }

        let (sealed, tag) = bytes.split_at(bytes.len() - TAG_LEN);
        let mut mac = self.mac.clone();
        mac.update(sealed);
        if mac.verify_slice(tag).is_err() {
            return Err(FsAccessError::ResolutionFailure(
                "token signature does not match; corrupt or sealed with another key".into(),
            ));
        }

        let (payload, trailing) = bincode::split_framed(TOKEN_MAGIC, TOKEN_VERSION, sealed)
            .map_err(|e| FsAccessError::ResolutionFailure(e.to_string()))?;
        if !trailing.is_empty() {
            return Err(FsAccessError::ResolutionFailure(format!(
                "{} unexpected bytes after token payload",
                trailing.len()
            )));
        }
        bincode::from_slice(payload).map_err(|e| FsAccessError::ResolutionFailure(e.to_string()))
    }

    fn tag(&self, message: &[u8]) -> [u8; TAG_LEN] {
        let mut mac = self.mac.clone();
        mac.update(message);
        mac.finalize().into_bytes().into()
    }
}

impl fmt::Debug for TokenSealer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenSealer { key: <redacted> }")
    }
}
