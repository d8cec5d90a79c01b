/*!
 * Binary Serialization with bincode
 * Compact framed encoding for opaque tokens handed to callers
 */

use serde::{de::DeserializeOwned, Serialize};

/// Result type for bincode operations
pub type BincodeResult<T> = Result<T, BincodeError>;

/// Binary serialization errors
#[derive(Debug, thiserror::Error)]
pub enum BincodeError {
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Deserialization error: {0}")]
    Deserialization(String),
    #[error("Frame error: {0}")]
    Frame(String),
}

/// Serialize to binary bytes using bincode
#[inline]
pub fn to_vec<T: Serialize>(value: &T) -> BincodeResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| BincodeError::Serialization(e.to_string()))
}

/// Deserialize from binary bytes using bincode
#[inline]
pub fn from_slice<T: DeserializeOwned>(bytes: &[u8]) -> BincodeResult<T> {
    bincode::deserialize(bytes).map_err(|e| BincodeError::Deserialization(e.to_string()))
}

/// Serialize behind a magic/version header
///
/// Format: [magic][version byte][4-byte LE length][bincode data]
pub fn to_framed<T: Serialize>(magic: &[u8; 4], version: u8, value: &T) -> BincodeResult<Vec<u8>> {
    let data = to_vec(value)?;
    let len = u32::try_from(data.len())
        .map_err(|_| BincodeError::Frame(format!("payload of {} bytes too large", data.len())))?;

    let mut result = Vec::with_capacity(9 + data.len());
    result.extend_from_slice(magic);
    result.push(version);
    result.extend_from_slice(&len.to_le_bytes());
    result.extend_from_slice(&data);
    Ok(result)
}

/// Split a frame produced by [`to_framed`], returning the payload and any trailing bytes
pub fn split_framed<'a>(
    magic: &[u8; 4],
    version: u8,
    bytes: &'a [u8],
) -> BincodeResult<(&'a [u8], &'a [u8])> {
    if bytes.len() < 9 {
        return Err(BincodeError::Frame("buffer too short for header".into()));
    }
    if &bytes[..4] != magic {
        return Err(BincodeError::Frame("bad magic".into()));
    }
    if bytes[4] != version {
        return Err(BincodeError::Frame(format!(
            "unsupported version {} (expected {})",
            bytes[4], version
        )));
    }

    let len = u32::from_le_bytes([bytes[5], bytes[6], bytes[7], bytes[8]]) as usize;
    let body = &bytes[9..];
    if body.len() < len {
        return Err(BincodeError::Frame(format!(
            "truncated payload: expected {} bytes, got {}",
            len,
            body.len()
        )));
    }
    Ok(body.split_at(len))
}
