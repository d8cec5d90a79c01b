/*!
 * Attribute Values
 * Typed values stored as raw extended-attribute bytes
 */

use std::collections::BTreeMap;
use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::core::bincode;
use crate::core::errors::{FsAccessError, FsAccessResult};
use crate::core::serde::{from_micros, system_time_micros, to_micros};

/// A typed extended-attribute value
///
/// Scalars encode as fixed-width big-endian bytes, strings and URIs as UTF-8,
/// timestamps as signed microseconds since the UNIX epoch. Lists and maps
/// encode with bincode and keep their element tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeValue {
    String(String),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    Bool(bool),
    F64(f64),
    Bytes(Vec<u8>),
    Timestamp(#[serde(with = "system_time_micros")] SystemTime),
    Uri(String),
    List(Vec<AttributeValue>),
    Map(BTreeMap<String, AttributeValue>),
}

/// Tag naming which [`AttributeValue`] variant a byte blob holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    String,
    I32,
    I64,
    U32,
    U64,
    Bool,
    F64,
    Bytes,
    Timestamp,
    Uri,
    List,
    Map,
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            AttributeKind::String => "string",
            AttributeKind::I32 => "i32",
            AttributeKind::I64 => "i64",
            AttributeKind::U32 => "u32",
            AttributeKind::U64 => "u64",
            AttributeKind::Bool => "bool",
            AttributeKind::F64 => "f64",
            AttributeKind::Bytes => "bytes",
            AttributeKind::Timestamp => "timestamp",
            AttributeKind::Uri => "uri",
            AttributeKind::List => "list",
            AttributeKind::Map => "map",
        };
        f.write_str(name)
    }
}

impl AttributeValue {
    pub fn kind(&self) -> AttributeKind {
        match self {
            AttributeValue::String(_) => AttributeKind::String,
            AttributeValue::I32(_) => AttributeKind::I32,
            AttributeValue::I64(_) => AttributeKind::I64,
            AttributeValue::U32(_) => AttributeKind::U32,
            AttributeValue::U64(_) => AttributeKind::U64,
            AttributeValue::Bool(_) => AttributeKind::Bool,
            AttributeValue::F64(_) => AttributeKind::F64,
            AttributeValue::Bytes(_) => AttributeKind::Bytes,
            AttributeValue::Timestamp(_) => AttributeKind::Timestamp,
            AttributeValue::Uri(_) => AttributeKind::Uri,
            AttributeValue::List(_) => AttributeKind::List,
            AttributeValue::Map(_) => AttributeKind::Map,
        }
    }

    /// Raw bytes as stored in the attribute
    pub fn to_bytes(&self) -> FsAccessResult<Vec<u8>> {
        let bytes = match self {
            AttributeValue::String(s) | AttributeValue::Uri(s) => s.as_bytes().to_vec(),
            AttributeValue::I32(v) => v.to_be_bytes().to_vec(),
            AttributeValue::I64(v) => v.to_be_bytes().to_vec(),
            AttributeValue::U32(v) => v.to_be_bytes().to_vec(),
            AttributeValue::U64(v) => v.to_be_bytes().to_vec(),
            AttributeValue::Bool(v) => vec![u8::from(*v)],
            AttributeValue::F64(v) => v.to_bits().to_be_bytes().to_vec(),
            AttributeValue::Bytes(b) => b.clone(),
            AttributeValue::Timestamp(t) => to_micros(*t).to_be_bytes().to_vec(),
            AttributeValue::List(items) => bincode::to_vec(items)
                .map_err(|e| FsAccessError::WriteFailure(format!("encode list attribute: {}", e)))?,
            AttributeValue::Map(entries) => bincode::to_vec(entries)
                .map_err(|e| FsAccessError::WriteFailure(format!("encode map attribute: {}", e)))?,
        };
        Ok(bytes)
    }

    /// Decode bytes written by [`AttributeValue::to_bytes`] for a known kind
    pub fn from_bytes(kind: AttributeKind, bytes: &[u8]) -> FsAccessResult<Self> {
        let value = match kind {
            AttributeKind::String => AttributeValue::String(utf8(kind, bytes)?),
            AttributeKind::Uri => AttributeValue::Uri(utf8(kind, bytes)?),
            AttributeKind::I32 => AttributeValue::I32(i32::from_be_bytes(fixed(kind, bytes)?)),
            AttributeKind::I64 => AttributeValue::I64(i64::from_be_bytes(fixed(kind, bytes)?)),
            AttributeKind::U32 => AttributeValue::U32(u32::from_be_bytes(fixed(kind, bytes)?)),
            AttributeKind::U64 => AttributeValue::U64(u64::from_be_bytes(fixed(kind, bytes)?)),
            AttributeKind::Bool => match bytes {
                [0] => AttributeValue::Bool(false),
                [1] => AttributeValue::Bool(true),
                _ => return Err(malformed(kind, "expected a single 0 or 1 byte")),
            },
            AttributeKind::F64 => {
                AttributeValue::F64(f64::from_bits(u64::from_be_bytes(fixed(kind, bytes)?)))
            }
            AttributeKind::Bytes => AttributeValue::Bytes(bytes.to_vec()),
            AttributeKind::Timestamp => AttributeValue::Timestamp(from_micros(
                i64::from_be_bytes(fixed(kind, bytes)?),
            )),
            AttributeKind::List => AttributeValue::List(
                bincode::from_slice(bytes).map_err(|e| malformed(kind, &e.to_string()))?,
            ),
            AttributeKind::Map => AttributeValue::Map(
                bincode::from_slice(bytes).map_err(|e| malformed(kind, &e.to_string()))?,
            ),
        };
        Ok(value)
    }

    /// Best-effort decoding without a kind: UTF-8 text, else opaque bytes
    ///
    /// Lossy: a binary value that happens to be valid UTF-8 (e.g. an encoded
    /// integer whose bytes are all ASCII) comes back as a string. Prefer
    /// [`AttributeValue::from_bytes`] when the kind is known.
    pub fn from_bytes_lossy(bytes: Vec<u8>) -> Self {
        match String::from_utf8(bytes) {
            Ok(s) => AttributeValue::String(s),
            Err(e) => AttributeValue::Bytes(e.into_bytes()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) | AttributeValue::Uri(s) => Some(s),
            _ => None,
        }
    }
}

fn utf8(kind: AttributeKind, bytes: &[u8]) -> FsAccessResult<String> {
    String::from_utf8(bytes.to_vec()).map_err(|e| malformed(kind, &e.to_string()))
}

fn fixed<const N: usize>(kind: AttributeKind, bytes: &[u8]) -> FsAccessResult<[u8; N]> {
    bytes
        .try_into()
        .map_err(|_| malformed(kind, &format!("expected {} bytes, found {}", N, bytes.len())))
}

fn malformed(kind: AttributeKind, reason: &str) -> FsAccessError {
    FsAccessError::ReadFailure(format!("attribute is not a valid {}: {}", kind, reason))
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::I64(value)
    }
}

impl From<u64> for AttributeValue {
    fn from(value: u64) -> Self {
        AttributeValue::U64(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::F64(value)
    }
}

impl From<Vec<u8>> for AttributeValue {
    fn from(value: Vec<u8>) -> Self {
        AttributeValue::Bytes(value)
    }
}

impl From<SystemTime> for AttributeValue {
    fn from(value: SystemTime) -> Self {
        AttributeValue::Timestamp(value)
    }
}
