/*!
 * Extended Attribute Store
 * Named byte blobs attached to files, via the two-phase size-probe protocol
 *
 * Reads probe the value size with a null buffer, allocate exactly that much
 * and read again; a fixed-size buffer would silently truncate. Another writer
 * can resize the value between the two calls: that race is detected and
 * reported as a read failure, not prevented.
 */

mod sys;
mod value;

pub use value::{AttributeKind, AttributeValue};

use std::ffi::CString;
use tracing::debug;

use self::sys::Errno;
use crate::core::config::XattrConfig;
use crate::core::errors::{FsAccessError, FsAccessResult};
use crate::security::path::ValidatedPath;

/// Namespaces the Linux kernel recognises; unqualified names get the default one
#[cfg(any(target_os = "linux", target_os = "android"))]
const KNOWN_NAMESPACES: &[&str] = &["user.", "trusted.", "security.", "system."];

/// Attribute written and removed by [`ExtendedAttributeStore::supports_attributes`]
const PROBE_NAME: &str = "sandboxed-fs.probe";

/// Get/set/list/remove extended attributes on validated paths
#[derive(Debug, Clone)]
pub struct ExtendedAttributeStore {
    config: XattrConfig,
}

impl ExtendedAttributeStore {
    pub fn new(config: XattrConfig) -> Self {
        Self { config }
    }

    /// Read an attribute, guessing its type (UTF-8 text, else bytes)
    ///
    /// See [`AttributeValue::from_bytes_lossy`] for why this is lossy.
    pub fn get(&self, path: &ValidatedPath, name: &str) -> FsAccessResult<AttributeValue> {
        Ok(AttributeValue::from_bytes_lossy(self.get_raw(path, name)?))
    }

    /// Read an attribute and decode it as `kind`
    pub fn get_as(
        &self,
        path: &ValidatedPath,
        name: &str,
        kind: AttributeKind,
    ) -> FsAccessResult<AttributeValue> {
        AttributeValue::from_bytes(kind, &self.get_raw(path, name)?)
    }

    /// Read the exact stored bytes
    pub fn get_raw(&self, path: &ValidatedPath, name: &str) -> FsAccessResult<Vec<u8>> {
        let qualified = self.qualify(name).map_err(FsAccessError::ReadFailure)?;
        let c_path = sys::c_path(path.as_path()).map_err(|e| read_error(e, path, &qualified))?;
        let c_name = sys::c_name(&qualified).map_err(|e| read_error(e, path, &qualified))?;

        let probed = sys::probe_value_size(&c_path, &c_name)
            .map_err(|e| read_error(e, path, &qualified))?;
        if probed == 0 {
            return Ok(Vec::new());
        }

        let mut buf = vec![0u8; probed];
        let read = sys::read_value(&c_path, &c_name, &mut buf).map_err(|e| {
            if e.is_range() {
                FsAccessError::ReadFailure(format!(
                    "attribute {} on {} grew after its size was probed ({} bytes)",
                    qualified,
                    path.as_path().display(),
                    probed
                ))
            } else {
                read_error(e, path, &qualified)
            }
        })?;

        if read != probed {
            return Err(FsAccessError::ReadFailure(format!(
                "attribute {} on {} changed size: probed {} bytes, read {}",
                qualified,
                path.as_path().display(),
                probed,
                read
            )));
        }

        debug!(name = %qualified, size = read, "read extended attribute");
        Ok(buf)
    }

    /// Store a typed value as raw bytes
    pub fn set(&self, path: &ValidatedPath, name: &str, value: &AttributeValue) -> FsAccessResult<()> {
        self.set_raw(path, name, &value.to_bytes()?)
    }

    /// Store raw bytes, refusing values over the configured limit
    pub fn set_raw(&self, path: &ValidatedPath, name: &str, bytes: &[u8]) -> FsAccessResult<()> {
        let qualified = self.qualify(name).map_err(FsAccessError::WriteFailure)?;
        if bytes.len() > self.config.max_value_size {
            return Err(FsAccessError::WriteFailure(format!(
                "value of {} bytes for {} exceeds the {} byte attribute limit",
                bytes.len(),
                qualified,
                self.config.max_value_size
            )));
        }

        let c_path = sys::c_path(path.as_path()).map_err(|e| write_error(e, path, &qualified))?;
        let c_name = sys::c_name(&qualified).map_err(|e| write_error(e, path, &qualified))?;
        sys::write_value(&c_path, &c_name, bytes).map_err(|e| {
            if e.is_too_large() {
                FsAccessError::WriteFailure(format!(
                    "value of {} bytes for {} exceeds the filesystem attribute limit",
                    bytes.len(),
                    qualified
                ))
            } else {
                write_error(e, path, &qualified)
            }
        })?;

        debug!(name = %qualified, size = bytes.len(), "wrote extended attribute");
        Ok(())
    }

    /// Names of all attributes; empty when there are none
    pub fn list(&self, path: &ValidatedPath) -> FsAccessResult<Vec<String>> {
        let list_error = |e: Errno| {
            FsAccessError::ReadFailure(format!(
                "list attributes of {}: {}",
                path.as_path().display(),
                e.describe()
            ))
        };
        let c_path = sys::c_path(path.as_path()).map_err(list_error)?;

        let probed = sys::probe_list_size(&c_path).map_err(list_error)?;
        if probed == 0 {
            return Ok(Vec::new());
        }

        let mut buf = vec![0u8; probed];
        let read = sys::read_list(&c_path, &mut buf).map_err(|e| {
            if e.is_range() {
                FsAccessError::ReadFailure(format!(
                    "attribute list of {} grew after its size was probed",
                    path.as_path().display()
                ))
            } else {
                list_error(e)
            }
        })?;
        if read != probed {
            return Err(FsAccessError::ReadFailure(format!(
                "attribute list of {} changed size: probed {} bytes, read {}",
                path.as_path().display(),
                probed,
                read
            )));
        }

        Ok(sys::split_names(&buf)
            .into_iter()
            .map(|name| self.unqualify(name))
            .collect())
    }

    /// Remove an attribute
    pub fn remove(&self, path: &ValidatedPath, name: &str) -> FsAccessResult<()> {
        let qualified = self.qualify(name).map_err(FsAccessError::WriteFailure)?;
        let c_path = sys::c_path(path.as_path()).map_err(|e| write_error(e, path, &qualified))?;
        let c_name = sys::c_name(&qualified).map_err(|e| write_error(e, path, &qualified))?;

        sys::remove_value(&c_path, &c_name).map_err(|e| {
            if e.is_no_attribute() || e.is_missing_path() {
                not_found(path, &qualified)
            } else {
                write_error(e, path, &qualified)
            }
        })?;

        debug!(name = %qualified, "removed extended attribute");
        Ok(())
    }

    /// Whether the filesystem under `path` accepts attributes in the default namespace
    pub fn supports_attributes(&self, path: &ValidatedPath) -> bool {
        let written = self.set_raw(path, PROBE_NAME, b"1").is_ok();
        if written {
            let _ = self.remove(path, PROBE_NAME);
        }
        written
    }

    /// Name as handed to the OS
    fn qualify(&self, name: &str) -> Result<String, String> {
        if name.is_empty() {
            return Err("attribute name is empty".into());
        }
        if name.contains('\0') {
            return Err(format!("attribute name {:?} contains a NUL byte", name));
        }
        if CString::new(self.config.default_namespace.as_str()).is_err() {
            return Err("default attribute namespace contains a NUL byte".into());
        }
        Ok(self.apply_namespace(name))
    }

    #[cfg(any(target_os = "linux", target_os = "android"))]
    fn apply_namespace(&self, name: &str) -> String {
        if KNOWN_NAMESPACES.iter().any(|ns| name.starts_with(ns)) {
            name.to_string()
        } else {
            format!("{}{}", self.config.default_namespace, name)
        }
    }

    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    fn apply_namespace(&self, name: &str) -> String {
        name.to_string()
    }

    /// Name as reported to callers
    #[cfg(any(target_os = "linux", target_os = "android"))]
    fn unqualify(&self, name: String) -> String {
        match name.strip_prefix(self.config.default_namespace.as_str()) {
            Some(stripped) if !stripped.is_empty() => stripped.to_string(),
            _ => name,
        }
    }

    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    fn unqualify(&self, name: String) -> String {
        name
    }
}

fn not_found(path: &ValidatedPath, name: &str) -> FsAccessError {
    FsAccessError::NotFound(format!(
        "attribute {} on {}",
        name,
        path.as_path().display()
    ))
}

fn read_error(e: Errno, path: &ValidatedPath, name: &str) -> FsAccessError {
    if e.is_no_attribute() || e.is_missing_path() {
        return not_found(path, name);
    }
    FsAccessError::ReadFailure(format!(
        "read attribute {} on {}: {}",
        name,
        path.as_path().display(),
        e.describe()
    ))
}

fn write_error(e: Errno, path: &ValidatedPath, name: &str) -> FsAccessError {
    let mut reason = format!(
        "write attribute {} on {}: {}",
        name,
        path.as_path().display(),
        e.describe()
    );
    if e.is_unsupported() {
        reason.push_str(" (filesystem does not support extended attributes)");
    }
    FsAccessError::WriteFailure(reason)
}
