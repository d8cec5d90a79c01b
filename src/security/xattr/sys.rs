/*!
 * Extended Attribute Syscalls
 * Thin wrappers over the C attribute API; errno stays inside this module tree
 */

use std::ffi::{CStr, CString};
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

/// Raw OS error number from a failed attribute call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Errno(pub i32);

#[cfg(any(target_os = "linux", target_os = "android"))]
const ENOATTR: i32 = libc::ENODATA;
#[cfg(any(target_os = "macos", target_os = "ios"))]
const ENOATTR: i32 = libc::ENOATTR;
#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios"
)))]
const ENOATTR: i32 = libc::ENOENT;

impl Errno {
    fn last() -> Self {
        Errno(io::Error::last_os_error().raw_os_error().unwrap_or(libc::EIO))
    }

    /// The named attribute does not exist
    pub fn is_no_attribute(self) -> bool {
        self.0 == ENOATTR
    }

    /// The file itself does not exist
    pub fn is_missing_path(self) -> bool {
        self.0 == libc::ENOENT
    }

    /// Buffer too small: the value grew after it was probed
    pub fn is_range(self) -> bool {
        self.0 == libc::ERANGE
    }

    /// Value exceeds what the filesystem can store
    pub fn is_too_large(self) -> bool {
        self.0 == libc::E2BIG || self.0 == libc::ENOSPC || self.0 == libc::ERANGE
    }

    /// Filesystem does not do attributes (or not in this namespace)
    pub fn is_unsupported(self) -> bool {
        self.0 == libc::ENOTSUP || self.0 == libc::EOPNOTSUPP
    }

    pub fn describe(self) -> String {
        io::Error::from_raw_os_error(self.0).to_string()
    }
}

pub(super) fn c_path(path: &Path) -> Result<CString, Errno> {
    CString::new(path.as_os_str().as_bytes()).map_err(|_| Errno(libc::EINVAL))
}

pub(super) fn c_name(name: &str) -> Result<CString, Errno> {
    CString::new(name).map_err(|_| Errno(libc::EINVAL))
}

fn check_size(ret: libc::ssize_t) -> Result<usize, Errno> {
    if ret < 0 {
        Err(Errno::last())
    } else {
        Ok(ret as usize)
    }
}

fn check_unit(ret: libc::c_int) -> Result<(), Errno> {
    if ret < 0 {
        Err(Errno::last())
    } else {
        Ok(())
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
mod imp {
    use super::*;

    pub fn get(path: &CStr, name: &CStr, buf: Option<&mut [u8]>) -> Result<usize, Errno> {
        let (ptr, len) = match buf {
            Some(b) => (b.as_mut_ptr() as *mut libc::c_void, b.len()),
            None => (std::ptr::null_mut(), 0),
        };
        // SAFETY: path and name are NUL-terminated; ptr is null with len 0 or valid for len bytes
        check_size(unsafe { libc::getxattr(path.as_ptr(), name.as_ptr(), ptr, len) })
    }

    pub fn list(path: &CStr, buf: Option<&mut [u8]>) -> Result<usize, Errno> {
        let (ptr, len) = match buf {
            Some(b) => (b.as_mut_ptr() as *mut libc::c_char, b.len()),
            None => (std::ptr::null_mut(), 0),
        };
        // SAFETY: as in `get`
        check_size(unsafe { libc::listxattr(path.as_ptr(), ptr, len) })
    }

    pub fn set(path: &CStr, name: &CStr, value: &[u8]) -> Result<(), Errno> {
        // SAFETY: value is valid for value.len() bytes
        check_unit(unsafe {
            libc::setxattr(
                path.as_ptr(),
                name.as_ptr(),
                value.as_ptr() as *const libc::c_void,
                value.len(),
                0,
            )
        })
    }

    pub fn remove(path: &CStr, name: &CStr) -> Result<(), Errno> {
        // SAFETY: both pointers are NUL-terminated strings
        check_unit(unsafe { libc::removexattr(path.as_ptr(), name.as_ptr()) })
    }
}

#[cfg(any(target_os = "macos", target_os = "ios"))]
mod imp {
    use super::*;

    pub fn get(path: &CStr, name: &CStr, buf: Option<&mut [u8]>) -> Result<usize, Errno> {
        let (ptr, len) = match buf {
            Some(b) => (b.as_mut_ptr() as *mut libc::c_void, b.len()),
            None => (std::ptr::null_mut(), 0),
        };
        // SAFETY: path and name are NUL-terminated; ptr is null with len 0 or valid for len bytes
        check_size(unsafe { libc::getxattr(path.as_ptr(), name.as_ptr(), ptr, len, 0, 0) })
    }

    pub fn list(path: &CStr, buf: Option<&mut [u8]>) -> Result<usize, Errno> {
        let (ptr, len) = match buf {
            Some(b) => (b.as_mut_ptr() as *mut libc::c_char, b.len()),
            None => (std::ptr::null_mut(), 0),
        };
        // SAFETY: as in `get`
        check_size(unsafe { libc::listxattr(path.as_ptr(), ptr, len, 0) })
    }

    pub fn set(path: &CStr, name: &CStr, value: &[u8]) -> Result<(), Errno> {
        // SAFETY: value is valid for value.len() bytes
        check_unit(unsafe {
            libc::setxattr(
                path.as_ptr(),
                name.as_ptr(),
                value.as_ptr() as *const libc::c_void,
                value.len(),
                0,
                0,
            )
        })
    }

    pub fn remove(path: &CStr, name: &CStr) -> Result<(), Errno> {
        // SAFETY: both pointers are NUL-terminated strings
        check_unit(unsafe { libc::removexattr(path.as_ptr(), name.as_ptr(), 0) })
    }
}

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios"
)))]
mod imp {
    use super::*;

    pub fn get(_: &CStr, _: &CStr, _: Option<&mut [u8]>) -> Result<usize, Errno> {
        Err(Errno(libc::ENOTSUP))
    }

    pub fn list(_: &CStr, _: Option<&mut [u8]>) -> Result<usize, Errno> {
        Err(Errno(libc::ENOTSUP))
    }

    pub fn set(_: &CStr, _: &CStr, _: &[u8]) -> Result<(), Errno> {
        Err(Errno(libc::ENOTSUP))
    }

    pub fn remove(_: &CStr, _: &CStr) -> Result<(), Errno> {
        Err(Errno(libc::ENOTSUP))
    }
}

/// Phase 1 of a read: size of the value with a null, zero-length buffer
pub(super) fn probe_value_size(path: &CStr, name: &CStr) -> Result<usize, Errno> {
    imp::get(path, name, None)
}

/// Phase 2 of a read: fill `buf`, returning the byte count the OS reported
pub(super) fn read_value(path: &CStr, name: &CStr, buf: &mut [u8]) -> Result<usize, Errno> {
    imp::get(path, name, Some(buf))
}

/// Phase 1 of a listing: size of the NUL-separated name buffer
pub(super) fn probe_list_size(path: &CStr) -> Result<usize, Errno> {
    imp::list(path, None)
}

/// Phase 2 of a listing
pub(super) fn read_list(path: &CStr, buf: &mut [u8]) -> Result<usize, Errno> {
    imp::list(path, Some(buf))
}

pub(super) fn write_value(path: &CStr, name: &CStr, value: &[u8]) -> Result<(), Errno> {
    imp::set(path, name, value)
}

pub(super) fn remove_value(path: &CStr, name: &CStr) -> Result<(), Errno> {
    imp::remove(path, name)
}

/// Split a listing buffer on its embedded NUL bytes
pub(super) fn split_names(buf: &[u8]) -> Vec<String> {
    buf.split(|b| *b == 0)
        .filter(|raw| !raw.is_empty())
        .map(|raw| String::from_utf8_lossy(raw).into_owned())
        .collect()
}
