/*!
 * Attribute Operations
 * Extended attributes on validated paths
 */

use std::path::Path;

use super::{AccessIntent, SandboxedFileAccess};
use crate::core::errors::FsAccessResult;
use crate::monitoring::OperationSpan;
use crate::security::{AttributeKind, AttributeValue};
use crate::vfs::FileSystem;

impl<F: FileSystem + ?Sized> SandboxedFileAccess<F> {
    /// Read an attribute, guessing text or bytes
    pub fn get_extended_attribute(&self, path: &Path, name: &str) -> FsAccessResult<AttributeValue> {
        let span = OperationSpan::with_path("get_extended_attribute", path);
        let _guard = span.enter();
        span.record_debug("name", name);
        span.complete(
            self.authorize(path, AccessIntent::Read)
                .and_then(|target| self.attributes.get(&target, name)),
        )
    }

    /// Read an attribute stored as `kind`
    pub fn get_extended_attribute_as(
        &self,
        path: &Path,
        name: &str,
        kind: AttributeKind,
    ) -> FsAccessResult<AttributeValue> {
        let span = OperationSpan::with_path("get_extended_attribute_as", path);
        let _guard = span.enter();
        span.record_debug("name", name);
        span.complete(
            self.authorize(path, AccessIntent::Read)
                .and_then(|target| self.attributes.get_as(&target, name, kind)),
        )
    }

    /// Exact stored bytes of an attribute
    pub fn get_extended_attribute_raw(&self, path: &Path, name: &str) -> FsAccessResult<Vec<u8>> {
        let span = OperationSpan::with_path("get_extended_attribute_raw", path);
        let _guard = span.enter();
        span.complete(
            self.authorize(path, AccessIntent::Read)
                .and_then(|target| self.attributes.get_raw(&target, name)),
        )
    }

    pub fn set_extended_attribute(
        &self,
        path: &Path,
        name: &str,
        value: &AttributeValue,
    ) -> FsAccessResult<()> {
        let span = OperationSpan::with_path("set_extended_attribute", path);
        let _guard = span.enter();
        span.record_debug("name", name);
        span.record_debug("kind", value.kind());
        span.complete(
            self.authorize(path, AccessIntent::Write)
                .and_then(|target| self.attributes.set(&target, name, value)),
        )
    }

    pub fn list_extended_attributes(&self, path: &Path) -> FsAccessResult<Vec<String>> {
        let span = OperationSpan::with_path("list_extended_attributes", path);
        let _guard = span.enter();
        span.complete(
            self.authorize(path, AccessIntent::Read)
                .and_then(|target| self.attributes.list(&target)),
        )
    }

    pub fn remove_extended_attribute(&self, path: &Path, name: &str) -> FsAccessResult<()> {
        let span = OperationSpan::with_path("remove_extended_attribute", path);
        let _guard = span.enter();
        span.record_debug("name", name);
        span.complete(
            self.authorize(path, AccessIntent::Write)
                .and_then(|target| self.attributes.remove(&target, name)),
        )
    }
}
