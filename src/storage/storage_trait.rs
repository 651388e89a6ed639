//! Object container contract
//!
//! This module defines the `ObjectContainer` trait, the only view the rotator
//! has of remote storage.
//!
//! Implementors are responsible for:
//! - Listing the top-level groups of keys (timestamp labels)
//! - Listing every object under a prefix
//! - Uploading a local file under a key
//! - Deleting objects
//!
//! All methods return a `Result`; a failure aborts the current rotation.

use crate::error_handling::types::StorageError;
use crate::storage::types::ObjectInfo;
use async_trait::async_trait;
use std::path::Path;

#[async_trait]
pub trait ObjectContainer: Send + Sync {
    /// Name of the container.
    fn name(&self) -> &str;

    /// Lists the distinct top-level entries when keys are split on `delimiter`.
    ///
    /// Grouped keys are returned with the trailing delimiter
    /// (`"2024-01-01T0900/"`); keys without it are returned as-is.
    async fn list_prefixes(&self, delimiter: char) -> Result<Vec<String>, StorageError>;

    /// Lists every object whose key starts with `prefix`.
    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectInfo>, StorageError>;

    /// Creates the object `key` with the full contents of the local file `source`.
    async fn upload_object(&self, key: &str, source: &Path) -> Result<ObjectInfo, StorageError>;

    /// Deletes an object returned by a listing.
    async fn delete_object(&self, object: &ObjectInfo) -> Result<(), StorageError>;
}
