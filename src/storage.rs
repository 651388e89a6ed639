//! Storage subsystem
//!
//! This module provides the object container abstraction the rotator works
//! against, and its implementations.
//!
//! Components:
//! - `storage_trait`: the `ObjectContainer` trait defining a uniform API.
//! - `types`: listing types shared by the backends.
//! - `cloud_files`: Rackspace Cloud Files (OpenStack Swift) over HTTP.
//! - `file_storage`: filesystem-backed container for offline runs and inspection.

pub mod cloud_files;
pub mod file_storage;
pub mod storage_trait;
#[cfg(test)]
pub mod test_server;
pub mod types;

pub use cloud_files::{CloudFilesConnection, CloudFilesContainer};
pub use file_storage::FileContainer;
pub use storage_trait::ObjectContainer;
pub use types::{ObjectInfo, DELIMITER};
