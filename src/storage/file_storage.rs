use std::fs;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, error, info};
use walkdir::WalkDir;

use crate::error_handling::types::StorageError;
use crate::storage::storage_trait::ObjectContainer;
use crate::storage::types::{build_listing, ListingEntry, ListingQuery, ObjectInfo};

/// A container kept on the local filesystem: one directory per container,
/// one file per object, keys mapped to relative paths.
pub struct FileContainer {
    name: String,
    root: PathBuf,
}

impl FileContainer {
    /// Opens the container `name` under `base_path`, creating its directory if needed.
    pub fn open<P: AsRef<Path>>(base_path: P, name: &str) -> Result<Self, StorageError> {
        let root = base_path.as_ref().join(name);
        fs::create_dir_all(&root).map_err(|e| { error!("Failed to create container dir {}: {}", root.display(), e); StorageError::IoError(e) })?;
        info!("FileContainer {} initialized at {}", name, root.display());

        Ok(Self {
            name: name.to_string(),
            root,
        })
    }

    pub fn root(&self) -> &Path { &self.root }

    fn object_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        if relative.components().any(|c| !matches!(c, Component::Normal(_) | Component::CurDir)) {
            error!("Refusing key {} outside of container {}", key, self.name);
            return Err(StorageError::IoError(std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("invalid object key {}", key))));
        }
        Ok(self.root.join(relative))
    }

    /// Every object in the container, sorted by key.
    fn load_objects(&self) -> Result<Vec<ObjectInfo>, StorageError> {
        let mut objects = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1) {
            let entry = entry.map_err(|e| { error!("Dir entry error in {}: {}", self.root.display(), e); StorageError::IoError(e.into()) })?;
            if !entry.file_type().is_file() { continue; }

            let relative = match entry.path().strip_prefix(&self.root) { Ok(r) => r, Err(_) => continue };
            let name = relative.components().map(|c| c.as_os_str().to_string_lossy()).collect::<Vec<_>>().join("/");
            let metadata = entry.metadata().map_err(|e| { error!("Failed to stat {}: {}", entry.path().display(), e); StorageError::IoError(e.into()) })?;
            let last_modified = metadata.modified().ok().map(|t| DateTime::<Utc>::from(t).to_rfc3339());

            objects.push(ObjectInfo {
                content_type: Some(mime_guess::from_path(&name).first_or_octet_stream().to_string()),
                name,
                bytes: metadata.len(),
                hash: None,
                last_modified,
            });
        }
        objects.sort_by(|a, b| a.name.cmp(&b.name));
        debug!("Loaded {} object(s) from {}", objects.len(), self.root.display());
        Ok(objects)
    }

    /// Removes directories left empty by a delete, up to the container root.
    fn remove_empty_parents(&self, path: &Path) {
        let mut current = path.parent();
        while let Some(dir) = current {
            if dir == self.root || fs::remove_dir(dir).is_err() { break; }
            current = dir.parent();
        }
    }
}

#[async_trait]
impl ObjectContainer for FileContainer {
    fn name(&self) -> &str { &self.name }

    async fn list_prefixes(&self, delimiter: char) -> Result<Vec<String>, StorageError> {
        let objects = self.load_objects()?;
        let query = ListingQuery { delimiter: Some(delimiter), ..Default::default() };
        Ok(build_listing(&objects, &query, usize::MAX).iter().map(|e| e.marker().to_string()).collect())
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectInfo>, StorageError> {
        let objects = self.load_objects()?;
        let query = ListingQuery { prefix: Some(prefix.to_string()), ..Default::default() };
        Ok(build_listing(&objects, &query, usize::MAX)
            .into_iter()
            .filter_map(|e| match e { ListingEntry::Object(info) => Some(info), ListingEntry::Subdir { .. } => None })
            .collect())
    }

    async fn upload_object(&self, key: &str, source: &Path) -> Result<ObjectInfo, StorageError> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| { error!("Failed to create dir {}: {}", parent.display(), e); StorageError::IoError(e) })?;
        }
        let bytes = fs::copy(source, &path).map_err(|e| { error!("Copy {} -> {} failed: {}", source.display(), path.display(), e); StorageError::IoError(e) })?;
        info!("Stored {} as {}/{}", source.display(), self.name, key);

        Ok(ObjectInfo {
            name: key.to_string(),
            bytes,
            hash: None,
            last_modified: Some(Utc::now().to_rfc3339()),
            content_type: Some(mime_guess::from_path(key).first_or_octet_stream().to_string()),
        })
    }

    async fn delete_object(&self, object: &ObjectInfo) -> Result<(), StorageError> {
        let path = self.object_path(&object.name)?;
        fs::remove_file(&path).map_err(|e| { error!("Failed to delete {}: {}", path.display(), e); StorageError::IoError(e) })?;
        self.remove_empty_parents(&path);
        debug!("Deleted {}/{}", self.name, object.name);
        Ok(())
    }
}
