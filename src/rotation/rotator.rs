use log::{debug, info};
use std::fmt;
use std::path::Path;

use crate::error_handling::types::{RotateError, StorageError};
use crate::packaging::Packager;
use crate::rotation::prune::select_expired;
use crate::rotation::session::BackupSession;
use crate::rotation::upload_target::UploadTarget;
use crate::storage::storage_trait::ObjectContainer;
use crate::storage::types::DELIMITER;

/// Outcome of one rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationReport {
    pub uploaded: usize,
    pub removed: usize,
}

/// The two summary lines printed after a successful run.
impl fmt::Display for RotationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} file(s) uploaded.", self.uploaded)?;
        write!(f, "{} file(s) removed.", self.removed)
    }
}

/// Backs a path up into a container and prunes old backups.
///
/// A rotation runs three phases in order, stopping at the first error:
/// 1. compress the source into a temporary zip archive,
/// 2. upload it under `<label>/`,
/// 3. delete every object under all but the newest `retention` labels.
///
/// Pruning does not depend on how many files were uploaded. The temporary
/// archive is removed whether or not the rotation succeeds.
pub struct Rotator<C: ObjectContainer> {
    container: C,
    packager: Packager,
}

impl<C: ObjectContainer> Rotator<C> {
    pub fn new(container: C) -> Self {
        Self::with_packager(container, Packager::new())
    }

    pub fn with_packager(container: C, packager: Packager) -> Self {
        Self { container, packager }
    }

    pub fn container(&self) -> &C {
        &self.container
    }

    /// Backs up `source` under the current timestamp and keeps `retention` backups.
    pub async fn rotate(&self, source: &Path, retention: i64) -> Result<RotationReport, RotateError> {
        self.run(BackupSession::new(source, retention)).await
    }

    /// Runs every phase for an already-labelled session.
    pub async fn run(&self, mut session: BackupSession) -> Result<RotationReport, RotateError> {
        info!(
            "Starting backup {} of {} into {}",
            session.label,
            session.source.display(),
            self.container.name()
        );

        let archive = self.packager.compress(&session.source)?;
        session.compressed = true;

        let uploaded = self
            .upload(&session, &UploadTarget::resolve(archive.path()))
            .await?;
        let removed = self.prune(session.retention).await?;

        archive.close()?;

        info!("Backup {} done: {} uploaded, {} removed", session.label, uploaded, removed);
        Ok(RotationReport { uploaded, removed })
    }

    /// Uploads every file of `target`, returning how many were sent.
    ///
    /// Paths that do not exist are skipped without error.
    pub async fn upload(&self, session: &BackupSession, target: &UploadTarget) -> Result<usize, StorageError> {
        let mut count = 0;
        for path in target.files()? {
            if !path.is_file() {
                debug!("Skipping {}, it does not exist", path.display());
                continue;
            }
            let key = session.object_key(&path);
            self.container.upload_object(&key, &path).await?;
            count += 1;
        }
        Ok(count)
    }

    /// Deletes all objects of the oldest backups beyond `retention`.
    ///
    /// Returns the number of objects deleted.
    pub async fn prune(&self, retention: i64) -> Result<usize, StorageError> {
        let prefixes = self.container.list_prefixes(DELIMITER).await?;
        let total = prefixes.len();
        let expired = select_expired(prefixes, retention);
        info!("Found {} backup(s), {} to remove", total, expired.len());

        let mut removed = 0;
        for prefix in &expired {
            for object in self.container.list_objects(prefix).await? {
                self.container.delete_object(&object).await?;
                removed += 1;
            }
            debug!("Removed backup {}", prefix);
        }
        Ok(removed)
    }
}
