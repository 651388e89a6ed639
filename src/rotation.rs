//! Backup rotation core.
//!
//! - `session`: the timestamp label and per-run state.
//! - `upload_target`: classification of what gets uploaded.
//! - `prune`: selection of expired backups.
//! - `rotator`: the compress, upload, prune sequence.

pub mod prune;
pub mod rotator;
pub mod session;
pub mod upload_target;

pub use rotator::{RotationReport, Rotator};
pub use session::BackupSession;
pub use upload_target::UploadTarget;
