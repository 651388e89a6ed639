use chrono::{DateTime, Local, TimeZone};
use std::path::{Path, PathBuf};

/// strftime format of the timestamp label that prefixes every key of a backup.
///
/// Fixed-width and zero-padded, so labels sort in chronological order.
pub const LABEL_FORMAT: &str = "%Y-%m-%dT%H%M";

/// Formats `time` as a backup label, e.g. `2024-01-01T0900`.
pub fn label_for<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    time.format(LABEL_FORMAT).to_string()
}

/// State of one rotation, threaded through compress, upload and prune.
#[derive(Debug, Clone, PartialEq)]
pub struct BackupSession {
    pub source: PathBuf,
    pub retention: i64,
    pub label: String,
    pub compressed: bool,
}

impl BackupSession {
    /// Starts a session labelled with the current local time.
    ///
    /// Labels have minute resolution: two sessions started in the same minute
    /// share a label and their uploads land under the same prefix.
    pub fn new<P: Into<PathBuf>>(source: P, retention: i64) -> Self {
        Self::with_label(source, retention, label_for(&Local::now()))
    }

    pub fn with_label<P: Into<PathBuf>>(source: P, retention: i64, label: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            retention,
            label: label.into(),
            compressed: false,
        }
    }

    /// Remote key for the local file `path`.
    ///
    /// - compressed session: `<label>/<file name>`
    /// - absolute path: `<label><path>` (the path supplies the separator)
    /// - relative path: `<label>/<path>`
    pub fn object_key(&self, path: &Path) -> String {
        if self.compressed {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            return format!("{}/{}", self.label, name);
        }

        let path = path.to_string_lossy();
        if path.starts_with('/') {
            format!("{}{}", self.label, path)
        } else {
            format!("{}/{}", self.label, path)
        }
    }
}
