use serde::{Deserialize, Serialize};

/// Separator between the timestamp label and the rest of an object key.
pub const DELIMITER: char = '/';

/// Maximum number of entries the storage service returns per listing page.
pub const LISTING_LIMIT: usize = 10_000;

/// An object stored in a container, as described by a container listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub name: String,
    #[serde(default)]
    pub bytes: u64,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
}

impl ObjectInfo {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bytes: 0,
            hash: None,
            last_modified: None,
            content_type: None,
        }
    }
}

/// One row of a JSON container listing.
///
/// With a delimiter, keys sharing a prefix up to the delimiter collapse into
/// a single `Subdir` row (`"2024-01-01T0900/"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListingEntry {
    Subdir { subdir: String },
    Object(ObjectInfo),
}

impl ListingEntry {
    /// The string this row sorts by, used as the marker for the next page.
    pub fn marker(&self) -> &str {
        match self {
            ListingEntry::Subdir { subdir } => subdir,
            ListingEntry::Object(info) => &info.name,
        }
    }
}

/// Query parameters of a container listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingQuery {
    pub prefix: Option<String>,
    pub delimiter: Option<char>,
    pub marker: Option<String>,
}

/// Builds one listing page out of objects sorted by name.
///
/// Follows the object store's rules: only names after `marker` and starting
/// with `prefix` are considered, and with a delimiter every name containing
/// it past the prefix is folded into its subdir row. A subdir equal to the
/// marker is not repeated, which lets the caller page through grouped
/// listings using the last row as the next marker.
pub fn build_listing(objects: &[ObjectInfo], query: &ListingQuery, limit: usize) -> Vec<ListingEntry> {
    let prefix = query.prefix.as_deref().unwrap_or("");
    let mut page: Vec<ListingEntry> = Vec::new();

    for object in objects {
        if page.len() >= limit {
            break;
        }
        if let Some(marker) = query.marker.as_deref() {
            if object.name.as_str() <= marker {
                continue;
            }
        }
        if !object.name.starts_with(prefix) {
            continue;
        }

        let grouped = query.delimiter.and_then(|delimiter| {
            object.name[prefix.len()..]
                .find(delimiter)
                .map(|offset| object.name[..prefix.len() + offset + delimiter.len_utf8()].to_string())
        });

        match grouped {
            Some(subdir) => {
                if query.marker.as_deref() == Some(subdir.as_str()) {
                    continue;
                }
                if page.last().map(ListingEntry::marker) == Some(subdir.as_str()) {
                    continue;
                }
                page.push(ListingEntry::Subdir { subdir });
            }
            None => page.push(ListingEntry::Object(object.clone())),
        }
    }

    page
}
