use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use tempfile::TempDir;
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error_handling::types::PackageError;

const FALLBACK_ARCHIVE_STEM: &str = "backup";

/// A zip archive living in its own temporary directory.
///
/// Dropping the archive removes the directory and the file with it, so the
/// archive never outlives the rotation that produced it.
pub struct Archive {
    dir: TempDir,
    path: PathBuf,
    entries: usize,
}

impl Archive {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of files stored in the archive.
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Deletes the archive now, reporting any failure to do so.
    pub fn close(self) -> Result<(), PackageError> {
        debug!("Removing temporary archive {}", self.path.display());
        self.dir.close()?;
        Ok(())
    }
}

/// Builds backup archives.
#[derive(Debug, Clone, Default)]
pub struct Packager {
    temp_root: Option<PathBuf>,
}

impl Packager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates archives under `temp_root` instead of the system temp directory.
    pub fn with_temp_root<P: Into<PathBuf>>(temp_root: P) -> Self {
        Self {
            temp_root: Some(temp_root.into()),
        }
    }

    /// Compresses every regular file under `source` into `<basename>.zip`.
    ///
    /// Entry names are relative to `source`; a single-file source is stored
    /// under its own file name. Empty directories are not recorded. A missing
    /// source yields an empty archive. The archive's own temporary directory
    /// is skipped when it lies under `source`.
    pub fn compress(&self, source: &Path) -> Result<Archive, PackageError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("cfrotate-");
        let dir = match &self.temp_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        let path = dir.path().join(archive_name(source));

        if !source.exists() {
            warn!("{} does not exist, the archive will be empty", source.display());
        }

        let root = std::path::absolute(source).unwrap_or_else(|_| source.to_path_buf());
        let scratch = std::path::absolute(dir.path())?;

        let mut zip = ZipWriter::new(BufWriter::new(File::create(&path)?));
        let mut entries = 0usize;
        let walk = WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !entry.path().starts_with(&scratch));
        for entry in walk {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if entry_is_missing_root(&err) => break,
                Err(err) => return Err(PackageError::IoError(err.into())),
            };
            // Symlinks to regular files are archived with the target's content.
            if !entry.path().is_file() {
                continue;
            }

            let name = entry_name(&root, entry.path());
            let size = entry.path().metadata()?.len();
            let options = FileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .large_file(size >= u32::MAX as u64);

            debug!("Adding {} as {}", entry.path().display(), name);
            zip.start_file(name, options)?;
            io::copy(&mut BufReader::new(File::open(entry.path())?), &mut zip)?;
            entries += 1;
        }
        zip.finish()?;

        info!("Compressed {} file(s) from {} into {}", entries, source.display(), path.display());
        Ok(Archive { dir, path, entries })
    }
}

/// `<basename of source>.zip`, ignoring trailing separators.
fn archive_name(source: &Path) -> String {
    let stem = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .or_else(|| {
            source
                .canonicalize()
                .ok()
                .and_then(|p| p.file_name().map(|name| name.to_string_lossy().into_owned()))
        })
        .unwrap_or_else(|| FALLBACK_ARCHIVE_STEM.to_string());
    format!("{}.zip", stem)
}

/// Zip entry name for `path`, relative to the walk root and `/`-separated.
fn entry_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    if relative.as_os_str().is_empty() {
        return path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
    }
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn entry_is_missing_root(err: &walkdir::Error) -> bool {
    err.depth() == 0 && err.io_error().map(|e| e.kind()) == Some(io::ErrorKind::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Read;
    use zip::ZipArchive;

    fn entry_names(archive: &Archive) -> Vec<String> {
        let mut zip = ZipArchive::new(File::open(archive.path()).unwrap()).unwrap();
        let mut names: Vec<String> = (0..zip.len())
            .map(|i| zip.by_index(i).unwrap().name().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_compress_directory_uses_relative_names() {
        let src = tempfile::tempdir().unwrap();
        let site = src.path().join("html");
        fs::create_dir_all(site.join("css")).unwrap();
        fs::create_dir_all(site.join("empty")).unwrap();
        fs::write(site.join("index.html"), "<h1>hi</h1>").unwrap();
        fs::write(site.join("css/site.css"), "body {}").unwrap();

        let archive = Packager::new().compress(&site).unwrap();

        assert_eq!(archive.path().file_name().unwrap(), "html.zip");
        assert_eq!(archive.entries(), 2);
        assert_eq!(entry_names(&archive), vec!["css/site.css", "index.html"]);
    }

    #[test]
    fn test_compress_single_file() {
        let src = tempfile::tempdir().unwrap();
        let report = src.path().join("report.txt");
        fs::write(&report, "quarterly numbers").unwrap();

        let archive = Packager::new().compress(&report).unwrap();

        assert_eq!(archive.path().file_name().unwrap(), "report.txt.zip");
        assert_eq!(entry_names(&archive), vec!["report.txt"]);

        let mut zip = ZipArchive::new(File::open(archive.path()).unwrap()).unwrap();
        let mut content = String::new();
        zip.by_name("report.txt").unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "quarterly numbers");
    }

    #[test]
    fn test_missing_source_gives_empty_archive() {
        let src = tempfile::tempdir().unwrap();
        let archive = Packager::new().compress(&src.path().join("gone")).unwrap();

        assert!(archive.path().is_file());
        assert_eq!(archive.entries(), 0);
        assert_eq!(archive.path().file_name().unwrap(), "gone.zip");
    }

    #[test]
    fn test_archive_removed_on_close_and_drop() {
        let src = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir().unwrap();
        fs::write(src.path().join("a.txt"), "a").unwrap();
        let packager = Packager::with_temp_root(scratch.path());

        let closed = packager.compress(src.path()).unwrap();
        let closed_path = closed.path().to_path_buf();
        assert!(closed_path.starts_with(scratch.path()));
        closed.close().unwrap();
        assert!(!closed_path.exists());

        let dropped_path = {
            let dropped = packager.compress(src.path()).unwrap();
            dropped.path().to_path_buf()
        };
        assert!(!dropped_path.exists());
    }

    #[test]
    fn test_temp_root_inside_source_is_not_archived() {
        let src = tempfile::tempdir().unwrap();
        fs::write(src.path().join("a.txt"), "a").unwrap();
        fs::create_dir(src.path().join("scratch")).unwrap();
        fs::write(src.path().join("scratch/leftover.log"), "old").unwrap();

        let packager = Packager::with_temp_root(src.path().join("scratch"));
        let archive = packager.compress(src.path()).unwrap();

        assert!(archive.path().starts_with(src.path().join("scratch")));
        assert_eq!(archive.entries(), 2);
        assert_eq!(entry_names(&archive), vec!["a.txt", "scratch/leftover.log"]);
    }

    #[test]
    fn test_archive_name_ignores_trailing_separator() {
        assert_eq!(archive_name(Path::new("/var/www/html/")), "html.zip");
        assert_eq!(archive_name(Path::new("report.txt")), "report.txt.zip");
    }
}
