use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// What the upload phase was asked to send.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadTarget {
    SingleFile(PathBuf),
    FileList(Vec<PathBuf>),
    Directory(PathBuf),
}

impl UploadTarget {
    /// Classifies a local path. Anything that is not a directory, including a
    /// path that does not exist, is treated as a single file.
    pub fn resolve<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if path.is_dir() {
            UploadTarget::Directory(path.to_path_buf())
        } else {
            UploadTarget::SingleFile(path.to_path_buf())
        }
    }

    /// Flattens the target into the files to upload, in walk order.
    ///
    /// Directories are walked recursively and contribute their files;
    /// symlinked directories are not descended into.
    pub fn files(&self) -> io::Result<Vec<PathBuf>> {
        match self {
            UploadTarget::SingleFile(path) => Ok(vec![path.clone()]),
            UploadTarget::FileList(paths) => {
                let mut files = Vec::new();
                for path in paths {
                    files.extend(UploadTarget::resolve(path).files()?);
                }
                Ok(files)
            }
            UploadTarget::Directory(dir) => {
                let mut files = Vec::new();
                for entry in WalkDir::new(dir).sort_by_file_name() {
                    let entry = entry?;
                    if entry.path().is_file() {
                        files.push(entry.into_path());
                    }
                }
                Ok(files)
            }
        }
    }
}
