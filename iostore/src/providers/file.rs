//! Filesystem-backed provider: one folder, files opened by name on demand

use std::{fs::File, path::PathBuf};

use crate::error::Error;

use super::IoStoreProvider;

/// Opens partition/sidecar files from a folder on disk
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileProvider {
    folder: PathBuf,
}

impl FileProvider {
    /// Root every file name is resolved relative to
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        FileProvider {
            folder: folder.into(),
        }
    }
}

impl IoStoreProvider<File> for FileProvider {
    fn create_reader_for_file(&self, file_name: &str) -> Result<File, Error> {
        let path = self.folder.join(file_name);
        File::open(&path).map_err(|source| Error::ContainerOpenFailed {
            path: path.to_string_lossy().into_owned().into_boxed_str(),
            source,
        })
    }
}
