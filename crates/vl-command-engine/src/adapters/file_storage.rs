//! Filesystem-backed file storage.
//!
//! Layout: `<root>/<owner>/<path>`. Paths are flat file names; anything that
//! could escape the owner's directory is refused.

use crate::domain::config::StorageConfig;
use crate::ports::outbound::{FileStorage, StorageError};
use std::fs::{self, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// ENOSPC
const NO_SPACE_LEFT: i32 = 28;

pub struct FsFileStorage {
    root: PathBuf,
}

impl FsFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.root.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of `path` inside `owner`'s directory
    pub fn resolve(&self, owner: &str, path: &str) -> Result<PathBuf, StorageError> {
        check_component(owner)?;
        check_component(path)?;
        Ok(self.root.join(owner).join(path))
    }
}

fn check_component(name: &str) -> Result<(), StorageError> {
    if name.is_empty() || name == "." || name.contains("..") || name.contains(['/', '\\', '\0']) {
        return Err(StorageError::InvalidData(format!(
            "'{name}' is not a valid file name"
        )));
    }
    Ok(())
}

fn map_io(err: io::Error) -> StorageError {
    if err.raw_os_error() == Some(NO_SPACE_LEFT) {
        StorageError::OutOfSpace
    } else {
        StorageError::Io(err.to_string())
    }
}

impl FileStorage for FsFileStorage {
    fn save(&self, owner: &str, data: &[u8], path: &str, offset: u64) -> Result<(), StorageError> {
        let target = self.resolve(owner, path)?;
        if let Some(dir) = target.parent() {
            fs::create_dir_all(dir).map_err(map_io)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(offset == 0)
            .open(&target)
            .map_err(map_io)?;
        file.seek(SeekFrom::Start(offset)).map_err(map_io)?;
        file.write_all(data).map_err(map_io)?;
        file.flush().map_err(map_io)?;

        debug!(
            path = %target.display(),
            offset,
            bytes = data.len(),
            "Stored file chunk"
        );
        Ok(())
    }
}
