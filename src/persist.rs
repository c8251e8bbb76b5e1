//! Reading a file for a run and writing the result back safely.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("{0} changed on disk since it was read")]
    ChangedOnDisk(PathBuf),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PersistError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        PersistError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A file's contents together with the hash it had when read.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub path: PathBuf,
    pub contents: String,
    pub hash: u64,
}

impl LoadedFile {
    pub fn read(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| PersistError::io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            hash: xxh3_64(contents.as_bytes()),
            contents,
        })
    }

    /// Replace the file with `contents`, refusing if someone else wrote to it
    /// after [`read`](Self::read). Returns `false` when there was nothing to
    /// write.
    pub fn write_back(&self, contents: &str) -> Result<bool, PersistError> {
        if contents == self.contents {
            return Ok(false);
        }
        let on_disk = fs::read(&self.path).map_err(|e| PersistError::io(&self.path, e))?;
        if xxh3_64(&on_disk) != self.hash {
            return Err(PersistError::ChangedOnDisk(self.path.clone()));
        }
        atomic_write(&self.path, contents.as_bytes())?;
        Ok(true)
    }
}

/// Tempfile in the same directory, fsync, then rename over `path`.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<(), PersistError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(|e| PersistError::io(path, e))?;
    temp.write_all(content)
        .map_err(|e| PersistError::io(path, e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| PersistError::io(path, e))?;
    temp.persist(path)
        .map_err(|e| PersistError::io(path, e.error))?;
    Ok(())
}
