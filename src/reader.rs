//! Maps logical file references to source bytes.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Failed to read {0}: {1}")]
    Io(PathBuf, io::Error),
}

pub trait SourceReader: Send + Sync {
    /// Resolves `logical` to an absolute path and reads its contents.
    /// `origin` is the file whose `@include` requested the read, when
    /// there is one.
    fn read(&self, logical: &str, origin: Option<&Path>) -> Result<(PathBuf, String), ReadError>;
}

/// Filesystem reader over an ordered list of search directories.
///
/// Paths starting with `./` or `.\` resolve against the requesting
/// file's directory; all other paths are project-relative and tried
/// against each search directory in order. The first directory that
/// yields a regular file wins.
pub struct FsSourceReader {
    search_dirs: Vec<PathBuf>,
}

impl FsSourceReader {
    pub fn new(search_dirs: Vec<PathBuf>) -> Self {
        FsSourceReader { search_dirs }
    }
}

impl SourceReader for FsSourceReader {
    fn read(&self, logical: &str, origin: Option<&Path>) -> Result<(PathBuf, String), ReadError> {
        if let Some(relative) = logical
            .strip_prefix("./")
            .or_else(|| logical.strip_prefix(".\\"))
            && let Some(origin) = origin
        {
            let base = origin.parent().unwrap_or_else(|| Path::new("."));
            return read_file(base.join(relative), logical);
        }

        for dir in &self.search_dirs {
            let candidate = dir.join(logical);
            if candidate.is_file() {
                return read_file(candidate, logical);
            }
        }
        Err(ReadError::NotFound(logical.to_string()))
    }
}

fn read_file(candidate: PathBuf, logical: &str) -> Result<(PathBuf, String), ReadError> {
    match std::fs::read_to_string(&candidate) {
        Ok(source) => {
            let absolute = candidate.canonicalize().unwrap_or(candidate);
            Ok((absolute, source))
        }
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            Err(ReadError::NotFound(logical.to_string()))
        }
        Err(error) => Err(ReadError::Io(candidate, error)),
    }
}

#[cfg(test)]
#[path = "tests/t_reader.rs"]
mod tests;
