//! Access to repository files.
//!
//! The validator never touches the filesystem directly; everything goes
//! through a [`FileLoader`] so tests can serve objects from memory.

use std::io::ErrorKind;
use std::path::Path;

use crate::RpkiError;

pub trait FileLoader {
    /// Read a whole file. A missing file yields [`RpkiError::NotFound`] so the
    /// caller can retry an alternate location.
    fn load_file(&self, path: &Path) -> Result<Vec<u8>, RpkiError>;
}

/// Reads from the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLoader;

impl FileLoader for FsLoader {
    fn load_file(&self, path: &Path) -> Result<Vec<u8>, RpkiError> {
        std::fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => RpkiError::NotFound(path.display().to_string()),
            _ => RpkiError::Io(e),
        })
    }
}
