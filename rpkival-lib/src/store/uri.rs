//! Cache of certificate URIs already resolved through AIA lookups.

use std::collections::HashMap;

use crate::object::KeyId;
use crate::RpkiError;

/// Maps a certificate's `rsync://` location to the SKI of the validated
/// certificate found there.
#[derive(Debug, Default)]
pub struct UriIndex {
    by_uri: HashMap<String, KeyId>,
}

impl UriIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `uri`. Re-adding the same mapping is a no-op; a different SKI
    /// for a known URI means the index is corrupt.
    pub fn add(&mut self, uri: &str, ski: KeyId) -> Result<(), RpkiError> {
        match self.by_uri.get(uri) {
            Some(existing) if *existing == ski => Ok(()),
            Some(existing) => Err(RpkiError::Fatal(format!(
                "URI index corrupted: {} maps to {} and {}",
                uri, existing, ski
            ))),
            None => {
                self.by_uri.insert(uri.to_string(), ski);
                Ok(())
            }
        }
    }

    pub fn lookup(&self, uri: &str) -> Option<&KeyId> {
        self.by_uri.get(uri)
    }

    pub fn len(&self) -> usize {
        self.by_uri.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_uri.is_empty()
    }
}
