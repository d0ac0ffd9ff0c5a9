//! Validator configuration.

use std::path::PathBuf;

use crate::verify::MAX_CERT_DEPTH;

/// Options controlling a [`crate::Validator`].
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Maximum number of CA certificates between an object and its trust
    /// anchor.
    pub max_cert_depth: usize,
    /// Verification time as a Unix timestamp (None = now).
    pub at_time: Option<i64>,
    /// Directory that `rsync://` URIs are resolved beneath when the resolver
    /// fetches issuer certificates and CRLs.
    pub aia_base: PathBuf,
    /// Whether validity periods are enforced.
    pub check_time: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_cert_depth: MAX_CERT_DEPTH,
            at_time: None,
            aia_base: PathBuf::from("valid"),
            check_time: true,
        }
    }
}

impl ValidatorConfig {
    /// Current verification time.
    pub fn now(&self) -> i64 {
        self.at_time.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs() as i64)
                .unwrap_or(0)
        })
    }
}
