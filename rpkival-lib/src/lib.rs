//! rpkival-lib: RPKI relying-party object validation.
//!
//! Parses RPKI repository objects (certificates, CRLs, manifests, ROAs,
//! ghostbuster records and TALs), builds the chain of trust from the
//! configured trust anchors down to each object, and reports per-object
//! validation status.
//!
//! The entry point is [`Validator`], which owns the validated-certificate
//! tree, the CRL tree and the URI index for the lifetime of the process and
//! consumes [`Entity`] work items one at a time.

mod config;
mod display;
mod entity;
mod hash;
mod loader;
pub mod object;
mod oid;
pub mod resources;
pub mod store;
mod util;
mod validator;
pub mod verify;

pub use config::ValidatorConfig;
pub use display::{display_report, to_json};
pub use entity::{Entity, Object, RType, Response};
pub use hash::{file_hash, hash_id};
pub use loader::{FileLoader, FsLoader};
pub use util::valid_filename;
pub use validator::{Context, FileReport, Status, Validator};
pub use verify::MAX_CERT_DEPTH;

/// Errors returned by rpkival-lib.
///
/// Everything except [`RpkiError::Fatal`] is scoped to a single object: the
/// object is dropped and processing continues with the next work item.
#[derive(Debug, thiserror::Error)]
pub enum RpkiError {
    #[error("failed to parse: {0}")]
    ParseError(String),

    #[error("invalid DER: {0}")]
    DerError(String),

    #[error("{0}: no such file")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    VerifyError(String),

    #[error("authority chain: {0}")]
    ChainError(String),

    #[error("resources: {0}")]
    ResourceError(String),

    #[error("manifest: {0}")]
    ManifestError(String),

    #[error("duplicate CRL for AKI {0}")]
    DuplicateCrl(String),

    #[error("fatal: {0}")]
    Fatal(String),
}

impl RpkiError {
    /// Whether the error indicates corrupted internal state rather than bad
    /// repository content. Fatal errors terminate the worker.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RpkiError::Fatal(_))
    }
}
