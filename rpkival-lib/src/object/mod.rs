//! RPKI object model and decoding.
//!
//! Each object type has a `from_der` (or `parse` for TALs) constructor that
//! performs syntactic and profile checks only. Cryptographic validation and
//! chain building happen later in [`crate::verify`] and the validator.

mod cert;
mod crl;
pub(crate) mod der;
pub(crate) mod ext;
mod gbr;
mod mft;
mod roa;
pub(crate) mod signed;
mod tal;

use std::fmt;

use serde::{Serialize, Serializer};

pub use cert::{Cert, CertPurpose};
pub use crl::Crl;
pub use gbr::Gbr;
pub use mft::{Mft, MftFile};
pub use roa::{Roa, RoaPrefix};
pub use signed::Signed;
pub use tal::Tal;

use crate::util::hex_colon_upper;
use crate::RpkiError;

/// Subject or authority key identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyId(Vec<u8>);

impl KeyId {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&[u8]> for KeyId {
    fn from(b: &[u8]) -> Self {
        KeyId(b.to_vec())
    }
}

impl From<Vec<u8>> for KeyId {
    fn from(b: Vec<u8>) -> Self {
        KeyId(b)
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex_colon_upper(&self.0))
    }
}

impl Serialize for KeyId {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

/// Object decoding seam. The validator only ever sees decoded objects, so an
/// alternative ASN.1 backend can be substituted without touching chain logic.
pub trait Decoder {
    fn cert(&self, der: &[u8]) -> Result<Cert, RpkiError>;
    fn crl(&self, der: &[u8]) -> Result<Crl, RpkiError>;
    fn mft(&self, der: &[u8]) -> Result<Mft, RpkiError>;
    fn roa(&self, der: &[u8]) -> Result<Roa, RpkiError>;
    fn gbr(&self, der: &[u8]) -> Result<Gbr, RpkiError>;
    /// `file` supplies the TAL description (its basename without `.tal`).
    fn tal(&self, file: &str, data: &[u8]) -> Result<Tal, RpkiError>;
}

/// The built-in decoder: x509-parser for certificates and CRLs, plus a DER
/// walker for CMS signed objects and RFC 3779 extensions.
#[derive(Debug, Default, Clone, Copy)]
pub struct DerDecoder;

impl Decoder for DerDecoder {
    fn cert(&self, der: &[u8]) -> Result<Cert, RpkiError> {
        Cert::from_der(der)
    }

    fn crl(&self, der: &[u8]) -> Result<Crl, RpkiError> {
        Crl::from_der(der)
    }

    fn mft(&self, der: &[u8]) -> Result<Mft, RpkiError> {
        Mft::from_der(der)
    }

    fn roa(&self, der: &[u8]) -> Result<Roa, RpkiError> {
        Roa::from_der(der)
    }

    fn gbr(&self, der: &[u8]) -> Result<Gbr, RpkiError> {
        Gbr::from_der(der)
    }

    fn tal(&self, file: &str, data: &[u8]) -> Result<Tal, RpkiError> {
        Tal::parse(file, data)
    }
}
