//! Ghostbuster records (RFC 6493).

use serde::Serialize;

use super::signed::{self, Signed};
use crate::oid;
use crate::RpkiError;

#[derive(Debug, Clone, Serialize)]
pub struct Gbr {
    #[serde(flatten)]
    pub signed: Signed,
    /// vCard contact information.
    pub vcard: String,
    pub valid: bool,
}

impl Gbr {
    pub fn from_der(der: &[u8]) -> Result<Gbr, RpkiError> {
        let (signed, content) = signed::unwrap(der, oid::CT_RPKI_GHOSTBUSTERS)?;
        let vcard = String::from_utf8(content)
            .map_err(|_| RpkiError::ParseError("RFC 6493: vCard is not UTF-8".into()))?;
        if !vcard.starts_with("BEGIN:VCARD") {
            return Err(RpkiError::ParseError("RFC 6493: missing vCard".into()));
        }
        Ok(Gbr {
            signed,
            vcard,
            valid: false,
        })
    }
}
