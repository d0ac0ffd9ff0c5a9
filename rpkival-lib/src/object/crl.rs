//! Certificate revocation lists.

use serde::Serialize;
use x509_parser::prelude::*;
use x509_parser::revocation_list::CertificateRevocationList;

use super::KeyId;
use crate::oid;
use crate::util;
use crate::RpkiError;

/// A decoded CRL, keyed in the CRL tree by its authority key identifier.
#[derive(Debug, Clone, Serialize)]
pub struct Crl {
    #[serde(serialize_with = "util::serialize_base64")]
    pub der: Vec<u8>,
    pub aki: KeyId,
    pub this_update: i64,
    pub next_update: i64,
    #[serde(skip)]
    pub revoked: Vec<Vec<u8>>,
}

impl Crl {
    pub fn from_der(der: &[u8]) -> Result<Crl, RpkiError> {
        let (rem, crl) = CertificateRevocationList::from_der(der)
            .map_err(|e| RpkiError::ParseError(format!("CRL: {}", e)))?;
        if !rem.is_empty() {
            return Err(RpkiError::ParseError("CRL: trailing data after DER".into()));
        }

        let mut aki = None;
        for ext in crl.extensions() {
            if ext.oid.to_id_string() == oid::EXT_AUTHORITY_KEY_ID {
                if let ParsedExtension::AuthorityKeyIdentifier(a) = ext.parsed_extension() {
                    aki = a.key_identifier.as_ref().map(|k| KeyId::from(k.0));
                }
            }
        }
        let aki = aki.ok_or_else(|| {
            RpkiError::ParseError("RFC 6487 section 5: CRL missing AKI".into())
        })?;
        let next_update = crl
            .next_update()
            .ok_or_else(|| RpkiError::ParseError("CRL missing nextUpdate".into()))?
            .timestamp();

        Ok(Crl {
            der: der.to_vec(),
            aki,
            this_update: crl.last_update().timestamp(),
            next_update,
            revoked: crl
                .iter_revoked_certificates()
                .map(|r| r.raw_serial().to_vec())
                .collect(),
        })
    }

    /// Whether a certificate with this raw serial is listed.
    pub fn is_revoked(&self, serial: &[u8]) -> bool {
        self.revoked.iter().any(|s| s.as_slice() == serial)
    }
}
