//! Resource certificates (RFC 6487).

use serde::Serialize;
use x509_parser::prelude::*;

use super::{ext, KeyId};
use crate::oid;
use crate::resources::Resources;
use crate::util;
use crate::RpkiError;

/// Role of a certificate in the RPKI hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CertPurpose {
    /// Self-issued CA certificate; only valid when introduced through a TAL.
    TrustAnchor,
    Ca,
    /// End-entity certificate, embedded in a signed object or a router key.
    EndEntity,
}

/// A decoded resource certificate.
///
/// The DER encoding is kept so the certificate can be handed back to the
/// path verifier as part of a trusted chain.
#[derive(Debug, Clone, Serialize)]
pub struct Cert {
    #[serde(serialize_with = "util::serialize_base64")]
    pub der: Vec<u8>,
    pub purpose: CertPurpose,
    pub ski: KeyId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aki: Option<KeyId>,
    /// caIssuers URI of the issuing certificate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aia: Option<String>,
    /// CRL distribution point.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crl: Option<String>,
    /// Publication point (caRepository).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mft: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify: Option<String>,
    /// signedObject URI, present on EE certificates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signed_object: Option<String>,
    pub resources: Resources,
    #[serde(skip)]
    pub spki: Vec<u8>,
    #[serde(with = "hex")]
    pub serial: Vec<u8>,
    pub not_before: i64,
    pub not_after: i64,
    /// Earliest time anything on the chain from the trust anchor expires.
    pub expires: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub talid: Option<usize>,
}

impl Cert {
    /// Decode and profile-check a DER certificate.
    pub fn from_der(der: &[u8]) -> Result<Cert, RpkiError> {
        let (rem, x509) = X509Certificate::from_der(der)
            .map_err(|e| RpkiError::ParseError(format!("certificate: {}", e)))?;
        if !rem.is_empty() {
            return Err(RpkiError::ParseError(
                "certificate: trailing data after DER".into(),
            ));
        }

        let mut ski = None;
        let mut aki = None;
        let mut cert = Cert {
            der: der.to_vec(),
            purpose: CertPurpose::EndEntity,
            ski: KeyId::default(),
            aki: None,
            aia: None,
            crl: None,
            repo: None,
            mft: None,
            notify: None,
            signed_object: None,
            resources: Resources::default(),
            spki: x509.public_key().raw.to_vec(),
            serial: x509.raw_serial().to_vec(),
            not_before: x509.validity().not_before.timestamp(),
            not_after: x509.validity().not_after.timestamp(),
            expires: x509.validity().not_after.timestamp(),
            talid: None,
        };

        for ext in x509.extensions() {
            let oid_str = ext.oid.to_id_string();
            match oid_str.as_str() {
                oid::EXT_SUBJECT_KEY_ID => {
                    if let ParsedExtension::SubjectKeyIdentifier(ki) = ext.parsed_extension() {
                        ski = Some(KeyId::from(ki.0));
                    }
                }
                oid::EXT_AUTHORITY_KEY_ID => {
                    if let ParsedExtension::AuthorityKeyIdentifier(a) = ext.parsed_extension() {
                        aki = a.key_identifier.as_ref().map(|k| KeyId::from(k.0));
                    }
                }
                oid::EXT_AUTHORITY_INFO_ACCESS => {
                    cert.aia = ext::access_descriptions(ext.value)?
                        .into_iter()
                        .find(|(m, u)| m == oid::ACCESS_CA_ISSUERS && util::is_rsync_uri(u))
                        .map(|(_, u)| u);
                }
                oid::EXT_SUBJECT_INFO_ACCESS => {
                    for (method, uri) in ext::access_descriptions(ext.value)? {
                        let (slot, usable) = match method.as_str() {
                            oid::ACCESS_CA_REPOSITORY => (&mut cert.repo, util::is_rsync_uri(&uri)),
                            oid::ACCESS_RPKI_MANIFEST => (&mut cert.mft, util::is_rsync_uri(&uri)),
                            oid::ACCESS_SIGNED_OBJECT => {
                                (&mut cert.signed_object, util::is_rsync_uri(&uri))
                            }
                            oid::ACCESS_RPKI_NOTIFY => (&mut cert.notify, uri.starts_with("https://")),
                            _ => continue,
                        };
                        if usable && slot.is_none() {
                            *slot = Some(uri);
                        }
                    }
                }
                oid::EXT_CRL_DISTRIBUTION_POINTS => {
                    cert.crl = ext::crl_distribution_points(ext.value)?
                        .into_iter()
                        .find(|u| util::is_rsync_uri(u));
                }
                oid::EXT_IP_ADDR_BLOCKS => ext::ip_addr_blocks(ext.value, &mut cert.resources)?,
                oid::EXT_AS_IDENTIFIERS => ext::as_identifiers(ext.value, &mut cert.resources)?,
                _ => {}
            }
        }

        cert.ski = ski.ok_or_else(|| {
            RpkiError::ParseError("RFC 6487 section 4.8.2: missing SKI".into())
        })?;
        cert.aki = aki;

        let is_ca = matches!(x509.basic_constraints(), Ok(Some(bc)) if bc.value.ca);
        let self_issued = x509.subject().as_raw() == x509.issuer().as_raw();
        cert.purpose = if !is_ca {
            CertPurpose::EndEntity
        } else if self_issued && cert.aki.as_ref().map_or(true, |a| *a == cert.ski) {
            CertPurpose::TrustAnchor
        } else {
            CertPurpose::Ca
        };

        match cert.purpose {
            CertPurpose::TrustAnchor => {}
            CertPurpose::Ca | CertPurpose::EndEntity => {
                if cert.aki.is_none() {
                    return Err(RpkiError::ParseError(
                        "RFC 6487 section 4.8.3: missing AKI".into(),
                    ));
                }
                if cert.aia.is_none() {
                    return Err(RpkiError::ParseError(
                        "RFC 6487 section 4.8.7: missing AIA".into(),
                    ));
                }
            }
        }
        if cert.purpose != CertPurpose::EndEntity {
            if cert.mft.is_none() || cert.repo.is_none() {
                return Err(RpkiError::ParseError(
                    "RFC 6487 section 4.8.8: missing SIA".into(),
                ));
            }
            if cert.resources.is_empty() {
                return Err(RpkiError::ParseError(
                    "RFC 6487 section 4.8.10: missing IP or AS resources".into(),
                ));
            }
        }
        Ok(cert)
    }

    pub fn is_ca(&self) -> bool {
        self.purpose != CertPurpose::EndEntity
    }
}
