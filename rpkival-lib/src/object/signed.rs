//! CMS signed object envelope (RFC 6488).
//!
//! Extracts the embedded end-entity certificate and the encapsulated
//! content, and checks the single SignerInfo against both: the signer is
//! identified by the EE SKI, the signed attributes bind the content type
//! and digest, and the EE key must verify the signature over them. The EE
//! certificate itself is validated against the chain by the path verifier.

use serde::Serialize;
use x509_parser::der_parser::asn1_rs::{Any, BitString, FromDer, Tag};
use x509_parser::oid_registry::OID_PKCS1_SHA256WITHRSA;
use x509_parser::verify::verify_signature;
use x509_parser::x509::{AlgorithmIdentifier, SubjectPublicKeyInfo};

use super::der::{self, DerReader};
use super::{Cert, CertPurpose, KeyId};
use crate::oid;
use crate::RpkiError;

/// Fields every signed object carries, taken from its EE certificate.
#[derive(Debug, Clone, Serialize)]
pub struct Signed {
    #[serde(skip)]
    pub ee: Cert,
    pub aia: String,
    pub aki: KeyId,
    pub ski: KeyId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crl: Option<String>,
    pub not_after: i64,
    pub expires: i64,
}

impl Signed {
    /// Wrap an already-decoded EE certificate.
    pub fn from_ee(ee: Cert) -> Result<Signed, RpkiError> {
        if ee.purpose != CertPurpose::EndEntity {
            return Err(RpkiError::ParseError(
                "RFC 6488: embedded certificate is not an EE certificate".into(),
            ));
        }
        let aia = ee
            .aia
            .clone()
            .ok_or_else(|| RpkiError::ParseError("RFC 6487: EE certificate missing AIA".into()))?;
        let aki = ee
            .aki
            .clone()
            .ok_or_else(|| RpkiError::ParseError("RFC 6487: EE certificate missing AKI".into()))?;
        Ok(Signed {
            aia,
            aki,
            ski: ee.ski.clone(),
            crl: ee.crl.clone(),
            not_after: ee.not_after,
            expires: ee.not_after,
            ee,
        })
    }
}

/// Unwrap a `ContentInfo`/`SignedData`, check the eContentType, and return
/// the EE certificate and eContent bytes.
pub(crate) fn unwrap(der: &[u8], content_type: &str) -> Result<(Signed, Vec<u8>), RpkiError> {
    let ci = der::parse_one(der, Tag::Sequence, "ContentInfo")?;
    let mut rd = DerReader::new(ci.data);
    let ct = der::oid_string(&rd.next()?, "contentType")?;
    if ct != oid::CMS_SIGNED_DATA {
        return Err(RpkiError::ParseError(format!(
            "RFC 6488: unexpected content type {}",
            ct
        )));
    }
    let explicit = rd
        .optional_context(0)?
        .ok_or_else(|| RpkiError::ParseError("RFC 6488: missing SignedData".into()))?;
    rd.finish("ContentInfo")?;

    let sd = der::parse_one(explicit.data, Tag::Sequence, "SignedData")?;
    let mut fields = DerReader::new(sd.data);
    let version = der::uint(&fields.next()?, "SignedData version")?;
    if version != 3 {
        return Err(RpkiError::ParseError(format!(
            "RFC 6488 section 2.1.1: SignedData version {}",
            version
        )));
    }
    fields.expect(Tag::Set, "digestAlgorithms")?;

    let eci = fields.expect(Tag::Sequence, "encapContentInfo")?;
    let mut ecr = DerReader::new(eci.data);
    let ect = der::oid_string(&ecr.next()?, "eContentType")?;
    if ect != content_type {
        return Err(RpkiError::ParseError(format!(
            "RFC 6488: eContentType {}, want {}",
            ect, content_type
        )));
    }
    let econtent = ecr
        .optional_context(0)?
        .ok_or_else(|| RpkiError::ParseError("RFC 6488: missing eContent".into()))?;
    ecr.finish("encapContentInfo")?;
    let octets = der::parse_one(econtent.data, Tag::OctetString, "eContent")?;

    let certs = fields
        .optional_context(0)?
        .ok_or_else(|| RpkiError::ParseError("RFC 6488: missing certificates".into()))?;
    let mut cr = DerReader::new(certs.data);
    let (_, ee_raw) = cr.next_raw()?;
    if !cr.is_empty() {
        return Err(RpkiError::ParseError(
            "RFC 6488 section 2.1.4: expected exactly one certificate".into(),
        ));
    }
    if fields.optional_context(1)?.is_some() {
        return Err(RpkiError::ParseError(
            "RFC 6488 section 2.1.5: unexpected CRLs".into(),
        ));
    }
    let infos = fields.expect(Tag::Set, "signerInfos")?;
    fields.finish("SignedData")?;
    let mut ir = DerReader::new(infos.data);
    if ir.is_empty() {
        return Err(RpkiError::ParseError(
            "RFC 6488 section 2.1.6: expected exactly one SignerInfo".into(),
        ));
    }
    let info = ir.expect(Tag::Sequence, "SignerInfo")?;
    if !ir.is_empty() {
        return Err(RpkiError::ParseError(
            "RFC 6488 section 2.1.6: expected exactly one SignerInfo".into(),
        ));
    }
    let signer = SignerInfo::parse(&info)?;

    let signed = Signed::from_ee(Cert::from_der(ee_raw)?)?;
    signer.check(&signed.ee, &ect, octets.data)?;
    Ok((signed, octets.data.to_vec()))
}

/// The parts of a SignerInfo needed to authenticate the eContent.
struct SignerInfo<'a> {
    sid: &'a [u8],
    attrs: Any<'a>,
    attrs_raw: &'a [u8],
    algorithm: AlgorithmIdentifier<'a>,
    signature: &'a [u8],
}

impl<'a> SignerInfo<'a> {
    fn parse(info: &Any<'a>) -> Result<SignerInfo<'a>, RpkiError> {
        let mut rd = DerReader::new(info.data);
        let version = der::uint(&rd.next()?, "SignerInfo version")?;
        if version != 3 {
            return Err(RpkiError::ParseError(format!(
                "RFC 6488 section 2.1.6.1: SignerInfo version {}",
                version
            )));
        }
        let sid = rd.optional_context(0)?.ok_or_else(|| {
            RpkiError::ParseError(
                "RFC 6488 section 2.1.6.2: sid is not a SubjectKeyIdentifier".into(),
            )
        })?;

        let digest = rd.expect(Tag::Sequence, "digestAlgorithm")?;
        let digest_oid = der::oid_string(&DerReader::new(digest.data).next()?, "digestAlgorithm")?;
        if digest_oid != oid::SHA256 {
            return Err(RpkiError::ParseError(format!(
                "RFC 7935: digest algorithm {}",
                digest_oid
            )));
        }

        let (attrs, attrs_raw) = rd.next_raw()?;
        if !der::is_context(&attrs, 0) {
            return Err(RpkiError::ParseError(
                "RFC 6488 section 2.1.6.4: missing signed attributes".into(),
            ));
        }

        let (alg, alg_raw) = rd.next_raw()?;
        der::expect_universal(&alg, Tag::Sequence, "signatureAlgorithm")?;
        let (_, algorithm) = AlgorithmIdentifier::from_der(alg_raw)
            .map_err(|e| RpkiError::DerError(format!("signatureAlgorithm: {}", e)))?;
        let signature = rd.expect(Tag::OctetString, "signature")?;
        if rd.optional_context(1)?.is_some() {
            return Err(RpkiError::ParseError(
                "RFC 6488 section 2.1.6.7: unexpected unsigned attributes".into(),
            ));
        }
        rd.finish("SignerInfo")?;

        Ok(SignerInfo {
            sid: sid.data,
            attrs,
            attrs_raw,
            algorithm,
            signature: signature.data,
        })
    }

    /// Match the signer to `ee`, check the signed attributes against the
    /// content, and verify the signature with the EE public key.
    fn check(&self, ee: &Cert, content_type: &str, econtent: &[u8]) -> Result<(), RpkiError> {
        if self.sid != ee.ski.as_bytes() {
            return Err(RpkiError::VerifyError(
                "SignerInfo sid does not match the EE certificate SKI".into(),
            ));
        }
        self.check_attrs(content_type, econtent)?;

        // Signed attributes are signed as an explicit SET OF.
        let mut signed_data = self.attrs_raw.to_vec();
        if let Some(tag) = signed_data.first_mut() {
            *tag = 0x31;
        }
        let (_, spki) = SubjectPublicKeyInfo::from_der(&ee.spki)
            .map_err(|e| RpkiError::DerError(format!("EE public key: {}", e)))?;
        // rsaEncryption names only the key type; the digest is SHA-256.
        let algorithm = if self.algorithm.algorithm.to_id_string() == oid::RSA_ENCRYPTION {
            AlgorithmIdentifier::new(OID_PKCS1_SHA256WITHRSA, None)
        } else {
            self.algorithm.clone()
        };
        let signature = BitString::new(0, self.signature);
        verify_signature(&spki, &algorithm, &signature, &signed_data).map_err(|e| {
            RpkiError::VerifyError(format!("CMS signature verification failed: {}", e))
        })
    }

    fn check_attrs(&self, content_type: &str, econtent: &[u8]) -> Result<(), RpkiError> {
        let mut ct: Option<String> = None;
        let mut md: Option<&[u8]> = None;
        let mut rd = DerReader::new(self.attrs.data);
        while !rd.is_empty() {
            let attr = rd.expect(Tag::Sequence, "Attribute")?;
            let mut ar = DerReader::new(attr.data);
            let attr_type = der::oid_string(&ar.next()?, "attrType")?;
            let values = ar.expect(Tag::Set, "attrValues")?;
            ar.finish("Attribute")?;
            let mut vr = DerReader::new(values.data);
            let value = vr.next()?;
            vr.finish("attrValues")?;

            let dup = match attr_type.as_str() {
                oid::CMS_CONTENT_TYPE => ct
                    .replace(der::oid_string(&value, "contentType")?)
                    .is_some(),
                oid::CMS_MESSAGE_DIGEST => {
                    der::expect_universal(&value, Tag::OctetString, "messageDigest")?;
                    md.replace(value.data).is_some()
                }
                oid::CMS_SIGNING_TIME | oid::CMS_BINARY_SIGNING_TIME => false,
                other => {
                    return Err(RpkiError::ParseError(format!(
                        "RFC 6488 section 2.1.6.4: unexpected signed attribute {}",
                        other
                    )))
                }
            };
            if dup {
                return Err(RpkiError::ParseError(format!(
                    "RFC 6488 section 2.1.6.4: duplicate signed attribute {}",
                    attr_type
                )));
            }
        }

        match ct {
            Some(ct) if ct == content_type => {}
            Some(ct) => {
                return Err(RpkiError::ParseError(format!(
                    "RFC 6488 section 2.1.6.4.1: content-type attribute {}, want {}",
                    ct, content_type
                )))
            }
            None => {
                return Err(RpkiError::ParseError(
                    "RFC 6488 section 2.1.6.4.1: missing content-type attribute".into(),
                ))
            }
        }
        let md = md.ok_or_else(|| {
            RpkiError::ParseError(
                "RFC 6488 section 2.1.6.4.2: missing message-digest attribute".into(),
            )
        })?;
        if !crate::hash::hash_matches(econtent, md) {
            return Err(RpkiError::VerifyError(
                "message digest does not match eContent".into(),
            ));
        }
        Ok(())
    }
}

/// Test fixture: wrap `econtent`, an EE certificate and `signer_infos`
/// in a minimal SignedData envelope.
#[cfg(test)]
pub(crate) fn wrap_for_test(
    content_type: &str,
    econtent: &[u8],
    ee_der: &[u8],
    signer_infos: &[Vec<u8>],
) -> Vec<u8> {
    use super::der::build::*;
    let sd = seq(&[
        int(3),
        set(&[seq(&[oid(oid::SHA256)])]),
        seq(&[oid(content_type), ctx(0, &octets(econtent))]),
        ctx(0, ee_der),
        set(signer_infos),
    ]);
    seq(&[oid(oid::CMS_SIGNED_DATA), ctx(0, &sd)])
}

/// Test fixture: a signed-object header around a placeholder EE certificate.
#[cfg(test)]
pub(crate) fn dummy_for_test() -> Signed {
    use crate::resources::Resources;
    let aia = "rsync://example.net/repo/ca.cer".to_string();
    Signed {
        ee: Cert {
            der: vec![],
            purpose: CertPurpose::EndEntity,
            ski: KeyId::from(vec![1]),
            aki: Some(KeyId::from(vec![2])),
            aia: Some(aia.clone()),
            crl: None,
            repo: None,
            mft: None,
            notify: None,
            signed_object: None,
            resources: Resources::default(),
            spki: vec![],
            serial: vec![1],
            not_before: 0,
            not_after: 10,
            expires: 10,
            talid: None,
        },
        aia,
        aki: KeyId::from(vec![2]),
        ski: KeyId::from(vec![1]),
        crl: None,
        not_after: 10,
        expires: 10,
    }
}
