//! RPKI manifests (RFC 9286).

use serde::Serialize;
use x509_parser::der_parser::asn1_rs::Tag;

use super::der::{self, DerReader};
use super::signed::{self, Signed};
use crate::oid;
use crate::RpkiError;

/// One manifest entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MftFile {
    pub file: String,
    #[serde(with = "hex")]
    pub hash: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Mft {
    #[serde(flatten)]
    pub signed: Signed,
    #[serde(with = "hex")]
    pub number: Vec<u8>,
    pub this_update: i64,
    pub next_update: i64,
    pub files: Vec<MftFile>,
    /// Set when nextUpdate has passed at validation time.
    pub stale: bool,
    /// Repository the manifest was fetched from; its files resolve there.
    pub repoid: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub valid: bool,
}

impl Mft {
    pub fn from_der(der: &[u8]) -> Result<Mft, RpkiError> {
        let (signed, content) = signed::unwrap(der, oid::CT_RPKI_MANIFEST)?;
        Self::from_content(signed, &content)
    }

    pub(crate) fn from_content(signed: Signed, content: &[u8]) -> Result<Mft, RpkiError> {
        let body = der::parse_one(content, Tag::Sequence, "Manifest")?;
        let mut rd = DerReader::new(body.data);
        if let Some(v) = rd.optional_context(0)? {
            let version = der::uint(&der::parse_one_any(v.data)?, "manifest version")?;
            if version != 0 {
                return Err(RpkiError::ParseError(format!(
                    "RFC 9286 section 4.2.1: unexpected version {}",
                    version
                )));
            }
        }
        let number = der::int_bytes(&rd.next()?, "manifestNumber")?.to_vec();
        if number.len() > 21 {
            return Err(RpkiError::ParseError(
                "RFC 9286 section 4.2.1: manifestNumber too large".into(),
            ));
        }
        let this_update = der::generalized_time(&rd.next()?, "thisUpdate")?;
        let next_update = der::generalized_time(&rd.next()?, "nextUpdate")?;
        if next_update <= this_update {
            return Err(RpkiError::ParseError(
                "RFC 9286 section 4.2.1: nextUpdate not after thisUpdate".into(),
            ));
        }
        let alg = der::oid_string(&rd.next()?, "fileHashAlg")?;
        if alg != oid::SHA256 {
            return Err(RpkiError::ParseError(format!(
                "RFC 9286 section 4.2.1: unsupported hash algorithm {}",
                alg
            )));
        }
        let list = rd.expect(Tag::Sequence, "fileList")?;
        rd.finish("Manifest")?;

        let mut files = Vec::new();
        let mut entries = DerReader::new(list.data);
        while !entries.is_empty() {
            let fah = entries.expect(Tag::Sequence, "FileAndHash")?;
            let mut f = DerReader::new(fah.data);
            let file = der::ia5_string(&f.next()?, "file")?;
            let (unused, hash) = der::bit_string(&f.next()?, "hash")?;
            f.finish("FileAndHash")?;
            if unused != 0 || hash.len() != 32 {
                return Err(RpkiError::ParseError(format!(
                    "RFC 9286 section 4.2.1: bad hash length for {}",
                    file
                )));
            }
            files.push(MftFile {
                file,
                hash: hash.to_vec(),
            });
        }

        Ok(Mft {
            signed,
            number,
            this_update,
            next_update,
            files,
            stale: false,
            repoid: 0,
            path: None,
            valid: false,
        })
    }
}

#[cfg(test)]
pub(crate) fn content_for_test(entries: &[(&str, &[u8])], this: &str, next: &str) -> Vec<u8> {
    use super::der::build::*;
    let list: Vec<Vec<u8>> = entries
        .iter()
        .map(|(f, h)| seq(&[ia5(f), bits(0, h)]))
        .collect();
    seq(&[
        int(7),
        gentime(this),
        gentime(next),
        oid(oid::SHA256),
        seq(&list),
    ])
}
