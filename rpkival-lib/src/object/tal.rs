//! Trust anchor locators (RFC 8630).

use serde::Serialize;
use x509_parser::prelude::FromDer;
use x509_parser::x509::SubjectPublicKeyInfo;

use crate::util;
use crate::RpkiError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tal {
    /// Basename of the TAL file without `.tal`.
    pub descr: String,
    /// Certificate locations, sorted.
    pub uris: Vec<String>,
    /// DER SubjectPublicKeyInfo of the trust anchor.
    #[serde(serialize_with = "util::serialize_base64")]
    pub pkey: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<usize>,
}

impl Tal {
    /// Parse TAL text: optional `#` comment lines, one or more URIs, a blank
    /// line, then the base64 public key.
    pub fn parse(file: &str, data: &[u8]) -> Result<Tal, RpkiError> {
        let text = std::str::from_utf8(data)
            .map_err(|_| RpkiError::ParseError(format!("{}: TAL is not text", file)))?;
        let text = text.replace("\r\n", "\n");
        let mut lines = text.lines().skip_while(|l| l.starts_with('#'));

        let mut uris = Vec::new();
        for line in lines.by_ref() {
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if !(line.starts_with("https://") || util::is_rsync_uri(line)) {
                return Err(RpkiError::ParseError(format!(
                    "{}: unsupported URI scheme: {}",
                    file, line
                )));
            }
            if !line.ends_with(".cer") {
                return Err(RpkiError::ParseError(format!(
                    "{}: not a certificate URI: {}",
                    file, line
                )));
            }
            uris.push(line.to_string());
        }
        if uris.is_empty() {
            return Err(RpkiError::ParseError(format!("{}: no URIs in TAL", file)));
        }
        let first = uris
            .first()
            .map(|u| util::basename(u).to_string())
            .unwrap_or_default();
        if uris.iter().any(|u| util::basename(u) != first) {
            return Err(RpkiError::ParseError(format!(
                "{}: URIs point to different certificates",
                file
            )));
        }
        uris.sort();

        let b64: String = lines.flat_map(|l| l.trim().chars()).collect();
        let pkey = util::base64_decode(&b64).ok_or_else(|| {
            RpkiError::ParseError(format!("{}: bad base64 public key", file))
        })?;
        match SubjectPublicKeyInfo::from_der(&pkey) {
            Ok((rem, _)) if rem.is_empty() => {}
            _ => {
                return Err(RpkiError::ParseError(format!(
                    "{}: invalid public key",
                    file
                )))
            }
        }

        let name = util::basename(file);
        let descr = name.strip_suffix(".tal").unwrap_or(name).to_string();
        if descr.is_empty() {
            return Err(RpkiError::ParseError(format!("{}: empty TAL name", file)));
        }

        Ok(Tal {
            descr,
            uris,
            pkey,
            id: None,
        })
    }

    /// File name of the trust anchor certificate.
    pub fn cert_filename(&self) -> &str {
        self.uris.first().map(|u| util::basename(u)).unwrap_or("")
    }
}
