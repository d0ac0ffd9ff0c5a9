//! File mode: validate individual objects named on the command line.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, warn};

use super::expiry::find_expires;
use super::Validator;
use crate::entity::{Object, RType};
use crate::hash::hash_id;
use crate::object::{Cert, CertPurpose};
use crate::resources::{check_resources, roa_covered};
use crate::store::AuthId;
use crate::util::{is_rsync_uri, rsync_relative};
use crate::RpkiError;

/// Outcome of validating one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    #[serde(rename = "OK")]
    Ok,
    Failed,
    /// The object has no issuer to validate against (CRLs, TALs, unknown
    /// trust anchors).
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Ok => "OK",
            Status::Failed => "Failed",
            Status::NotApplicable => "N/A",
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub file: String,
    pub hash_id: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub rtype: Option<RType>,
    #[serde(rename = "validation")]
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// CRL, manifest and AIA URIs from the object up to its trust anchor.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub signature_path: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<i64>,
    /// Description of the TAL a trust anchor was matched to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<Object>,
}

impl FileReport {
    fn new(file: &str) -> Self {
        FileReport {
            file: file.to_string(),
            hash_id: String::new(),
            rtype: None,
            status: Status::Failed,
            error: None,
            signature_path: Vec::new(),
            expires: None,
            tal: None,
            object: None,
        }
    }

    fn fail(&mut self, err: &RpkiError) {
        self.status = Status::Failed;
        self.error = Some(err.to_string());
    }
}

impl Validator {
    /// Parse a TAL and register its trust anchor, read from
    /// `ta/<descr>/<file>` below the AIA base directory.
    ///
    /// A trust anchor that cannot be loaded is logged; the TAL is kept so
    /// the trust anchor file can still be matched later.
    pub fn load_tal(&mut self, file: &str, data: &[u8]) -> Result<usize, RpkiError> {
        let mut tal = self.decoder.tal(file, data)?;
        let id = self.tals.len();
        tal.id = Some(id);

        let path = self
            .config
            .aia_base
            .join("ta")
            .join(&tal.descr)
            .join(tal.cert_filename());
        let name = path.to_string_lossy().into_owned();
        let loaded = self
            .loader
            .load_file(&path)
            .and_then(|der| self.proc_root_cert(&name, &der, &tal.pkey, id));
        match loaded {
            Ok(cert) => {
                for uri in tal.uris.iter().filter(|u| is_rsync_uri(u)) {
                    self.ctx.uris.add(uri, cert.ski.clone())?;
                }
                debug!("{}: loaded trust anchor {}", file, name);
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => warn!("{}: {}", name, e),
        }
        self.tals.push(tal);
        Ok(id)
    }

    /// Validate one file (a path, or an rsync URI mapped below the AIA base
    /// directory) and describe the result. The object itself is never
    /// registered, though issuers found through its AIA are.
    pub fn check_file(&mut self, file: &str) -> Result<FileReport, RpkiError> {
        let mut report = FileReport::new(file);
        let path = match file.strip_prefix("rsync://") {
            Some(_) => match rsync_relative(file) {
                Some(rel) => self.config.aia_base.join(rel),
                None => {
                    report.fail(&RpkiError::ParseError(format!("{}: bad rsync URI", file)));
                    return Ok(report);
                }
            },
            None => PathBuf::from(file),
        };
        let data = match self.loader.load_file(&path) {
            Ok(d) => d,
            Err(e) => {
                report.fail(&e);
                return Ok(report);
            }
        };
        report.hash_id = hash_id(&data);
        report.rtype = RType::from_filename(file);

        let object = match self.decode_any(report.rtype, file, &data) {
            Ok(o) => o,
            Err(e) => {
                report.fail(&e);
                return Ok(report);
            }
        };
        if let Err(e) = self.check_object(object, &mut report) {
            if e.is_fatal() {
                return Err(e);
            }
            report.fail(&e);
        }
        Ok(report)
    }

    fn decode_any(&self, rtype: Option<RType>, file: &str, data: &[u8]) -> Result<Object, RpkiError> {
        Ok(match rtype {
            Some(RType::Cer) => Object::Cert(self.decoder.cert(data)?),
            Some(RType::Crl) => Object::Crl(self.decoder.crl(data)?),
            Some(RType::Mft) => Object::Mft(self.decoder.mft(data)?),
            Some(RType::Roa) => Object::Roa(self.decoder.roa(data)?),
            Some(RType::Gbr) => Object::Gbr(self.decoder.gbr(data)?),
            Some(RType::Tal) => Object::Tal(self.decoder.tal(file, data)?),
            _ => {
                return Err(RpkiError::ParseError(format!(
                    "{}: unsupported file type",
                    file
                )))
            }
        })
    }

    fn check_object(&mut self, mut object: Object, report: &mut FileReport) -> Result<(), RpkiError> {
        let cert = match &object {
            Object::Cert(c) => c.clone(),
            Object::Mft(m) => m.signed.ee.clone(),
            Object::Roa(r) => r.signed.ee.clone(),
            Object::Gbr(g) => g.signed.ee.clone(),
            Object::Crl(_) | Object::Tal(_) => {
                report.status = Status::NotApplicable;
                report.object = Some(object);
                return Ok(());
            }
        };

        let Some(aia) = cert.aia.clone() else {
            if cert.purpose == CertPurpose::TrustAnchor {
                self.check_trust_anchor(&cert, report);
            } else {
                report.status = Status::NotApplicable;
            }
            report.object = Some(object);
            return Ok(());
        };

        let issuer = match self.verify_in_chain(&cert, &aia) {
            Ok(id) => id,
            Err(e) => {
                report.object = Some(object);
                return Err(e);
            }
        };
        let expires = find_expires(cert.not_after, &self.ctx, Some(issuer));
        let talid = self.talid_of(issuer);
        report.status = Status::Ok;
        match &mut object {
            Object::Cert(c) => {
                c.talid = talid;
                c.expires = expires;
            }
            Object::Roa(roa) => {
                roa.talid = talid;
                roa.signed.expires = expires;
                roa.valid = roa_covered(
                    &roa.prefixes,
                    &roa.signed.ee.resources,
                    &self.issuer_resources(issuer),
                );
                if !roa.valid {
                    report.status = Status::Failed;
                    report.error = Some("ROA prefixes not covered by EE resources".into());
                }
            }
            Object::Mft(mft) => {
                mft.signed.expires = expires;
                mft.stale = self.is_stale(mft);
                mft.valid = true;
            }
            Object::Gbr(gbr) => {
                gbr.signed.expires = expires;
                gbr.valid = true;
            }
            Object::Crl(_) | Object::Tal(_) => {}
        }
        if report.status == Status::Ok {
            report.expires = Some(expires);
            report.signature_path = self.signature_path(&cert, &aia, issuer);
        }
        report.object = Some(object);
        Ok(())
    }

    /// Load the object's CRL, find its issuer (resolving the AIA chain if
    /// needed) and run X.509 and resource checks.
    fn verify_in_chain(&mut self, cert: &Cert, aia: &str) -> Result<AuthId, RpkiError> {
        if let Some(crl) = cert.crl.as_deref() {
            self.load_crl_uri(crl);
        }
        let aki = cert
            .aki
            .as_ref()
            .ok_or_else(|| RpkiError::ChainError("RFC 6487: missing AKI".into()))?;
        let issuer = match self.ctx.auths.find(aki) {
            Some(id) => id,
            None => self.resolve_aia(aia)?,
        };
        if self.ctx.auths.get(issuer).map(|a| &a.cert.ski) != Some(aki) {
            return Err(RpkiError::ChainError(format!("unknown AKI {}", aki)));
        }
        self.valid_x509(&cert.der, Some(issuer), true)?;
        check_resources(&cert.resources, &self.issuer_resources(issuer))?;
        Ok(issuer)
    }

    fn check_trust_anchor(&self, cert: &Cert, report: &mut FileReport) {
        let Some(tal) = self.tals.iter().find(|t| t.pkey == cert.spki) else {
            report.status = Status::NotApplicable;
            return;
        };
        report.tal = Some(tal.descr.clone());
        match self.check_ta(cert, &tal.pkey) {
            Ok(()) => {
                report.status = Status::Ok;
                report.expires = Some(cert.not_after);
            }
            Err(e) => report.fail(&e),
        }
    }

    fn signature_path(&self, cert: &Cert, aia: &str, issuer: AuthId) -> Vec<String> {
        let mut path = Vec::new();
        path.extend(cert.crl.clone());
        if let Some(a) = self.ctx.auths.get(issuer) {
            path.extend(a.cert.mft.clone());
        }
        path.push(aia.to_string());
        for a in self.ctx.auths.ancestors(issuer) {
            path.extend(a.cert.crl.clone());
            if let Some(parent) = a.parent.and_then(|p| self.ctx.auths.get(p)) {
                path.extend(parent.cert.mft.clone());
            }
            path.extend(a.cert.aia.clone());
        }
        path
    }
}
