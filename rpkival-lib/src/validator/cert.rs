//! Resource certificates and trust anchors.

use tracing::debug;

use super::expiry::find_expires;
use super::Validator;
use crate::object::{Cert, CertPurpose, KeyId};
use crate::resources::check_resources;
use crate::store::AuthId;
use crate::RpkiError;

impl Validator {
    /// Validate a CA or EE certificate fetched from a repository. CA
    /// certificates with an unknown issuer are resolved through their AIA.
    pub(crate) fn proc_cert(&mut self, file: &str, der: &[u8]) -> Result<Cert, RpkiError> {
        let cert = self.decoder.cert(der)?;
        if cert.purpose == CertPurpose::TrustAnchor {
            return Err(RpkiError::ChainError(
                "trust anchor certificate without TAL key".into(),
            ));
        }
        let issuer = self.locate_issuer(&cert, cert.is_ca())?;
        self.validate_cert(file, cert, issuer)
    }

    /// Find the issuer of `cert`, running the AIA resolver on a miss when
    /// `resolve` is set.
    pub(crate) fn locate_issuer(&mut self, cert: &Cert, resolve: bool) -> Result<AuthId, RpkiError> {
        let aki = cert
            .aki
            .as_ref()
            .ok_or_else(|| RpkiError::ChainError("RFC 6487: missing AKI".into()))?;
        let known = self.ctx.auths.find(&cert.ski).is_some() || self.ctx.auths.find(aki).is_some();
        match cert.aia.as_deref() {
            Some(uri) if resolve && !known => {
                let id = self.resolve_aia(uri)?;
                self.ensure_issuer(id, aki)
            }
            _ => self.valid_ski_aki(&cert.ski, aki),
        }
    }

    /// Check a certificate whose issuer is known and register it when it is
    /// a CA. Returns the certificate with `talid` and `expires` filled in.
    pub(crate) fn validate_cert(
        &mut self,
        file: &str,
        mut cert: Cert,
        issuer: AuthId,
    ) -> Result<Cert, RpkiError> {
        if self.ctx.auths.find(&cert.ski).is_some() {
            return Err(RpkiError::ChainError(format!(
                "RFC 6487: re-registering SKI {}",
                cert.ski
            )));
        }
        self.valid_x509(&cert.der, Some(issuer), true)?;
        check_resources(&cert.resources, &self.issuer_resources(issuer))?;

        cert.talid = self.talid_of(issuer);
        cert.expires = find_expires(cert.not_after, &self.ctx, Some(issuer));
        if cert.is_ca() {
            self.ctx.auths.insert(cert.clone(), Some(issuer))?;
            debug!(ski = %cert.ski, "{}: registered CA certificate", file);
        }
        Ok(cert)
    }

    /// Validate a trust anchor against the public key from its TAL and
    /// register it as a root.
    pub(crate) fn proc_root_cert(
        &mut self,
        file: &str,
        der: &[u8],
        pkey: &[u8],
        talid: usize,
    ) -> Result<Cert, RpkiError> {
        let mut cert = self.decoder.cert(der)?;
        self.check_ta(&cert, pkey)?;
        if self.ctx.auths.find(&cert.ski).is_some() {
            return Err(RpkiError::ChainError(format!(
                "RFC 6487: re-registering SKI {}",
                cert.ski
            )));
        }
        cert.talid = Some(talid);
        cert.expires = cert.not_after;
        self.ctx.auths.insert(cert.clone(), None)?;
        debug!(ski = %cert.ski, "{}: registered trust anchor", file);
        Ok(cert)
    }

    pub(crate) fn check_ta(&self, cert: &Cert, pkey: &[u8]) -> Result<(), RpkiError> {
        if cert.purpose != CertPurpose::TrustAnchor {
            return Err(RpkiError::ChainError(
                "RFC 6487: expected a self-signed trust anchor".into(),
            ));
        }
        if cert.spki != pkey {
            return Err(RpkiError::ChainError(
                "RFC 8630: trust anchor public key does not match TAL".into(),
            ));
        }
        let verdict =
            self.verifier
                .verify_self_signed(&cert.der, self.now(), self.config.check_time);
        if let Some(e) = verdict.error {
            return Err(RpkiError::VerifyError(e.as_str().to_string()));
        }
        if cert.resources.has_inherit() {
            return Err(RpkiError::ResourceError(
                "RFC 6487: trust anchor uses inheritance".into(),
            ));
        }
        Ok(())
    }

    fn ensure_issuer(&self, id: AuthId, aki: &KeyId) -> Result<AuthId, RpkiError> {
        match self.ctx.auths.get(id) {
            Some(a) if a.cert.ski == *aki => Ok(id),
            _ => Err(RpkiError::ChainError(format!(
                "AIA does not lead to issuer {}",
                aki
            ))),
        }
    }
}
