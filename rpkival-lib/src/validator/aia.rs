//! Authority Information Access resolution.
//!
//! When a CA certificate names an issuer that has not been validated yet,
//! the resolver follows `caIssuers` URIs upward until it reaches a known
//! authority, then validates and registers the collected certificates from
//! the top down. Nothing is registered unless the walk reaches a known
//! authority within the depth bound.

use tracing::{debug, warn};

use super::Validator;
use crate::object::{Cert, CertPurpose};
use crate::store::AuthId;
use crate::util::rsync_relative;
use crate::RpkiError;

impl Validator {
    /// Resolve the certificate at `uri` to a validated authority.
    pub(crate) fn resolve_aia(&mut self, uri: &str) -> Result<AuthId, RpkiError> {
        let mut stack: Vec<(Cert, String)> = Vec::new();
        let mut next = uri.to_string();

        loop {
            if let Some(ski) = self.ctx.uris.lookup(&next) {
                if self.ctx.auths.find(ski).is_none() {
                    return Err(RpkiError::ChainError(format!(
                        "{}: failed to find issuer",
                        next
                    )));
                }
                debug!("{}: resolved from URI cache", next);
                break;
            }
            if stack.len() >= self.config.max_cert_depth {
                return Err(RpkiError::ChainError(format!(
                    "authority chain exceeds max depth of {}",
                    self.config.max_cert_depth
                )));
            }

            let cert = self.load_aia_cert(&next)?;
            if self.ctx.auths.find(&cert.ski).is_some() {
                self.ctx.uris.add(&next, cert.ski.clone())?;
                break;
            }
            let parent_known = cert
                .aki
                .as_ref()
                .map_or(false, |aki| self.ctx.auths.find(aki).is_some());
            let parent_uri = cert.aia.clone();
            stack.push((cert, next));
            if parent_known {
                break;
            }
            next = parent_uri.ok_or_else(|| {
                RpkiError::ChainError("unknown issuer and no AIA to follow".into())
            })?;
        }

        while let Some((cert, cert_uri)) = stack.pop() {
            let ski = cert.ski.clone();
            let issuer = self.locate_issuer(&cert, false)?;
            self.validate_cert(&cert_uri, cert, issuer)?;
            self.ctx.uris.add(&cert_uri, ski)?;
        }

        let ski = self
            .ctx
            .uris
            .lookup(uri)
            .ok_or_else(|| RpkiError::ChainError(format!("{}: failed to find issuer", uri)))?;
        self.ctx
            .auths
            .find(ski)
            .ok_or_else(|| RpkiError::ChainError(format!("{}: failed to find issuer", uri)))
    }

    /// Fetch and decode the CA certificate at `uri`, loading the CRL it
    /// points to along the way.
    fn load_aia_cert(&mut self, uri: &str) -> Result<Cert, RpkiError> {
        let rel = rsync_relative(uri)
            .ok_or_else(|| RpkiError::ChainError(format!("{}: not an rsync URI", uri)))?;
        let path = self.config.aia_base.join(rel);
        let der = self.loader.load_file(&path)?;
        let cert = self.decoder.cert(&der)?;
        if cert.purpose == CertPurpose::EndEntity {
            return Err(RpkiError::ChainError(format!(
                "AIA reference to {} is not a CA certificate",
                uri
            )));
        }
        if let Some(crl) = cert.crl.clone() {
            self.load_crl_uri(&crl);
        }
        Ok(cert)
    }

    /// Load the CRL at an rsync `uri` into the CRL tree. Missing or
    /// duplicate CRLs are not errors here; the verifier reports a missing
    /// CRL when it needs one.
    pub(crate) fn load_crl_uri(&mut self, uri: &str) {
        let Some(rel) = rsync_relative(uri) else {
            warn!("{}: not an rsync URI", uri);
            return;
        };
        let path = self.config.aia_base.join(rel);
        let result = self
            .loader
            .load_file(&path)
            .and_then(|der| self.decoder.crl(&der))
            .and_then(|crl| self.ctx.crls.insert(crl));
        match result {
            Ok(()) => debug!("{}: loaded CRL", uri),
            Err(RpkiError::DuplicateCrl(_)) => {}
            Err(e) => warn!("{}: {}", uri, e),
        }
    }
}
