//! CRLs keyed by the SKI of the issuing CA.

use std::collections::HashMap;

use crate::object::{Crl, KeyId};
use crate::store::{AuthId, AuthTree};
use crate::RpkiError;

#[derive(Debug, Default)]
pub struct CrlTree {
    by_aki: HashMap<KeyId, Crl>,
}

impl CrlTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a CRL. A second CRL for the same issuer is rejected and the
    /// first one kept.
    pub fn insert(&mut self, crl: Crl) -> Result<(), RpkiError> {
        if self.by_aki.contains_key(&crl.aki) {
            return Err(RpkiError::DuplicateCrl(crl.aki.to_string()));
        }
        self.by_aki.insert(crl.aki.clone(), crl);
        Ok(())
    }

    /// CRL issued by the CA whose SKI is `ski`.
    pub fn find_by_issuer_ski(&self, ski: &KeyId) -> Option<&Crl> {
        self.by_aki.get(ski)
    }

    /// CRLs applicable when verifying an object issued by `issuer`: only the
    /// issuer's own CRL is consulted.
    pub fn crls_for(&self, auths: &AuthTree, issuer: Option<AuthId>) -> Vec<&Crl> {
        issuer
            .and_then(|id| auths.get(id))
            .and_then(|a| self.find_by_issuer_ski(&a.cert.ski))
            .into_iter()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_aki.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_aki.is_empty()
    }
}
