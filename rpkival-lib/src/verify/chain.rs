//! Chain builder: turns validated tree state into verifier input.

use crate::store::{AuthId, AuthTree, CrlTree};

/// Maximum number of CA certificates between an object and its trust anchor.
pub const MAX_CERT_DEPTH: usize = 12;

/// DER encodings of the trusted chain from `issuer` up to its trust anchor
/// (issuer first). Empty when there is no issuer.
pub fn trusted_chain(auths: &AuthTree, issuer: Option<AuthId>) -> Vec<&[u8]> {
    match issuer {
        Some(id) => auths
            .ancestors(id)
            .map(|a| a.cert.der.as_slice())
            .collect(),
        None => Vec::new(),
    }
}

/// DER encodings of the CRLs applicable to objects issued by `issuer`.
pub fn crl_set<'a>(crls: &'a CrlTree, auths: &AuthTree, issuer: Option<AuthId>) -> Vec<&'a [u8]> {
    crls.crls_for(auths, issuer)
        .into_iter()
        .map(|c| c.der.as_slice())
        .collect()
}
