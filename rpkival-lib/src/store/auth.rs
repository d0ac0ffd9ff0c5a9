//! Tree of validated CA certificates.

use std::collections::HashMap;

use crate::object::{Cert, KeyId};
use crate::RpkiError;

/// Handle to a node of an [`AuthTree`]. Only handed out by the tree itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AuthId(usize);

/// A validated CA certificate and a link to its issuer (None for trust
/// anchors).
#[derive(Debug, Clone)]
pub struct Auth {
    pub cert: Cert,
    pub parent: Option<AuthId>,
}

/// Validated authorities, keyed by subject key identifier.
///
/// Nodes live in an arena and reference their issuer by index, so following
/// the chain to the trust anchor never needs shared ownership.
#[derive(Debug, Default)]
pub struct AuthTree {
    nodes: Vec<Auth>,
    by_ski: HashMap<KeyId, AuthId>,
}

impl AuthTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a validated certificate under `parent`.
    ///
    /// A second certificate with the same SKI is a fatal error: callers check
    /// for re-registration before validating.
    pub fn insert(&mut self, cert: Cert, parent: Option<AuthId>) -> Result<AuthId, RpkiError> {
        if self.by_ski.contains_key(&cert.ski) {
            return Err(RpkiError::Fatal(format!(
                "auth tree corrupted: duplicate SKI {}",
                cert.ski
            )));
        }
        if let Some(p) = parent {
            if p.0 >= self.nodes.len() {
                return Err(RpkiError::Fatal("auth tree corrupted: dangling parent".into()));
            }
        }
        let id = AuthId(self.nodes.len());
        self.by_ski.insert(cert.ski.clone(), id);
        self.nodes.push(Auth { cert, parent });
        Ok(id)
    }

    pub fn find(&self, ski: &KeyId) -> Option<AuthId> {
        self.by_ski.get(ski).copied()
    }

    pub fn get(&self, id: AuthId) -> Option<&Auth> {
        self.nodes.get(id.0)
    }

    /// Walk from `id` up to its trust anchor, `id` first.
    pub fn ancestors(&self, id: AuthId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: Some(id),
        }
    }

    /// Certificates from `id` up to the trust anchor.
    pub fn chain(&self, id: AuthId) -> Vec<&Cert> {
        self.ancestors(id).map(|a| &a.cert).collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

pub struct Ancestors<'a> {
    tree: &'a AuthTree,
    next: Option<AuthId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Auth;

    fn next(&mut self) -> Option<&'a Auth> {
        let auth = self.tree.get(self.next?)?;
        self.next = auth.parent;
        Some(auth)
    }
}
