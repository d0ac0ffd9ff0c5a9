//! Critical extension policies.
//!
//! The path verifier handles the RFC 5280 extensions itself. Any other
//! extension marked critical is offered to an [`ExtensionPolicy`], which
//! decides whether the certificate may still be accepted.

use crate::oid;

pub trait ExtensionPolicy {
    /// Whether an unhandled critical extension `oid` found on the
    /// certificate at `depth` (0 = target) is acceptable.
    fn allow_critical(&self, oid: &str, depth: usize) -> bool;
}

/// Accepts the two RFC 3779 resource extensions that every RPKI
/// certificate carries and rejects anything else.
#[derive(Debug, Default, Clone, Copy)]
pub struct RpkiExtensionPolicy;

impl ExtensionPolicy for RpkiExtensionPolicy {
    fn allow_critical(&self, oid: &str, _depth: usize) -> bool {
        matches!(oid, oid::EXT_IP_ADDR_BLOCKS | oid::EXT_AS_IDENTIFIERS)
    }
}

/// Plain RFC 5280 behavior: every unhandled critical extension fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct StrictExtensionPolicy;

impl ExtensionPolicy for StrictExtensionPolicy {
    fn allow_critical(&self, _oid: &str, _depth: usize) -> bool {
        false
    }
}

/// Check if an extension OID is one the verifier or the certificate
/// decoder consumes. RFC 5280 Section 4.2 requires that implementations
/// reject certificates containing unrecognized critical extensions, and
/// RFC 6487 allows no others in resource certificates.
pub(crate) fn is_known_extension(oid: &str) -> bool {
    matches!(
        oid,
        oid::EXT_BASIC_CONSTRAINTS
            | oid::EXT_KEY_USAGE
            | oid::EXT_SUBJECT_KEY_ID
            | oid::EXT_AUTHORITY_KEY_ID
            | oid::EXT_CRL_DISTRIBUTION_POINTS
            | oid::EXT_CERTIFICATE_POLICIES
            | oid::EXT_AUTHORITY_INFO_ACCESS
            | oid::EXT_SUBJECT_INFO_ACCESS
    )
}
