//! Individual verification check functions.
//!
//! Each check walks the parsed path (index 0 = target, last = trust anchor)
//! and returns the first failure with the depth it occurred at.

use x509_parser::prelude::*;

use super::policy::{is_known_extension, ExtensionPolicy};
use super::{Failure, VerifyError};

/// Each certificate's issuer name must match the next certificate's subject.
pub(crate) fn check_issuer_names(parsed: &[X509Certificate<'_>]) -> Result<(), Failure> {
    for (i, (child, parent)) in parsed.iter().zip(parsed.iter().skip(1)).enumerate() {
        if child.issuer().as_raw() != parent.subject().as_raw() {
            return Err(Failure::new(VerifyError::UnableToGetIssuerCertLocally, i));
        }
    }
    Ok(())
}

/// Check validity dates for all certificates in the path.
pub(crate) fn check_time_validity(
    parsed: &[X509Certificate<'_>],
    now_ts: i64,
) -> Result<(), Failure> {
    for (i, x509) in parsed.iter().enumerate() {
        if now_ts < x509.validity().not_before.timestamp() {
            return Err(Failure::new(VerifyError::CertNotYetValid, i));
        }
        if now_ts > x509.validity().not_after.timestamp() {
            return Err(Failure::new(VerifyError::CertHasExpired, i));
        }
    }
    Ok(())
}

/// Verify signatures along the path (each cert signed by the next). The
/// trust anchor itself is trusted as-is.
pub(crate) fn check_signatures(parsed: &[X509Certificate<'_>]) -> Result<(), Failure> {
    for (i, (child, parent)) in parsed.iter().zip(parsed.iter().skip(1)).enumerate() {
        if let Err(e) = child.verify_signature(Some(parent.public_key())) {
            tracing::debug!(depth = i, error = %e, "signature verification failed");
            return Err(Failure::new(VerifyError::CertSignatureFailure, i));
        }
    }
    Ok(())
}

/// Every issuer must be a CA.
pub(crate) fn check_basic_constraints(parsed: &[X509Certificate<'_>]) -> Result<(), Failure> {
    for (i, x509) in parsed.iter().enumerate().skip(1) {
        let is_ca = matches!(x509.basic_constraints(), Ok(Some(bc)) if bc.value.ca);
        if !is_ca {
            return Err(Failure::new(VerifyError::InvalidCa, i));
        }
    }
    Ok(())
}

/// RFC 5280 Section 4.2: reject unrecognized critical extensions unless the
/// policy accepts them.
pub(crate) fn check_critical_extensions(
    parsed: &[X509Certificate<'_>],
    policy: &dyn ExtensionPolicy,
) -> Result<(), Failure> {
    for (i, x509) in parsed.iter().enumerate() {
        for ext in x509.extensions() {
            if !ext.critical {
                continue;
            }
            let oid = ext.oid.to_id_string();
            if is_known_extension(&oid) || policy.allow_critical(&oid, i) {
                continue;
            }
            tracing::warn!("depth {}: unknown extension: {}", i, oid);
            return Err(Failure::new(VerifyError::UnhandledCriticalExtension, i));
        }
    }
    Ok(())
}
