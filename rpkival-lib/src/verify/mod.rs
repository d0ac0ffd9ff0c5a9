//! X.509 path verification for RPKI objects.
//!
//! Verifies a target certificate against a trusted chain that was already
//! validated (issuer first, trust anchor last): depth, name linkage,
//! validity dates, signatures, CA constraints, critical extensions and,
//! optionally, revocation. The first failing check determines the result,
//! reported with the familiar X.509 verify-error strings.

mod chain;
mod checks;
mod crl;
mod policy;

use std::fmt;

use serde::Serialize;
use x509_parser::prelude::*;

pub use chain::{crl_set, trusted_chain, MAX_CERT_DEPTH};
pub use policy::{ExtensionPolicy, RpkiExtensionPolicy, StrictExtensionPolicy};

/// Why a path failed to verify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyError {
    CertChainTooLong,
    UnableToGetIssuerCertLocally,
    UnableToDecodeCert,
    CertNotYetValid,
    CertHasExpired,
    CertSignatureFailure,
    InvalidCa,
    UnhandledCriticalExtension,
    UnableToGetCrl,
    CrlSignatureFailure,
    CrlNotYetValid,
    CrlHasExpired,
    CertRevoked,
}

impl VerifyError {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerifyError::CertChainTooLong => "certificate chain too long",
            VerifyError::UnableToGetIssuerCertLocally => "unable to get local issuer certificate",
            VerifyError::UnableToDecodeCert => "unable to decode certificate",
            VerifyError::CertNotYetValid => "certificate is not yet valid",
            VerifyError::CertHasExpired => "certificate has expired",
            VerifyError::CertSignatureFailure => "certificate signature failure",
            VerifyError::InvalidCa => "invalid CA certificate",
            VerifyError::UnhandledCriticalExtension => "unhandled critical extension",
            VerifyError::UnableToGetCrl => "unable to get certificate CRL",
            VerifyError::CrlSignatureFailure => "CRL signature failure",
            VerifyError::CrlNotYetValid => "CRL is not yet valid",
            VerifyError::CrlHasExpired => "CRL has expired",
            VerifyError::CertRevoked => "certificate revoked",
        }
    }
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First failing check and the path depth it occurred at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Failure {
    pub error: VerifyError,
    pub depth: usize,
}

impl Failure {
    pub fn new(error: VerifyError, depth: usize) -> Self {
        Failure { error, depth }
    }
}

/// Outcome of a verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub error: Option<VerifyError>,
    /// Depth of the failing certificate (0 = target).
    pub depth: usize,
}

impl Verdict {
    pub fn ok() -> Self {
        Verdict {
            error: None,
            depth: 0,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

impl From<Result<(), Failure>> for Verdict {
    fn from(r: Result<(), Failure>) -> Self {
        match r {
            Ok(()) => Verdict::ok(),
            Err(f) => Verdict {
                error: Some(f.error),
                depth: f.depth,
            },
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.error {
            None => write!(f, "OK"),
            Some(e) => write!(f, "FAIL, {} at depth {}", e, self.depth),
        }
    }
}

/// Input to a path verification.
#[derive(Debug, Clone, Copy)]
pub struct VerifyRequest<'a> {
    /// DER of the certificate being verified.
    pub target: &'a [u8],
    /// Trusted chain, issuer first and trust anchor last.
    pub chain: &'a [&'a [u8]],
    /// Candidate CRLs for the target.
    pub crls: &'a [&'a [u8]],
    pub crl_check: bool,
    /// Maximum number of intermediate certificates; the trust anchor is not
    /// counted.
    pub max_depth: usize,
    pub now: i64,
    pub check_time: bool,
}

/// Path verification seam.
pub trait PathVerifier {
    /// Verify a target certificate against an already trusted chain.
    fn verify(&self, req: &VerifyRequest<'_>) -> Verdict;

    /// Verify a self-signed trust anchor certificate in isolation.
    fn verify_self_signed(&self, der: &[u8], now: i64, check_time: bool) -> Verdict;
}

/// Default verifier built on x509-parser's signature verification.
pub struct X509PathVerifier {
    policy: Box<dyn ExtensionPolicy>,
}

impl X509PathVerifier {
    pub fn new(policy: Box<dyn ExtensionPolicy>) -> Self {
        X509PathVerifier { policy }
    }

    fn run(&self, req: &VerifyRequest<'_>) -> Result<(), Failure> {
        if req.chain.len() > req.max_depth + 1 {
            return Err(Failure::new(VerifyError::CertChainTooLong, req.chain.len()));
        }
        if req.chain.is_empty() {
            return Err(Failure::new(VerifyError::UnableToGetIssuerCertLocally, 0));
        }

        let parsed = parse_path(std::iter::once(req.target).chain(req.chain.iter().copied()))?;

        checks::check_issuer_names(&parsed)?;
        if req.check_time {
            checks::check_time_validity(&parsed, req.now)?;
        }
        checks::check_signatures(&parsed)?;
        checks::check_basic_constraints(&parsed)?;
        checks::check_critical_extensions(&parsed, self.policy.as_ref())?;

        if req.crl_check {
            if let [target, issuer, ..] = parsed.as_slice() {
                crl::check_crl(target, issuer, req.crls, req.now, req.check_time)
                    .map_err(|e| Failure::new(e, 0))?;
            }
        }
        Ok(())
    }

    fn run_self_signed(&self, der: &[u8], now: i64, check_time: bool) -> Result<(), Failure> {
        let parsed = parse_path(std::iter::once(der))?;
        let ta = parsed
            .first()
            .ok_or(Failure::new(VerifyError::UnableToDecodeCert, 0))?;
        if ta.subject().as_raw() != ta.issuer().as_raw() {
            return Err(Failure::new(VerifyError::UnableToGetIssuerCertLocally, 0));
        }
        if check_time {
            checks::check_time_validity(&parsed, now)?;
        }
        if ta.verify_signature(None).is_err() {
            return Err(Failure::new(VerifyError::CertSignatureFailure, 0));
        }
        if !matches!(ta.basic_constraints(), Ok(Some(bc)) if bc.value.ca) {
            return Err(Failure::new(VerifyError::InvalidCa, 0));
        }
        checks::check_critical_extensions(&parsed, self.policy.as_ref())
    }
}

impl Default for X509PathVerifier {
    fn default() -> Self {
        X509PathVerifier::new(Box::new(RpkiExtensionPolicy))
    }
}

impl PathVerifier for X509PathVerifier {
    fn verify(&self, req: &VerifyRequest<'_>) -> Verdict {
        self.run(req).into()
    }

    fn verify_self_signed(&self, der: &[u8], now: i64, check_time: bool) -> Verdict {
        self.run_self_signed(der, now, check_time).into()
    }
}

fn parse_path<'a, I>(ders: I) -> Result<Vec<X509Certificate<'a>>, Failure>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    ders.into_iter()
        .enumerate()
        .map(|(depth, der)| {
            X509Certificate::from_der(der)
                .map(|(_, x509)| x509)
                .map_err(|_| Failure::new(VerifyError::UnableToDecodeCert, depth))
        })
        .collect()
}
