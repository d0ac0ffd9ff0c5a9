//! CRL-based certificate revocation checking.

use x509_parser::prelude::*;
use x509_parser::revocation_list::CertificateRevocationList;

use super::VerifyError;

/// Check `cert` against the CRL issued by `issuer`.
///
/// `crl_ders` is searched for a CRL whose issuer name matches the
/// certificate's. The CRL must be signed by `issuer`, current at `now_ts`
/// (when `check_time` is set), and must not list the certificate's serial.
pub(crate) fn check_crl(
    cert: &X509Certificate<'_>,
    issuer: &X509Certificate<'_>,
    crl_ders: &[&[u8]],
    now_ts: i64,
    check_time: bool,
) -> Result<(), VerifyError> {
    let crl = crl_ders
        .iter()
        .filter_map(|der| CertificateRevocationList::from_der(*der).ok())
        .map(|(_, crl)| crl)
        .find(|crl| crl.issuer().as_raw() == cert.issuer().as_raw())
        .ok_or(VerifyError::UnableToGetCrl)?;

    if crl.verify_signature(issuer.public_key()).is_err() {
        return Err(VerifyError::CrlSignatureFailure);
    }

    // RFC 5280 Section 6.3.3: Check CRL validity dates
    if check_time {
        if now_ts < crl.last_update().timestamp() {
            return Err(VerifyError::CrlNotYetValid);
        }
        if let Some(next_update) = crl.next_update() {
            if now_ts > next_update.timestamp() {
                return Err(VerifyError::CrlHasExpired);
            }
        }
    }

    let serial = cert.raw_serial();
    if crl
        .iter_revoked_certificates()
        .any(|revoked| revoked.raw_serial() == serial)
    {
        return Err(VerifyError::CertRevoked);
    }
    Ok(())
}
