use super::Context;
use crate::store::AuthId;

/// Earliest time at which an object issued by `issuer` stops being valid:
/// its own notAfter, each ancestor's notAfter and `expires`, and the
/// nextUpdate of each ancestor's CRL.
pub(crate) fn find_expires(not_after: i64, ctx: &Context, issuer: Option<AuthId>) -> i64 {
    let Some(id) = issuer else {
        return not_after;
    };
    ctx.auths.ancestors(id).fold(not_after, |acc, a| {
        let crl = ctx
            .crls
            .find_by_issuer_ski(&a.cert.ski)
            .map_or(i64::MAX, |c| c.next_update);
        acc.min(a.cert.not_after).min(a.cert.expires).min(crl)
    })
}
