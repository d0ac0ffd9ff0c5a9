//! Centralized OID string constants used throughout rpkival-lib.
//!
//! Grouping them here avoids magic strings scattered across modules and
//! gives each OID a readable name. RPKI-specific identifiers come from
//! RFC 3779 (resource extensions), RFC 6487 (certificate profile), and the
//! CMS content types of RFC 6482, RFC 6486 and RFC 6493.

// ── X.509v3 extensions (RFC 5280 Section 4.2) ───────────────────────────

pub const EXT_SUBJECT_KEY_ID: &str = "2.5.29.14";
pub const EXT_KEY_USAGE: &str = "2.5.29.15";
pub const EXT_BASIC_CONSTRAINTS: &str = "2.5.29.19";
pub const EXT_CRL_DISTRIBUTION_POINTS: &str = "2.5.29.31";
pub const EXT_CERTIFICATE_POLICIES: &str = "2.5.29.32";
pub const EXT_AUTHORITY_KEY_ID: &str = "2.5.29.35";

// ── PKIX Authority/Subject Information Access (RFC 5280 Section 4.2.2) ──

pub const EXT_AUTHORITY_INFO_ACCESS: &str = "1.3.6.1.5.5.7.1.1";
pub const EXT_SUBJECT_INFO_ACCESS: &str = "1.3.6.1.5.5.7.1.11";
pub const ACCESS_CA_ISSUERS: &str = "1.3.6.1.5.5.7.48.2";
pub const ACCESS_CA_REPOSITORY: &str = "1.3.6.1.5.5.7.48.5";
pub const ACCESS_RPKI_MANIFEST: &str = "1.3.6.1.5.5.7.48.10";
pub const ACCESS_SIGNED_OBJECT: &str = "1.3.6.1.5.5.7.48.11";
pub const ACCESS_RPKI_NOTIFY: &str = "1.3.6.1.5.5.7.48.13";

// ── RFC 3779 resource extensions ────────────────────────────────────────

pub const EXT_IP_ADDR_BLOCKS: &str = "1.3.6.1.5.5.7.1.7";
pub const EXT_AS_IDENTIFIERS: &str = "1.3.6.1.5.5.7.1.8";

// ── CMS (RFC 5652) and RPKI signed object content types ─────────────────

pub const CMS_SIGNED_DATA: &str = "1.2.840.113549.1.7.2";
pub const CMS_CONTENT_TYPE: &str = "1.2.840.113549.1.9.3";
pub const CMS_MESSAGE_DIGEST: &str = "1.2.840.113549.1.9.4";
pub const CMS_SIGNING_TIME: &str = "1.2.840.113549.1.9.5";
pub const CMS_BINARY_SIGNING_TIME: &str = "1.2.840.113549.1.9.16.2.46";
pub const CT_ROUTE_ORIGIN_AUTHZ: &str = "1.2.840.113549.1.9.16.1.24";
pub const CT_RPKI_MANIFEST: &str = "1.2.840.113549.1.9.16.1.26";
pub const CT_RPKI_GHOSTBUSTERS: &str = "1.2.840.113549.1.9.16.1.35";

// ── Digest algorithms ───────────────────────────────────────────────────

pub const SHA256: &str = "2.16.840.1.101.3.4.2.1";

// ── Signature algorithms ────────────────────────────────────────────────

pub const RSA_ENCRYPTION: &str = "1.2.840.113549.1.1.1";
