//! Shared encoding and path utilities.

use base64::Engine;
use serde::Serializer;

const RSYNC_PREFIX: &str = "rsync://";

/// Format bytes as colon-separated uppercase hex (e.g., "AB:CD:EF").
pub fn hex_colon_upper(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Standard base64 without line wrapping.
pub fn base64_encode(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

pub fn base64_decode(data: &str) -> Option<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(data.trim())
        .ok()
}

/// Serde helper: serialize bytes as a base64 string.
pub fn serialize_base64<T: AsRef<[u8]>, S: Serializer>(data: T, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&base64_encode(data.as_ref()))
}

/// Serde helper for optional base64 payloads on work items.
pub mod base64_opt {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match data {
            Some(d) => s.serialize_some(&super::base64_encode(d)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        let value: Option<String> = Option::deserialize(d)?;
        match value {
            Some(text) => super::base64_decode(&text)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom("invalid base64 payload")),
            None => Ok(None),
        }
    }
}

/// Strip the `rsync://` scheme, returning the host-relative path used for the
/// on-disk cache layout.
pub fn rsync_relative(uri: &str) -> Option<&str> {
    let rest = uri.strip_prefix(RSYNC_PREFIX)?;
    if rest.is_empty() || rest.contains("/../") || rest.starts_with("../") {
        return None;
    }
    Some(rest)
}

pub fn is_rsync_uri(uri: &str) -> bool {
    uri.starts_with(RSYNC_PREFIX)
}

/// Final path component of a URI or filesystem path.
pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Check a manifest file name: at least five characters, only
/// `[A-Za-z0-9-_.]`, exactly one dot, and a known RPKI object extension.
pub fn valid_filename(name: &str) -> bool {
    if name.len() < 5 {
        return false;
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b'.')
    {
        return false;
    }
    if name.bytes().filter(|&b| b == b'.').count() != 1 {
        return false;
    }
    [".cer", ".crl", ".gbr", ".roa"]
        .iter()
        .any(|ext| name.ends_with(ext))
}

/// Render a Unix timestamp in the UTC form used by reports.
pub fn time2str(ts: i64) -> String {
    let format = time::macros::format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second] UTC"
    );
    time::OffsetDateTime::from_unix_timestamp(ts)
        .ok()
        .and_then(|t| t.format(&format).ok())
        .unwrap_or_else(|| ts.to_string())
}
