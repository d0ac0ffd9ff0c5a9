//! File digests.
//!
//! Manifests list SHA-256 hashes of the files they cover; file-mode reports
//! identify each input by the base64 of the same digest.

use digest::Digest;

/// SHA-256 over raw file contents.
pub fn file_hash(data: &[u8]) -> Vec<u8> {
    sha2::Sha256::digest(data).to_vec()
}

/// Base64-encoded SHA-256, the "Hash identifier" shown in reports.
pub fn hash_id(data: &[u8]) -> String {
    crate::util::base64_encode(&file_hash(data))
}

/// Compare a file's contents against an expected manifest digest.
pub fn hash_matches(data: &[u8], expected: &[u8]) -> bool {
    file_hash(data).as_slice() == expected
}
