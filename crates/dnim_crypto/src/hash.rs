//! BLAKE3 hashing used for the identity fingerprint.

/// 256-bit hash of arbitrary bytes (used on DER-encoded certificates to
/// produce a stable fingerprint).
pub fn hash(data: &[u8]) -> [u8; 32] {
    blake3::hash(data).into()
}

/// Constant-time comparison of two 32-byte hashes.
pub fn constant_time_eq(a: &[u8; 32], b: &[u8; 32]) -> bool {
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
