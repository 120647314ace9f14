use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("AEAD authentication failed (possible tampering)")]
    AuthFailure,

    #[error("Curve25519 DH produced a degenerate (all-zero) output")]
    CryptoFailure,

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("invalid key material: {0}")]
    InvalidKey(String),
}
