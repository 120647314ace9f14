//! ChaCha20-Poly1305 AEAD, 96-bit nonces.
//!
//! The nonce is never generated here: callers draw it from a CSPRNG (record
//! layer) or derive it from the ephemeral public key (handshake sealing,
//! see `kdf::handshake_nonce`) and pass it in explicitly, because the wire
//! format carries the nonce as its own packet field rather than prefixing it
//! onto the ciphertext.

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Key, Nonce,
};
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// Seal `plaintext` under `key`/`nonce`, returning ciphertext || tag.
pub fn aead_seal(
    key: &[u8; 32],
    nonce: &[u8; 12],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    cipher
        .encrypt(Nonce::from_slice(nonce), Payload { msg: plaintext, aad })
        .map_err(|_| CryptoError::AuthFailure)
}

/// Open a ciphertext produced by [`aead_seal`]; any alteration of
/// ciphertext, tag, key, nonce, or `aad` yields `AuthFailure`.
pub fn aead_open(
    key: &[u8; 32],
    nonce: &[u8; 12],
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), Payload { msg: ciphertext, aad })
        .map_err(|_| CryptoError::AuthFailure)?;
    Ok(Zeroizing::new(plaintext))
}
