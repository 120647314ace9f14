//! Key derivation: a single BLAKE3-based XOF used both for session-key
//! derivation from a DH output and for nonce derivation during handshake
//! sealing. No key is supplied — `dh` output is already secret.

use crate::error::CryptoError;

/// Expand `input` into `len` bytes via BLAKE3's extensible output.
pub fn kdf(input: &[u8], len: usize) -> Vec<u8> {
    let mut reader = blake3::Hasher::new().update(input).finalize_xof();
    let mut out = vec![0u8; len];
    reader.fill(&mut out);
    out
}

/// `kdf` specialised to the 32-byte session key derived from a DH output.
pub fn derive_session_key(dh_output: &[u8; 32]) -> Result<[u8; 32], CryptoError> {
    let mut key = [0u8; 32];
    key.copy_from_slice(&kdf(dh_output, 32));
    Ok(key)
}

/// `nonce = kdf(e_pub, 32)[0..12]`, the handshake cert-sealing nonce.
pub fn handshake_nonce(ephemeral_pub: &[u8; 32]) -> [u8; 12] {
    let wide = kdf(ephemeral_pub, 32);
    let mut nonce = [0u8; 12];
    nonce.copy_from_slice(&wide[..12]);
    nonce
}
