//! Curve25519 key pairs and the raw DH operation.
//!
//! `StaticKeyPair` is the long-lived per-installation identity key; it is
//! persisted and reused across handshakes. `EphemeralKeyPair` is generated
//! fresh for each handshake attempt and is consumed (and zeroized) by the
//! single `dh` call it participates in.

use rand_core::OsRng;
use x25519_dalek::{EphemeralSecret, PublicKey, StaticSecret};
use zeroize::Zeroize;

use crate::error::CryptoError;

/// Long-lived Curve25519 keypair for one local installation.
pub struct StaticKeyPair {
    secret: StaticSecret,
    public: PublicKey,
}

impl StaticKeyPair {
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// Reconstruct a keypair from 32 bytes of previously persisted secret
    /// material.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        let secret = StaticSecret::from(bytes);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    pub fn public(&self) -> PublicKey {
        self.public
    }

    pub fn public_bytes(&self) -> [u8; 32] {
        self.public.to_bytes()
    }

    /// `dh(static_priv, peer_pub)`, used by the responder.
    pub fn dh(&self, peer_public: &PublicKey) -> Result<[u8; 32], CryptoError> {
        dh_output(self.secret.diffie_hellman(peer_public))
    }
}

/// Per-handshake-attempt Curve25519 keypair. Consumed (and zeroized) by its
/// single `dh` call.
pub struct EphemeralKeyPair {
    secret: EphemeralSecret,
    public: PublicKey,
}

impl EphemeralKeyPair {
    pub fn generate() -> Self {
        let secret = EphemeralSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    pub fn public(&self) -> PublicKey {
        self.public
    }

    pub fn public_bytes(&self) -> [u8; 32] {
        self.public.to_bytes()
    }

    /// `dh(e_priv, peer_static_pub)`, used by the initiator. Consumes the
    /// ephemeral secret.
    pub fn dh(self, peer_static_public: &PublicKey) -> Result<[u8; 32], CryptoError> {
        dh_output(self.secret.diffie_hellman(peer_static_public))
    }
}

/// Raw Curve25519 DH from a 32-byte public key slice (as carried on the wire).
pub fn public_key_from_bytes(bytes: &[u8]) -> Result<PublicKey, CryptoError> {
    let arr: [u8; 32] = bytes
        .try_into()
        .map_err(|_| CryptoError::InvalidKey("public key must be 32 bytes".into()))?;
    Ok(PublicKey::from(arr))
}

fn dh_output(shared: x25519_dalek::SharedSecret) -> Result<[u8; 32], CryptoError> {
    let mut bytes = shared.to_bytes();
    let is_zero = bytes.iter().all(|b| *b == 0);
    if is_zero {
        bytes.zeroize();
        return Err(CryptoError::CryptoFailure);
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initiator_and_responder_derive_equal_shared_secret() {
        let responder_static = StaticKeyPair::generate();
        let initiator_ephemeral = EphemeralKeyPair::generate();
        let initiator_ephemeral_pub = initiator_ephemeral.public();

        // initiator: ss = dh(e_priv, responder_static_pub)
        let ss_initiator = initiator_ephemeral.dh(&responder_static.public()).unwrap();
        // responder: ss = dh(static_priv, e_pub_init)
        let ss_responder = responder_static.dh(&initiator_ephemeral_pub).unwrap();

        assert_eq!(ss_initiator, ss_responder);
    }
}
