//! dnim_crypto — the three opaque cryptographic primitives the transport
//! core is built from.
//!
//! # Design principles
//! - No custom crypto; all primitives come from audited Rust crates.
//! - Secret material is zeroized on drop.
//! - Public APIs return opaque newtypes to prevent accidental misuse.
//!
//! # Module layout
//! - `keys`  — Curve25519 static/ephemeral keypairs and `dh`
//! - `kdf`   — BLAKE3-based key/nonce derivation
//! - `aead`  — ChaCha20-Poly1305 seal/open, 96-bit nonces
//! - `hash`  — BLAKE3 hashing for certificate fingerprints
//! - `error` — unified error type

pub mod aead;
pub mod error;
pub mod hash;
pub mod kdf;
pub mod keys;

pub use error::CryptoError;
