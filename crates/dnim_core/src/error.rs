use std::net::SocketAddr;

use thiserror::Error;

use dnim_identity::Fingerprint;

/// The error kinds from §7, each carrying the context needed to log and
/// surface it.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("malformed packet: {0}")]
    MalformedPacket(#[from] dnim_proto::CodecError),

    #[error("authentication failed")]
    AuthFailure,

    #[error("certificate issuer is not trusted")]
    UntrustedIssuer,

    #[error("pin mismatch for {endpoint}: previously pinned {previously_pinned}")]
    PinMismatch { endpoint: SocketAddr, previously_pinned: Fingerprint },

    #[error("cryptographic operation failed: {0}")]
    CryptoFailure(#[from] dnim_crypto::CryptoError),

    #[error("card is unavailable")]
    CardUnavailable,

    #[error("transport error: {0}")]
    TransportError(String),

    #[error("duplicate message")]
    DuplicateMessage,

    #[error("unknown session for cid {cid:#010x}")]
    UnknownSession { cid: u32 },

    #[error("identity error: {0}")]
    Identity(#[from] dnim_identity::IdentityError),

    #[error("invalid configuration: {0}")]
    Configuration(String),
}
