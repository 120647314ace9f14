use async_trait::async_trait;

use crate::error::IdentityError;

/// The smartcard access layer. The core never holds the PIN; it invokes
/// the card through a capability handed to it at startup.
#[async_trait]
pub trait Card: Send + Sync {
    /// The local DER-encoded certificate. May be cached by the caller for
    /// the session lifetime of the card.
    async fn get_certificate(&self) -> Result<Vec<u8>, IdentityError>;

    /// Sign a transcript hash with the card's private key.
    async fn sign(&self, bytes: &[u8]) -> Result<Vec<u8>, IdentityError>;
}
