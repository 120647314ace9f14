use std::net::SocketAddr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::IdentityError;
use crate::identity::Contact;
use crate::fingerprint::Fingerprint;

/// The contacts slice of the persistence interface (§6).
#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn upsert(
        &self,
        fingerprint: Fingerprint,
        display_name: &str,
        static_pub: [u8; 32],
        first_seen: DateTime<Utc>,
    ) -> Result<(), IdentityError>;

    async fn get(&self, fingerprint: Fingerprint) -> Result<Option<Contact>, IdentityError>;

    async fn list(&self) -> Result<Vec<Contact>, IdentityError>;

    /// Records the endpoint a confirmed peer was just seen at, so a later
    /// handshake from the same endpoint presenting a different fingerprint
    /// is caught by the TOFU endpoint check (§4.3).
    async fn record_endpoint(
        &self,
        fingerprint: Fingerprint,
        endpoint: SocketAddr,
    ) -> Result<(), IdentityError>;
}
