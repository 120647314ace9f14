//! The non-contact slices of the abstract persistence interface (§6):
//! message log, session-key cache, and replay set. Contacts live in
//! `dnim_identity::ContactStore` since identity pinning is self-contained.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use dnim_identity::Fingerprint;

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}

#[async_trait]
pub trait MessageLog: Send + Sync {
    async fn append(
        &self,
        session_cid: u32,
        direction: Direction,
        uuid: Uuid,
        text: &str,
        timestamp: DateTime<Utc>,
        delivered: bool,
    ) -> Result<(), CoreError>;

    async fn mark_delivered(&self, uuid: Uuid) -> Result<(), CoreError>;

    async fn history(
        &self,
        peer_fingerprint: Fingerprint,
        limit: usize,
    ) -> Result<Vec<StoredMessage>, CoreError>;
}

#[derive(Debug, Clone)]
pub struct StoredMessage {
    pub session_cid: u32,
    pub direction: Direction,
    pub uuid: Uuid,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub delivered: bool,
}

/// Keyed by `(peer_fingerprint, cid)` per §4.8.
#[async_trait]
pub trait SessionCache: Send + Sync {
    async fn save(
        &self,
        peer_fingerprint: Fingerprint,
        cid: u32,
        session_key: [u8; 32],
        updated_at: DateTime<Utc>,
    ) -> Result<(), CoreError>;

    async fn load(
        &self,
        peer_fingerprint: Fingerprint,
    ) -> Result<Option<(u32, [u8; 32])>, CoreError>;

    async fn forget(&self, peer_fingerprint: Fingerprint) -> Result<(), CoreError>;
}

/// May be in-memory only; durability is not required for correctness of
/// duplicate suppression within a single session lifetime (§6).
pub trait ReplaySet: Send + Sync {
    fn check_and_insert_uuid(&self, uuid: Uuid) -> bool;
}
