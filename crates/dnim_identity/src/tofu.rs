//! Trust-on-first-use pinning (§4.3).

use std::net::SocketAddr;

use chrono::{DateTime, Utc};

use crate::contact_store::ContactStore;
use crate::error::IdentityError;
use crate::fingerprint::Fingerprint;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TofuOutcome {
    /// Fingerprint was not previously known; it has now been pinned.
    NewPeer,
    /// Fingerprint and static key match the existing pin for this peer.
    Confirmed,
    /// Either this endpoint previously served a different fingerprint, or
    /// this fingerprint previously presented a different static key. The
    /// session must be closed and must never auto-retry.
    PinMismatch { previously_pinned: Fingerprint },
}

/// Apply the TOFU rule on handshake completion.
pub async fn evaluate_tofu(
    store: &dyn ContactStore,
    candidate: Fingerprint,
    candidate_static_pub: [u8; 32],
    display_name: &str,
    endpoint: SocketAddr,
    now: DateTime<Utc>,
) -> Result<TofuOutcome, IdentityError> {
    for contact in store.list().await? {
        if contact.last_seen_endpoint == Some(endpoint) && contact.fingerprint != candidate {
            return Ok(TofuOutcome::PinMismatch { previously_pinned: contact.fingerprint });
        }
    }

    match store.get(candidate).await? {
        None => {
            store.upsert(candidate, display_name, candidate_static_pub, now).await?;
            Ok(TofuOutcome::NewPeer)
        }
        Some(existing) if existing.static_pub != candidate_static_pub => {
            Ok(TofuOutcome::PinMismatch { previously_pinned: existing.fingerprint })
        }
        Some(_) => Ok(TofuOutcome::Confirmed),
    }
}
