//! UI-facing events (§7), published on a broadcast channel by the
//! transport crate and consumed by the host program.

use uuid::Uuid;

use dnim_identity::Fingerprint;

#[derive(Debug, Clone)]
pub enum NodeEvent {
    NewPeer { fingerprint: Fingerprint, display_name: String },
    PeerConfirmed { fingerprint: Fingerprint },
    PinMismatch { fingerprint: Fingerprint },
    SessionClosed { cid: u32, reason: String },
    MessageDelivered { uuid: Uuid },
    MessageFailed { uuid: Uuid, reason: String },
}
