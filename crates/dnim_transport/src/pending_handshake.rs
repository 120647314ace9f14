//! Bookkeeping for in-flight initiator-side handshakes awaiting a
//! HANDSHAKE_RESP, and the responder-side cache of the last HANDSHAKE_RESP
//! sent per CID so a retransmitted HANDSHAKE_INIT gets the idempotent
//! reply described in §4.7 instead of a freshly re-derived one.

use std::net::SocketAddr;
use std::time::Instant;

use dnim_proto::Packet;

pub const MAX_HANDSHAKE_ATTEMPTS: u32 = 3;

pub struct PendingHandshake {
    pub responder_endpoint: SocketAddr,
    pub responder_static_pub: [u8; 32],
    pub init_packet: Packet,
    pub attempts: u32,
    pub last_sent: Instant,
}

impl PendingHandshake {
    pub fn new(
        responder_endpoint: SocketAddr,
        responder_static_pub: [u8; 32],
        init_packet: Packet,
    ) -> Self {
        Self {
            responder_endpoint,
            responder_static_pub,
            init_packet,
            attempts: 1,
            last_sent: Instant::now(),
        }
    }

    /// Exponential backoff doubling from the base handshake timeout.
    pub fn backoff(&self, base: std::time::Duration) -> std::time::Duration {
        base * 2u32.saturating_pow(self.attempts.saturating_sub(1))
    }

    pub fn is_due(&self, base: std::time::Duration) -> bool {
        self.last_sent.elapsed() >= self.backoff(base)
    }

    pub fn exhausted(&self) -> bool {
        self.attempts >= MAX_HANDSHAKE_ATTEMPTS
    }
}
