//! dnim_transport — the UDP demultiplexer, maintenance scheduler, and the
//! `Node` host API that assembles the full secure-channel core (§4.7, §5).
//!
//! # Modules
//! - `transport`         — the owned UDP socket
//! - `node`               — `Node`, the host-facing API and packet dispatch
//! - `scheduler`           — I/O and maintenance `tokio::spawn` loops
//! - `pending_handshake`   — initiator retry bookkeeping, responder idempotent-resp cache

pub mod node;
pub mod pending_handshake;
pub mod scheduler;
pub mod transport;

pub use dnim_core::NodeEvent;
pub use node::Node;
