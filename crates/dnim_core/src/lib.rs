//! dnim_core — session state machines, handshake, record layer, and
//! message pipeline for the secure-channel transport (§3-§9).
//!
//! # Modules
//! - `session`           — `Session` / `SessionState` and replay bookkeeping
//! - `session_table`      — CID-indexed table of live sessions
//! - `cid_allocator`      — CID allocation with a retirement cool-down list
//! - `nonce_window`       — bounded AEAD-nonce replay window
//! - `uuid_set`           — bounded application-message duplicate set
//! - `handshake`          — the two-message IK-style handshake
//! - `record_layer`       — per-session seal/open
//! - `message_pipeline`   — send/deliver/ack and resume-queue draining
//! - `persistence`        — message log, session cache, replay set traits
//! - `events`             — UI-facing `NodeEvent`
//! - `config`             — typed, validated startup configuration
//! - `error`              — unified `CoreError`

pub mod cid_allocator;
pub mod config;
pub mod error;
pub mod events;
pub mod handshake;
pub mod message_pipeline;
pub mod nonce_window;
pub mod persistence;
pub mod record_layer;
pub mod session;
pub mod session_table;
pub mod uuid_set;

pub use config::CoreConfig;
pub use error::CoreError;
pub use events::NodeEvent;
pub use handshake::HandshakeEngine;
pub use session::{Role, Session, SessionState};
pub use session_table::SessionTable;
