//! dnim_proto — wire framing for the transport core.
//!
//! # Modules
//! - `packet`  — the eight packet types and their type bytes
//! - `codec`   — binary encode/decode with bounds-checked length fields
//! - `message` — the plaintext schema carried inside MSG/ACK payloads
//! - `error`   — codec failure kind

pub mod codec;
pub mod error;
pub mod message;
pub mod packet;

pub use error::CodecError;
pub use packet::{Packet, PacketType};
