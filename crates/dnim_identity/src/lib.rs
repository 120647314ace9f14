//! dnim_identity — certificate-based identity binding and TOFU pinning.
//!
//! # Modules
//! - `identity`      — `Identity` and `Contact` data types
//! - `fingerprint`    — the 256-bit certificate fingerprint
//! - `verify`         — DER parsing and national-root signature chain check
//! - `tofu`           — trust-on-first-use pinning decision
//! - `card`           — the smartcard capability trait
//! - `contact_store`  — the contacts slice of the persistence interface
//! - `error`          — unified error type

pub mod card;
pub mod contact_store;
pub mod error;
pub mod fingerprint;
pub mod identity;
pub mod tofu;
pub mod verify;

pub use card::Card;
pub use contact_store::ContactStore;
pub use error::IdentityError;
pub use fingerprint::Fingerprint;
pub use identity::{Contact, Identity};
pub use tofu::{evaluate_tofu, TofuOutcome};
pub use verify::{parse_and_verify, TrustAnchors};
