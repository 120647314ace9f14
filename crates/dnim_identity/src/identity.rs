use chrono::{DateTime, Utc};

use crate::fingerprint::Fingerprint;

/// `(certificate_der, fingerprint, display_name)`. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    certificate_der: Vec<u8>,
    fingerprint: Fingerprint,
    display_name: String,
}

impl Identity {
    pub fn from_certificate(certificate_der: Vec<u8>, display_name: String) -> Self {
        let fingerprint = Fingerprint::of_der(&certificate_der);
        Self { certificate_der, fingerprint, display_name }
    }

    pub fn certificate_der(&self) -> &[u8] {
        &self.certificate_der
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

/// `(fingerprint, display_name, pinned_at, last_seen_endpoint?)`.
///
/// `static_pub` is pinned alongside the fingerprint (§9 open question on
/// responder static key discovery): a later handshake presenting the same
/// fingerprint but a different static key is treated as a pin mismatch,
/// same as a fingerprint change at a known endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub fingerprint: Fingerprint,
    pub display_name: String,
    pub static_pub: [u8; 32],
    pub pinned_at: DateTime<Utc>,
    pub last_seen_endpoint: Option<std::net::SocketAddr>,
}

impl Contact {
    pub fn new_pin(
        fingerprint: Fingerprint,
        display_name: String,
        static_pub: [u8; 32],
        now: DateTime<Utc>,
    ) -> Self {
        Self { fingerprint, display_name, static_pub, pinned_at: now, last_seen_endpoint: None }
    }
}
