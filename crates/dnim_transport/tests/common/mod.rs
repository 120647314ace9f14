//! Shared test doubles and certificate helpers for the S1-S6 scenarios
//! (§8). A `RawPeer` drives the wire protocol directly so tests can craft
//! exact retransmits and byte-level tampering that a well-behaved `Node`
//! would never produce on its own.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand_core::OsRng;
use uuid::Uuid;

use dnim_core::error::CoreError;
use dnim_core::handshake::HandshakeEngine;
use dnim_core::persistence::{Direction, MessageLog, SessionCache, StoredMessage};
use dnim_core::session::Session;
use dnim_core::session_table::SessionTable;
use dnim_crypto::keys::StaticKeyPair;
use dnim_identity::{Card, Contact, ContactStore, Fingerprint, IdentityError, TrustAnchors};
use dnim_proto::{codec, Packet};

pub struct FakeCard {
    pub cert_der: Vec<u8>,
}

#[async_trait]
impl Card for FakeCard {
    async fn get_certificate(&self) -> Result<Vec<u8>, IdentityError> {
        Ok(self.cert_der.clone())
    }

    async fn sign(&self, _bytes: &[u8]) -> Result<Vec<u8>, IdentityError> {
        Ok(vec![])
    }
}

#[derive(Default)]
pub struct FakeContactStore(Mutex<HashMap<Fingerprint, Contact>>);

#[async_trait]
impl ContactStore for FakeContactStore {
    async fn upsert(
        &self,
        fingerprint: Fingerprint,
        display_name: &str,
        static_pub: [u8; 32],
        first_seen: DateTime<Utc>,
    ) -> Result<(), IdentityError> {
        self.0.lock().insert(
            fingerprint,
            Contact::new_pin(fingerprint, display_name.to_string(), static_pub, first_seen),
        );
        Ok(())
    }

    async fn get(&self, fingerprint: Fingerprint) -> Result<Option<Contact>, IdentityError> {
        Ok(self.0.lock().get(&fingerprint).cloned())
    }

    async fn list(&self) -> Result<Vec<Contact>, IdentityError> {
        Ok(self.0.lock().values().cloned().collect())
    }

    async fn record_endpoint(
        &self,
        fingerprint: Fingerprint,
        endpoint: SocketAddr,
    ) -> Result<(), IdentityError> {
        if let Some(contact) = self.0.lock().get_mut(&fingerprint) {
            contact.last_seen_endpoint = Some(endpoint);
        }
        Ok(())
    }
}

/// In-memory `MessageLog`, recording every append/mark-delivered call so a
/// test can assert on what the node actually persisted.
#[derive(Default)]
pub struct FakeMessageLog(Mutex<Vec<StoredMessage>>);

#[async_trait]
impl MessageLog for FakeMessageLog {
    async fn append(
        &self,
        session_cid: u32,
        direction: Direction,
        uuid: Uuid,
        text: &str,
        timestamp: DateTime<Utc>,
        delivered: bool,
    ) -> Result<(), CoreError> {
        self.0.lock().push(StoredMessage {
            session_cid,
            direction,
            uuid,
            text: text.to_string(),
            timestamp,
            delivered,
        });
        Ok(())
    }

    async fn mark_delivered(&self, uuid: Uuid) -> Result<(), CoreError> {
        if let Some(m) = self.0.lock().iter_mut().find(|m| m.uuid == uuid) {
            m.delivered = true;
        }
        Ok(())
    }

    async fn history(
        &self,
        _peer_fingerprint: Fingerprint,
        limit: usize,
    ) -> Result<Vec<StoredMessage>, CoreError> {
        Ok(self.0.lock().iter().rev().take(limit).cloned().collect())
    }
}

/// In-memory `SessionCache`, keyed by fingerprint like the real gateway.
#[derive(Default)]
pub struct FakeSessionCache(Mutex<HashMap<Fingerprint, (u32, [u8; 32])>>);

#[async_trait]
impl SessionCache for FakeSessionCache {
    async fn save(
        &self,
        peer_fingerprint: Fingerprint,
        cid: u32,
        session_key: [u8; 32],
        _updated_at: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        self.0.lock().insert(peer_fingerprint, (cid, session_key));
        Ok(())
    }

    async fn load(
        &self,
        peer_fingerprint: Fingerprint,
    ) -> Result<Option<(u32, [u8; 32])>, CoreError> {
        Ok(self.0.lock().get(&peer_fingerprint).copied())
    }

    async fn forget(&self, peer_fingerprint: Fingerprint) -> Result<(), CoreError> {
        self.0.lock().remove(&peer_fingerprint);
        Ok(())
    }
}

/// One national root, shared by every peer in a test so certificates
/// verify against a common trust anchor.
pub fn generate_root() -> rcgen::Certificate {
    let mut params = rcgen::CertificateParams::new(vec![]);
    params.is_ca = rcgen::IsCa::Ca(rcgen::BasicConstraints::Unconstrained);
    params.distinguished_name.push(rcgen::DnType::CommonName, "Test National Root");
    rcgen::Certificate::from_params(params).unwrap()
}

pub fn issue_leaf(root: &rcgen::Certificate, common_name: &str) -> Vec<u8> {
    let mut params = rcgen::CertificateParams::new(vec![]);
    params.distinguished_name.push(rcgen::DnType::CommonName, common_name);
    let leaf = rcgen::Certificate::from_params(params).unwrap();
    leaf.serialize_der_with_signer(root).unwrap()
}

/// A peer that speaks the wire protocol directly instead of through a
/// `Node`, so a test can capture and replay exact datagrams.
pub struct RawPeer {
    socket: tokio::net::UdpSocket,
    pub handshake: HandshakeEngine,
}

impl RawPeer {
    pub async fn new(
        cert_der: Vec<u8>,
        static_keypair: Arc<StaticKeyPair>,
        trust_anchors: Arc<TrustAnchors>,
    ) -> Self {
        Self::new_bound("127.0.0.1:0".parse().unwrap(), cert_der, static_keypair, trust_anchors)
            .await
    }

    /// Binds to a specific local address instead of an ephemeral one, so a
    /// later peer can be made to present the same endpoint as an earlier
    /// one once it has been dropped (used by the pin-mismatch scenario).
    pub async fn new_bound(
        addr: SocketAddr,
        cert_der: Vec<u8>,
        static_keypair: Arc<StaticKeyPair>,
        trust_anchors: Arc<TrustAnchors>,
    ) -> Self {
        let socket = tokio::net::UdpSocket::bind(addr).await.unwrap();
        let sessions = SessionTable::new();
        let card = Arc::new(FakeCard { cert_der });
        let contacts = Arc::new(FakeContactStore::default());
        let handshake =
            HandshakeEngine::new(static_keypair, trust_anchors, card, contacts, sessions);
        Self { socket, handshake }
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.socket.local_addr().unwrap()
    }

    /// Drives the initiator side of §4.4 end to end, leaving the caller
    /// with the live `Session` (already Established) to build further
    /// MSG/ACK traffic from.
    pub async fn handshake_with(
        &self,
        peer: SocketAddr,
        peer_static_pub: [u8; 32],
    ) -> Arc<Mutex<Session>> {
        let mut rng = OsRng;
        let (init_packet, session) =
            self.handshake.initiate(&mut rng, peer, peer_static_pub).await.unwrap();
        self.send_packet(peer, &init_packet).await;
        let resp = self.recv_packet().await;
        self.handshake.handle_resp(&session, resp, peer, Utc::now()).await.unwrap();
        session
    }

    pub async fn send_packet(&self, to: SocketAddr, packet: &Packet) {
        let wire = codec::encode(packet);
        self.socket.send_to(&wire, to).await.unwrap();
    }

    pub async fn send_raw(&self, to: SocketAddr, bytes: &[u8]) {
        self.socket.send_to(bytes, to).await.unwrap();
    }

    pub async fn recv_packet(&self) -> Packet {
        let mut buf = vec![0u8; 65536];
        let (len, _from) = self.socket.recv_from(&mut buf).await.unwrap();
        codec::decode(&buf[..len]).unwrap()
    }

    pub async fn try_recv_packet(&self, wait: Duration) -> Option<Packet> {
        tokio::time::timeout(wait, self.recv_packet()).await.ok()
    }
}
