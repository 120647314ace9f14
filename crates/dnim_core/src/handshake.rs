//! The two-message IK-style handshake (§4.4).

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand_core::RngCore;
use tracing::{debug, warn};

use dnim_crypto::keys::{public_key_from_bytes, EphemeralKeyPair, StaticKeyPair};
use dnim_crypto::{aead, kdf};
use dnim_identity::{
    evaluate_tofu, parse_and_verify, Card, ContactStore, Identity, TofuOutcome, TrustAnchors,
};
use dnim_proto::codec::{decode_cert_blob, encode_cert_blob};
use dnim_proto::Packet;

use crate::error::CoreError;
use crate::events::NodeEvent;
use crate::session::{Role, Session};
use crate::session_table::SessionTable;

pub struct HandshakeEngine {
    static_keypair: Arc<StaticKeyPair>,
    trust_anchors: Arc<TrustAnchors>,
    card: Arc<dyn Card>,
    contacts: Arc<dyn ContactStore>,
    sessions: SessionTable,
}

impl HandshakeEngine {
    pub fn new(
        static_keypair: Arc<StaticKeyPair>,
        trust_anchors: Arc<TrustAnchors>,
        card: Arc<dyn Card>,
        contacts: Arc<dyn ContactStore>,
        sessions: SessionTable,
    ) -> Self {
        Self { static_keypair, trust_anchors, card, contacts, sessions }
    }

    /// Initiator, steps 1-6 of §4.4. Returns the HANDSHAKE_INIT packet to
    /// send and the freshly created Session (Handshaking, session key
    /// already derived).
    pub async fn initiate<R: RngCore>(
        &self,
        rng: &mut R,
        responder_endpoint: SocketAddr,
        responder_static_pub: [u8; 32],
    ) -> Result<(Packet, Arc<Mutex<Session>>), CoreError> {
        let ephemeral = EphemeralKeyPair::generate();
        let ephemeral_pub = ephemeral.public_bytes();

        let responder_pub = public_key_from_bytes(&responder_static_pub)?;
        let shared_secret = ephemeral.dh(&responder_pub)?;
        let session_key = kdf::derive_session_key(&shared_secret)?;

        let cert_der = self.card.get_certificate().await?;
        let cert_plain = encode_cert_blob(&self.static_keypair.public_bytes(), &cert_der);
        let nonce = kdf::handshake_nonce(&ephemeral_pub);
        let sealed = aead::aead_seal(&ephemeral_pub, &nonce, &cert_plain, b"")?;

        let session = self.sessions.create(rng, Role::Initiator, responder_endpoint);
        session.lock().session_key = Some(session_key);
        let cid = session.lock().cid;

        debug!(cid, %responder_endpoint, "handshake initiated");

        Ok((
            Packet::HandshakeInit { cid, ephemeral_pub, sealed_cert_blob: sealed },
            session,
        ))
    }

    /// Responder, steps 1-6 of §4.4. `packet` must be a `HandshakeInit`
    /// with a CID not already present in the table.
    pub async fn handle_init(
        &self,
        packet: Packet,
        from: SocketAddr,
        now: DateTime<Utc>,
    ) -> Result<(Packet, Arc<Mutex<Session>>, NodeEvent), CoreError> {
        let Packet::HandshakeInit { cid, ephemeral_pub: e_pub_init, sealed_cert_blob } = packet
        else {
            return Err(CoreError::AuthFailure);
        };

        let nonce = kdf::handshake_nonce(&e_pub_init);
        let cert_plain = aead::aead_open(&e_pub_init, &nonce, &sealed_cert_blob, b"").map_err(
            |e| {
                warn!(cid, %from, "handshake init failed to authenticate");
                CoreError::from(e)
            },
        )?;

        let (peer_static_pub_bytes, cert_der) = decode_cert_blob(&cert_plain)?;
        let peer_static_pub: [u8; 32] = peer_static_pub_bytes
            .as_slice()
            .try_into()
            .map_err(|_| CoreError::AuthFailure)?;

        let identity = parse_and_verify(&cert_der, &self.trust_anchors, now)
            .map_err(|e| {
                warn!(cid, %from, "untrusted issuer on handshake init");
                CoreError::from(e)
            })?;

        let e_pub_init_key = public_key_from_bytes(&e_pub_init)?;
        let shared_secret = self.static_keypair.dh(&e_pub_init_key)?;
        let session_key = kdf::derive_session_key(&shared_secret)?;

        let event = self.pin(&identity, peer_static_pub, from, now).await?;

        let mut session = Session::new(cid, Role::Responder, from);
        session.establish(identity, session_key);
        let session = self.sessions.insert_with_cid(cid, session);

        let ephemeral = EphemeralKeyPair::generate();
        let own_ephemeral_pub = ephemeral.public_bytes();
        let resp_cert_der = self.card.get_certificate().await?;
        let resp_cert_plain =
            encode_cert_blob(&self.static_keypair.public_bytes(), &resp_cert_der);
        let resp_nonce = kdf::handshake_nonce(&own_ephemeral_pub);
        let resp_sealed = aead::aead_seal(&own_ephemeral_pub, &resp_nonce, &resp_cert_plain, b"")?;

        debug!(cid, %from, "handshake completed, responder established");

        Ok((
            Packet::HandshakeResp {
                cid,
                ephemeral_pub: own_ephemeral_pub,
                sealed_cert_blob: resp_sealed,
            },
            session,
            event,
        ))
    }

    /// Initiator, on receipt of HANDSHAKE_RESP: decrypt, verify, pin, and
    /// promote the already-keyed Session to Established.
    pub async fn handle_resp(
        &self,
        session: &Arc<Mutex<Session>>,
        packet: Packet,
        from: SocketAddr,
        now: DateTime<Utc>,
    ) -> Result<NodeEvent, CoreError> {
        let Packet::HandshakeResp { ephemeral_pub, sealed_cert_blob, .. } = packet else {
            return Err(CoreError::AuthFailure);
        };

        let nonce = kdf::handshake_nonce(&ephemeral_pub);
        let cert_plain = aead::aead_open(&ephemeral_pub, &nonce, &sealed_cert_blob, b"")?;
        let (peer_static_pub_bytes, cert_der) = decode_cert_blob(&cert_plain)?;
        let peer_static_pub: [u8; 32] = peer_static_pub_bytes
            .as_slice()
            .try_into()
            .map_err(|_| CoreError::AuthFailure)?;

        let identity = parse_and_verify(&cert_der, &self.trust_anchors, now)?;

        let event = self.pin(&identity, peer_static_pub, from, now).await?;

        let session_key = {
            let guard = session.lock();
            guard.session_key.ok_or(CoreError::AuthFailure)?
        };
        session.lock().establish(identity, session_key);

        Ok(event)
    }

    async fn pin(
        &self,
        identity: &Identity,
        static_pub: [u8; 32],
        endpoint: SocketAddr,
        now: DateTime<Utc>,
    ) -> Result<NodeEvent, CoreError> {
        let outcome = evaluate_tofu(
            self.contacts.as_ref(),
            identity.fingerprint(),
            static_pub,
            identity.display_name(),
            endpoint,
            now,
        )
        .await?;

        match outcome {
            TofuOutcome::NewPeer => {
                self.contacts.record_endpoint(identity.fingerprint(), endpoint).await?;
                Ok(NodeEvent::NewPeer {
                    fingerprint: identity.fingerprint(),
                    display_name: identity.display_name().to_string(),
                })
            }
            TofuOutcome::Confirmed => {
                self.contacts.record_endpoint(identity.fingerprint(), endpoint).await?;
                Ok(NodeEvent::PeerConfirmed { fingerprint: identity.fingerprint() })
            }
            TofuOutcome::PinMismatch { previously_pinned } => {
                warn!(%previously_pinned, "pin mismatch on handshake");
                Err(CoreError::PinMismatch { endpoint, previously_pinned })
            }
        }
    }
}
