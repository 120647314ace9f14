//! The host-facing node: assembles SessionTable, HandshakeEngine, and
//! Transport, routes inbound datagrams by type and CID (§4.7), and exposes
//! the narrow API a UI binary drives.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use rand_core::OsRng;
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, trace, warn};

use dnim_core::handshake::HandshakeEngine;
use dnim_core::persistence::{Direction, MessageLog, SessionCache};
use dnim_core::record_layer;
use dnim_core::session::{Session, SessionState};
use dnim_core::session_table::SessionTable;
use dnim_core::{message_pipeline, CoreConfig, CoreError, NodeEvent};
use dnim_crypto::keys::StaticKeyPair;
use dnim_identity::{Card, ContactStore, TrustAnchors};
use dnim_proto::message::encode_message_plaintext;
use dnim_proto::{codec, Packet};

use crate::pending_handshake::PendingHandshake;
use crate::transport::Transport;

const EVENT_CHANNEL_CAPACITY: usize = 256;
const DATAGRAM_BUF: usize = 65536;

pub struct Node {
    transport: Transport,
    sessions: SessionTable,
    handshake: HandshakeEngine,
    config: CoreConfig,
    event_tx: broadcast::Sender<NodeEvent>,
    pending_handshakes: Mutex<HashMap<u32, PendingHandshake>>,
    last_handshake_resp: Mutex<HashMap<u32, Packet>>,
    shutdown_tx: watch::Sender<bool>,
    message_log: Arc<dyn MessageLog>,
    session_cache: Arc<dyn SessionCache>,
}

impl Node {
    pub async fn bind(
        config: CoreConfig,
        static_keypair: Arc<StaticKeyPair>,
        trust_anchors: Arc<TrustAnchors>,
        card: Arc<dyn Card>,
        contacts: Arc<dyn ContactStore>,
        message_log: Arc<dyn MessageLog>,
        session_cache: Arc<dyn SessionCache>,
    ) -> anyhow::Result<Arc<Node>> {
        config.validate()?;
        let addr: SocketAddr = format!("{}:{}", config.listen_ip, config.udp_port).parse()?;
        let transport = Transport::bind(addr).await?;
        let sessions = SessionTable::new();
        let handshake =
            HandshakeEngine::new(static_keypair, trust_anchors, card, contacts, sessions.clone());
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let node = Arc::new(Node {
            transport,
            sessions,
            handshake,
            config,
            event_tx,
            pending_handshakes: Mutex::new(HashMap::new()),
            last_handshake_resp: Mutex::new(HashMap::new()),
            shutdown_tx,
            message_log,
            session_cache,
        });

        crate::scheduler::spawn_io_loop(node.clone(), shutdown_rx.clone());
        crate::scheduler::spawn_maintenance_loop(node.clone(), shutdown_rx);

        Ok(node)
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NodeEvent> {
        self.event_tx.subscribe()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// State of a session by CID, for callers that need to observe the
    /// state machine without holding a `Session` handle themselves.
    pub fn session_state(&self, cid: u32) -> Option<SessionState> {
        self.sessions.get(cid).ok().map(|s| s.lock().state)
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Initiator entry point (§4.4 "Initiator, on dial").
    pub async fn connect(
        &self,
        responder_endpoint: SocketAddr,
        responder_static_pub: [u8; 32],
    ) -> Result<u32, CoreError> {
        let mut rng = OsRng;
        let (packet, session) =
            self.handshake.initiate(&mut rng, responder_endpoint, responder_static_pub).await?;
        let cid = packet.cid();
        self.transport.send(responder_endpoint, &packet).await?;
        self.pending_handshakes.lock().insert(
            cid,
            PendingHandshake::new(responder_endpoint, responder_static_pub, packet),
        );
        drop(session);
        Ok(cid)
    }

    pub async fn send_message(&self, cid: u32, text: String) -> Result<(), CoreError> {
        let session_handle = self.sessions.get(cid)?;
        let (packet, to, uuid) = {
            let mut session = session_handle.lock();
            let to = session.peer_endpoint;
            let (packet, uuid) = message_pipeline::send(&mut session, text.clone())?;
            (packet, to, uuid)
        };
        self.message_log.append(cid, Direction::Outbound, uuid, &text, Utc::now(), false).await?;
        self.transport.send(to, &packet).await
    }

    /// The single read loop: decode and dispatch by packet type, per §4.7.
    pub(crate) async fn run_io_loop(self: &Arc<Self>) {
        let mut buf = vec![0u8; DATAGRAM_BUF];
        loop {
            let (len, from) = match self.transport.recv(&mut buf).await {
                Ok(v) => v,
                Err(e) => {
                    warn!(error = %e, "transport recv failed");
                    continue;
                }
            };
            let datagram = &buf[..len];
            match codec::decode(datagram) {
                Ok(packet) => self.dispatch(packet, from).await,
                Err(e) => trace!(%from, error = %e, "dropped malformed datagram"),
            }
        }
    }

    async fn dispatch(self: &Arc<Self>, packet: Packet, from: SocketAddr) {
        let result = match &packet {
            Packet::HandshakeInit { .. } => self.on_handshake_init(packet, from).await,
            Packet::HandshakeResp { .. } => self.on_handshake_resp(packet, from).await,
            Packet::Msg { .. } => self.on_msg(packet).await,
            Packet::Ack { .. } => self.on_ack(packet).await,
            Packet::ReconnectReq { cid } => self.on_reconnect_req(*cid, from).await,
            Packet::ReconnectResp { cid } => self.on_reconnect_resp(*cid).await,
            Packet::PendingSend { cid } => {
                debug!(cid, "pending queue drain starting");
                Ok(())
            }
            Packet::PendingDone { cid } => {
                debug!(cid, "pending queue drain finished");
                Ok(())
            }
        };
        if let Err(e) = result {
            trace!(%from, error = %e, "dropped packet per silence policy (§4.9)");
        }
    }

    async fn on_handshake_init(
        self: &Arc<Self>,
        packet: Packet,
        from: SocketAddr,
    ) -> Result<(), CoreError> {
        let cid = packet.cid();
        if self.sessions.get(cid).is_ok() {
            if let Some(cached) = self.last_handshake_resp.lock().get(&cid).cloned() {
                self.transport.send(from, &cached).await?;
            }
            return Ok(());
        }

        match self.handshake.handle_init(packet, from, Utc::now()).await {
            Ok((resp, _session, event)) => {
                self.last_handshake_resp.lock().insert(cid, resp.clone());
                self.transport.send(from, &resp).await?;
                let _ = self.event_tx.send(event);
                Ok(())
            }
            Err(CoreError::PinMismatch { endpoint, previously_pinned }) => {
                error!(%endpoint, %previously_pinned, "pin mismatch on handshake init");
                let _ = self.event_tx.send(NodeEvent::PinMismatch { fingerprint: previously_pinned });
                Err(CoreError::PinMismatch { endpoint, previously_pinned })
            }
            Err(e) => Err(e),
        }
    }

    async fn on_handshake_resp(
        self: &Arc<Self>,
        packet: Packet,
        from: SocketAddr,
    ) -> Result<(), CoreError> {
        let cid = packet.cid();
        self.pending_handshakes.lock().remove(&cid);
        let session = self.sessions.get(cid)?;
        {
            let guard = session.lock();
            if guard.state != SessionState::Handshaking {
                return Ok(());
            }
        }
        match self.handshake.handle_resp(&session, packet, from, Utc::now()).await {
            Ok(event) => {
                let _ = self.event_tx.send(event);
                Ok(())
            }
            Err(CoreError::PinMismatch { endpoint, previously_pinned }) => {
                error!(%endpoint, %previously_pinned, "pin mismatch on handshake response, closing session");
                session.lock().close();
                self.sessions.retire(cid);
                let _ = self.event_tx.send(NodeEvent::PinMismatch { fingerprint: previously_pinned });
                Err(CoreError::PinMismatch { endpoint, previously_pinned })
            }
            Err(e) => Err(e),
        }
    }

    async fn on_msg(self: &Arc<Self>, packet: Packet) -> Result<(), CoreError> {
        let cid = packet.cid();
        let session = self.sessions.get(cid)?;
        let (delivery_result, to) = {
            let mut guard = session.lock();
            if guard.state == SessionState::Suspended {
                guard.resume();
            }
            let to = guard.peer_endpoint;
            (message_pipeline::deliver(&mut guard, packet), to)
        };
        let delivery = delivery_result?;
        self.message_log
            .append(cid, Direction::Inbound, delivery.uuid, &delivery.text, Utc::now(), true)
            .await?;
        self.transport.send(to, &delivery.ack).await?;
        let _ = self.event_tx.send(NodeEvent::MessageDelivered { uuid: delivery.uuid });
        Ok(())
    }

    async fn on_ack(self: &Arc<Self>, packet: Packet) -> Result<(), CoreError> {
        let cid = packet.cid();
        let session = self.sessions.get(cid)?;
        let acked = {
            let mut guard = session.lock();
            message_pipeline::handle_ack(&mut guard, packet)?
        };
        if let Some(uuid) = acked {
            trace!(%uuid, "ack matched pending message");
            self.message_log.mark_delivered(uuid).await?;
        }
        Ok(())
    }

    /// If the session's in-memory key was cleared on suspend, reload it
    /// from the `SessionCache` it was saved to. Returns `None` if neither
    /// source has a key, or the cached entry's CID no longer matches.
    async fn load_cached_key_if_missing(
        &self,
        session: &Arc<Mutex<Session>>,
        cid: u32,
    ) -> Result<Option<[u8; 32]>, CoreError> {
        let (live_key, fingerprint) = {
            let guard = session.lock();
            (guard.session_key, guard.peer_identity.as_ref().map(|i| i.fingerprint()))
        };
        if live_key.is_some() {
            return Ok(live_key);
        }
        match fingerprint {
            Some(fp) => Ok(match self.session_cache.load(fp).await? {
                Some((cached_cid, cached_key)) if cached_cid == cid => Some(cached_key),
                _ => None,
            }),
            None => Ok(None),
        }
    }

    /// Resumes a session on RECONNECT_REQ per §4.8. If neither the
    /// in-memory session nor the `SessionCache` has a key for this CID, the
    /// peers fall back to a full handshake under a fresh CID, so this
    /// simply stays silent.
    async fn on_reconnect_req(
        self: &Arc<Self>,
        cid: u32,
        from: SocketAddr,
    ) -> Result<(), CoreError> {
        let session = self.sessions.get(cid)?;

        let Some(key) = self.load_cached_key_if_missing(&session, cid).await? else {
            debug!(cid, %from, "no cached session key for RECONNECT_REQ, full handshake required");
            return Ok(());
        };

        {
            let mut guard = session.lock();
            guard.session_key = Some(key);
            guard.resume();
            guard.peer_endpoint = from;
        }
        self.transport.send(from, &Packet::ReconnectResp { cid }).await?;

        let (start, middle, end) = {
            let mut guard = session.lock();
            message_pipeline::drain_resume_queue(&mut guard)?
        };
        self.transport.send(from, &start).await?;
        for packet in middle {
            self.transport.send(from, &packet).await?;
        }
        self.transport.send(from, &end).await?;
        Ok(())
    }

    async fn on_reconnect_resp(self: &Arc<Self>, cid: u32) -> Result<(), CoreError> {
        let session = self.sessions.get(cid)?;
        if let Some(key) = self.load_cached_key_if_missing(&session, cid).await? {
            session.lock().session_key = Some(key);
        }
        session.lock().resume();
        Ok(())
    }

    pub(crate) fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub(crate) fn sessions(&self) -> &SessionTable {
        &self.sessions
    }

    pub(crate) fn event_tx(&self) -> &broadcast::Sender<NodeEvent> {
        &self.event_tx
    }

    pub(crate) async fn retry_or_drop_handshakes(self: &Arc<Self>) {
        let base_timeout = self.config.handshake_timeout();
        let due: Vec<(u32, PendingHandshake)> = {
            let mut pending = self.pending_handshakes.lock();
            let due_cids: Vec<u32> = pending
                .iter()
                .filter(|(_, p)| p.is_due(base_timeout))
                .map(|(cid, _)| *cid)
                .collect();
            due_cids.into_iter().filter_map(|cid| pending.remove(&cid).map(|p| (cid, p))).collect()
        };

        for (cid, mut attempt) in due {
            if attempt.exhausted() {
                warn!(cid, "handshake timed out after retries, giving up");
                self.sessions.retire(cid);
                let _ = self.event_tx.send(NodeEvent::SessionClosed {
                    cid,
                    reason: "handshake timeout".to_string(),
                });
                continue;
            }
            attempt.attempts += 1;
            attempt.last_sent = std::time::Instant::now();
            if let Err(e) = self.transport.send(attempt.responder_endpoint, &attempt.init_packet).await {
                error!(cid, error = %e, "failed to retransmit handshake init");
            }
            self.pending_handshakes.lock().insert(cid, attempt);
        }
    }

    /// Suspends idle sessions and pushes their key out of working memory
    /// into the `SessionCache`, so resume genuinely depends on the
    /// persistence gateway rather than on the in-memory `Session` simply
    /// never having been evicted (§4.8).
    pub(crate) async fn suspend_idle_sessions(&self) {
        let idle_suspend = self.config.idle_suspend();
        for cid in self.sessions.all_cids() {
            let Ok(session) = self.sessions.get(cid) else { continue };
            let to_persist = {
                let mut guard = session.lock();
                if !guard.is_idle_since(idle_suspend) {
                    continue;
                }
                debug!(cid, "suspending idle session");
                guard.suspend();
                let fingerprint = guard.peer_identity.as_ref().map(|i| i.fingerprint());
                let key = guard.session_key.take();
                fingerprint.zip(key)
            };
            if let Some((fingerprint, key)) = to_persist {
                if let Err(e) = self.session_cache.save(fingerprint, cid, key, Utc::now()).await {
                    warn!(cid, error = %e, "failed to persist session key on suspend");
                }
            }
        }
    }

    /// Resends any `pending_outbound` entry not (re)sent within
    /// `message_retry_seconds` (§4.6). Only Established sessions hold a key
    /// to reseal with; a Suspended session's queue waits for resume instead.
    pub(crate) async fn retry_unacknowledged_messages(self: &Arc<Self>) {
        let interval = self.config.message_retry_interval();
        for cid in self.sessions.all_cids() {
            let Ok(session) = self.sessions.get(cid) else { continue };
            let (due, to) = {
                let mut guard = session.lock();
                if guard.state != SessionState::Established {
                    continue;
                }
                (guard.take_due_retries(interval), guard.peer_endpoint)
            };
            for (uuid, text) in due {
                let sealed = {
                    let guard = session.lock();
                    let plaintext = encode_message_plaintext(uuid, &text);
                    record_layer::seal(&guard, &plaintext)
                };
                let packet = match sealed {
                    Ok((nonce, ciphertext)) => Packet::Msg { cid, nonce, ciphertext },
                    Err(e) => {
                        warn!(cid, %uuid, error = %e, "failed to reseal message for retry");
                        continue;
                    }
                };
                debug!(cid, %uuid, "retrying unacknowledged message");
                if let Err(e) = self.transport.send(to, &packet).await {
                    warn!(cid, %uuid, error = %e, "failed to retransmit message");
                }
            }
        }
    }
}
