//! Session state machine (§3) and the per-session replay/failure bookkeeping
//! that backs the record layer.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use uuid::Uuid;

use dnim_identity::Identity;

use crate::nonce_window::NonceWindow;
use crate::uuid_set::SeenMessageIds;

/// An application message awaiting acknowledgement.
#[derive(Debug, Clone)]
pub struct PendingMessage {
    pub uuid: Uuid,
    pub text: String,
    pub queued_at: Instant,
    pub last_sent_at: Instant,
}

const FAILURE_WINDOW: Duration = Duration::from_secs(60);
const FAILURE_THRESHOLD: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Initiator,
    Responder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Handshaking,
    Established,
    Suspended,
    Closed,
}

/// A timestamped ring of recent AEAD failures. Old failures age out of the
/// trailing window rather than being held by a fixed counter that never
/// resets, so a handful of failures spread over an hour doesn't trip a
/// threshold meant to catch a burst.
#[derive(Debug, Default)]
struct FailureRing {
    timestamps: VecDeque<Instant>,
}

impl FailureRing {
    fn record(&mut self, now: Instant) -> bool {
        self.timestamps.push_back(now);
        while let Some(&front) = self.timestamps.front() {
            if now.duration_since(front) > FAILURE_WINDOW {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
        self.timestamps.len() >= FAILURE_THRESHOLD
    }
}

pub struct Session {
    pub cid: u32,
    pub role: Role,
    pub peer_endpoint: SocketAddr,
    pub peer_identity: Option<Identity>,
    pub session_key: Option<[u8; 32]>,
    pub state: SessionState,
    pub created_at: Instant,
    pub last_activity_at: Instant,
    pub pending_outbound: VecDeque<PendingMessage>,
    nonce_window: NonceWindow,
    seen_message_ids: SeenMessageIds,
    failures: FailureRing,
}

impl Session {
    pub fn new(cid: u32, role: Role, peer_endpoint: SocketAddr) -> Self {
        let now = Instant::now();
        Self {
            cid,
            role,
            peer_endpoint,
            peer_identity: None,
            session_key: None,
            state: SessionState::Handshaking,
            created_at: now,
            last_activity_at: now,
            pending_outbound: VecDeque::new(),
            nonce_window: NonceWindow::new(),
            seen_message_ids: SeenMessageIds::new(),
            failures: FailureRing::default(),
        }
    }

    pub fn touch(&mut self) {
        self.last_activity_at = Instant::now();
    }

    pub fn establish(&mut self, identity: Identity, session_key: [u8; 32]) {
        self.peer_identity = Some(identity);
        self.session_key = Some(session_key);
        self.state = SessionState::Established;
        self.touch();
    }

    pub fn suspend(&mut self) {
        if self.state == SessionState::Established {
            self.state = SessionState::Suspended;
        }
    }

    pub fn resume(&mut self) {
        if self.state == SessionState::Suspended {
            self.state = SessionState::Established;
            self.touch();
        }
    }

    pub fn close(&mut self) {
        self.state = SessionState::Closed;
        self.session_key = None;
        self.pending_outbound.clear();
    }

    pub fn enqueue_outbound(&mut self, uuid: Uuid, text: String) {
        let now = Instant::now();
        self.pending_outbound.push_back(PendingMessage { uuid, text, queued_at: now, last_sent_at: now });
    }

    /// Pending messages not (re)sent within `interval`, marking each as
    /// sent now. Used by the maintenance loop's retry sweep (§4.6).
    pub fn take_due_retries(&mut self, interval: Duration) -> Vec<(Uuid, String)> {
        let now = Instant::now();
        let mut due = Vec::new();
        for m in self.pending_outbound.iter_mut() {
            if now.duration_since(m.last_sent_at) >= interval {
                m.last_sent_at = now;
                due.push((m.uuid, m.text.clone()));
            }
        }
        due
    }

    /// Removes the pending message matching `uuid` (its ACK arrived),
    /// returning `true` if one was found.
    pub fn acknowledge(&mut self, uuid: Uuid) -> bool {
        let before = self.pending_outbound.len();
        self.pending_outbound.retain(|m| m.uuid != uuid);
        self.pending_outbound.len() != before
    }

    pub fn is_idle_since(&self, idle_suspend: Duration) -> bool {
        self.state == SessionState::Established
            && self.last_activity_at.elapsed() >= idle_suspend
    }

    /// Returns `true` if `nonce` is a replay of one already accepted on this
    /// session.
    pub fn check_replay(&mut self, nonce: [u8; 12]) -> bool {
        self.nonce_window.check_and_insert(nonce)
    }

    /// Returns `true` if this message UUID has already been delivered on
    /// this session.
    pub fn check_duplicate_message(&mut self, id: uuid::Uuid) -> bool {
        self.seen_message_ids.check_and_insert(id)
    }

    /// Records an AEAD open failure; returns `true` once the trailing-window
    /// threshold is reached and the session should be closed.
    pub fn record_aead_failure(&mut self) -> bool {
        self.failures.record(Instant::now())
    }
}
