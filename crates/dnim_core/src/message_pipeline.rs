//! Application-level send/deliver (§4.6): UUIDs, ACK accounting, offline
//! queue drain bracketed by PENDING_SEND / PENDING_DONE.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use dnim_proto::message::{
    decode_ack_plaintext, decode_message_plaintext, encode_ack_plaintext,
    encode_message_plaintext,
};
use dnim_proto::Packet;

use crate::error::CoreError;
use crate::record_layer;
use crate::session::Session;

/// Outcome of decrypting and routing an inbound MSG packet.
pub struct Delivery {
    pub uuid: Uuid,
    pub text: String,
    /// The ACK packet the caller must send back to the peer.
    pub ack: Packet,
}

/// Send path: enqueue the message in the session's outbound queue and
/// build the MSG packet to transmit. The maintenance loop owns resending
/// anything still unacknowledged in `pending_outbound` past
/// `message_retry_seconds` (see `Node::retry_unacknowledged_messages`).
pub fn send(session: &mut Session, text: String) -> Result<(Packet, Uuid), CoreError> {
    let uuid = Uuid::new_v4();
    let plaintext = encode_message_plaintext(uuid, &text);
    let (nonce, ciphertext) = record_layer::seal(session, &plaintext)?;
    session.enqueue_outbound(uuid, text);
    debug!(cid = session.cid, %uuid, "message queued");
    Ok((Packet::Msg { cid: session.cid, nonce, ciphertext }, uuid))
}

/// Deliver path: decrypt an inbound MSG packet, reject duplicates by
/// application UUID, and build the ACK to send back.
pub fn deliver(session: &mut Session, packet: Packet) -> Result<Delivery, CoreError> {
    let Packet::Msg { cid, nonce, ciphertext } = packet else {
        return Err(CoreError::AuthFailure);
    };
    let plaintext = record_layer::open(session, nonce, &ciphertext)?;
    let (uuid, text) = decode_message_plaintext(&plaintext)?;

    if session.check_duplicate_message(uuid) {
        debug!(cid, %uuid, "dropped duplicate message delivery");
        return Err(CoreError::DuplicateMessage);
    }

    let ack_plain = encode_ack_plaintext(uuid);
    let (ack_nonce, ack_ciphertext) = record_layer::seal(session, &ack_plain)?;
    let ack = Packet::Ack { cid, nonce: ack_nonce, ciphertext: ack_ciphertext };

    Ok(Delivery { uuid, text, ack })
}

/// ACK-receipt path: decrypt an inbound ACK, match it against the
/// outbound queue. Returns the acknowledged UUID if it was pending.
pub fn handle_ack(session: &mut Session, packet: Packet) -> Result<Option<Uuid>, CoreError> {
    let Packet::Ack { nonce, ciphertext, .. } = packet else {
        return Err(CoreError::AuthFailure);
    };
    let plaintext = record_layer::open(session, nonce, &ciphertext)?;
    let uuid = decode_ack_plaintext(&plaintext)?;
    Ok(if session.acknowledge(uuid) { Some(uuid) } else { None })
}

/// Drains a session's pending outbound queue into MSG packets, bracketed
/// by PENDING_SEND / PENDING_DONE per §4.8. Returns the packets in order;
/// the caller sends PENDING_SEND first and PENDING_DONE last.
pub fn drain_resume_queue(
    session: &mut Session,
) -> Result<(Packet, Vec<Packet>, Packet), CoreError> {
    let cid = session.cid;
    let queued: Vec<(Uuid, String)> =
        session.pending_outbound.iter().map(|m| (m.uuid, m.text.clone())).collect();

    let mut packets = Vec::with_capacity(queued.len());
    for (uuid, text) in queued {
        let plaintext = encode_message_plaintext(uuid, &text);
        let (nonce, ciphertext) = record_layer::seal(session, &plaintext)?;
        packets.push(Packet::Msg { cid, nonce, ciphertext });
    }

    Ok((Packet::PendingSend { cid }, packets, Packet::PendingDone { cid }))
}

pub type SharedSession = Arc<Mutex<Session>>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Role;
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};

    fn addr() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 9000)
    }

    fn established_pair() -> (Session, Session) {
        let mut a = Session::new(1, Role::Initiator, addr());
        let mut b = Session::new(1, Role::Responder, addr());
        a.session_key = Some([5u8; 32]);
        b.session_key = Some([5u8; 32]);
        a.state = crate::session::SessionState::Established;
        b.state = crate::session::SessionState::Established;
        (a, b)
    }

    #[test]
    fn send_then_deliver_then_ack_clears_the_queue() {
        let (mut sender, mut receiver) = established_pair();
        let (msg_packet, uuid) = send(&mut sender, "hola".to_string()).unwrap();
        assert_eq!(sender.pending_outbound.len(), 1);

        let delivery = deliver(&mut receiver, msg_packet).unwrap();
        assert_eq!(delivery.text, "hola");
        assert_eq!(delivery.uuid, uuid);

        let acked = handle_ack(&mut sender, delivery.ack).unwrap();
        assert_eq!(acked, Some(delivery.uuid));
        assert!(sender.pending_outbound.is_empty());
    }

    #[test]
    fn redelivered_message_is_rejected_as_duplicate() {
        let (mut sender, mut receiver) = established_pair();
        let (msg_packet, _uuid) = send(&mut sender, "hola".to_string()).unwrap();
        let _ = deliver(&mut receiver, msg_packet.clone()).unwrap();
        assert!(matches!(
            deliver(&mut receiver, msg_packet),
            Err(CoreError::DuplicateMessage)
        ));
    }

    #[test]
    fn drain_resume_queue_brackets_with_pending_markers() {
        let (mut sender, _receiver) = established_pair();
        let _ = send(&mut sender, "one".to_string()).unwrap();
        let _ = send(&mut sender, "two".to_string()).unwrap();

        let (start, middle, end) = drain_resume_queue(&mut sender).unwrap();
        assert!(matches!(start, Packet::PendingSend { .. }));
        assert_eq!(middle.len(), 2);
        assert!(matches!(end, Packet::PendingDone { .. }));
    }
}
