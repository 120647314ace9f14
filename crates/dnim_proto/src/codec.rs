//! Binary framing: `type:u8 | cid:u32 (big-endian) | payload`.
//!
//! Every length field is bounds-checked against the remaining datagram
//! before any slice is taken; a short, oversized, or unknown-type datagram
//! fails with [`CodecError`] rather than panicking.

use crate::error::CodecError;
use crate::packet::{Packet, PacketType};

const HEADER_LEN: usize = 5; // type:u8 + cid:u32

pub fn encode(packet: &Packet) -> Vec<u8> {
    let mut out = Vec::new();
    out.push(packet.packet_type().as_byte());
    out.extend_from_slice(&packet.cid().to_be_bytes());

    match packet {
        Packet::HandshakeInit { ephemeral_pub, sealed_cert_blob, .. }
        | Packet::HandshakeResp { ephemeral_pub, sealed_cert_blob, .. } => {
            out.extend_from_slice(ephemeral_pub);
            out.extend_from_slice(sealed_cert_blob);
        }
        Packet::Msg { nonce, ciphertext, .. } | Packet::Ack { nonce, ciphertext, .. } => {
            out.extend_from_slice(nonce);
            out.extend_from_slice(ciphertext);
        }
        Packet::ReconnectReq { .. }
        | Packet::ReconnectResp { .. }
        | Packet::PendingSend { .. }
        | Packet::PendingDone { .. } => {}
    }
    out
}

pub fn decode(datagram: &[u8]) -> Result<Packet, CodecError> {
    if datagram.len() < HEADER_LEN {
        return Err(CodecError::Truncated);
    }
    let type_byte = datagram[0];
    let cid = u32::from_be_bytes([datagram[1], datagram[2], datagram[3], datagram[4]]);
    let payload = &datagram[HEADER_LEN..];
    let ty = PacketType::from_byte(type_byte).ok_or(CodecError::UnknownType(type_byte))?;

    Ok(match ty {
        PacketType::HandshakeInit | PacketType::HandshakeResp => {
            if payload.len() < 32 {
                return Err(CodecError::LengthOverflow);
            }
            let mut ephemeral_pub = [0u8; 32];
            ephemeral_pub.copy_from_slice(&payload[..32]);
            let sealed_cert_blob = payload[32..].to_vec();
            if matches!(ty, PacketType::HandshakeInit) {
                Packet::HandshakeInit { cid, ephemeral_pub, sealed_cert_blob }
            } else {
                Packet::HandshakeResp { cid, ephemeral_pub, sealed_cert_blob }
            }
        }
        PacketType::Msg | PacketType::Ack => {
            if payload.len() < 12 {
                return Err(CodecError::LengthOverflow);
            }
            let mut nonce = [0u8; 12];
            nonce.copy_from_slice(&payload[..12]);
            let ciphertext = payload[12..].to_vec();
            if matches!(ty, PacketType::Msg) {
                Packet::Msg { cid, nonce, ciphertext }
            } else {
                Packet::Ack { cid, nonce, ciphertext }
            }
        }
        PacketType::ReconnectReq => {
            check_empty(payload)?;
            Packet::ReconnectReq { cid }
        }
        PacketType::ReconnectResp => {
            check_empty(payload)?;
            Packet::ReconnectResp { cid }
        }
        PacketType::PendingSend => {
            check_empty(payload)?;
            Packet::PendingSend { cid }
        }
        PacketType::PendingDone => {
            check_empty(payload)?;
            Packet::PendingDone { cid }
        }
    })
}

fn check_empty(payload: &[u8]) -> Result<(), CodecError> {
    if payload.is_empty() {
        Ok(())
    } else {
        Err(CodecError::TrailingBytes)
    }
}

/// `sealed_cert_blob` plaintext: `len(pub):u16 || x25519_pub[len] || len(cert):u16 || cert_der[len]`.
pub fn encode_cert_blob(static_pub: &[u8], cert_der: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + static_pub.len() + cert_der.len());
    out.extend_from_slice(&(static_pub.len() as u16).to_be_bytes());
    out.extend_from_slice(static_pub);
    out.extend_from_slice(&(cert_der.len() as u16).to_be_bytes());
    out.extend_from_slice(cert_der);
    out
}

pub fn decode_cert_blob(blob: &[u8]) -> Result<(Vec<u8>, Vec<u8>), CodecError> {
    if blob.len() < 2 {
        return Err(CodecError::Truncated);
    }
    let pub_len = u16::from_be_bytes([blob[0], blob[1]]) as usize;
    let rest = &blob[2..];
    if rest.len() < pub_len {
        return Err(CodecError::LengthOverflow);
    }
    let (static_pub, rest) = rest.split_at(pub_len);

    if rest.len() < 2 {
        return Err(CodecError::Truncated);
    }
    let cert_len = u16::from_be_bytes([rest[0], rest[1]]) as usize;
    let rest = &rest[2..];
    if rest.len() < cert_len {
        return Err(CodecError::LengthOverflow);
    }
    let (cert_der, trailing) = rest.split_at(cert_len);
    if !trailing.is_empty() {
        return Err(CodecError::TrailingBytes);
    }

    Ok((static_pub.to_vec(), cert_der.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_datagram() {
        assert_eq!(decode(&[0x01, 0, 0]), Err(CodecError::Truncated));
    }

    #[test]
    fn rejects_unknown_type() {
        let mut d = vec![0xFF, 0, 0, 0, 0];
        assert_eq!(decode(&d), Err(CodecError::UnknownType(0xFF)));
        d[0] = 0x09;
        assert_eq!(decode(&d), Err(CodecError::UnknownType(0x09)));
    }

    #[test]
    fn rejects_oversized_length_fields() {
        let mut d = vec![0x01, 0, 0, 0, 1];
        d.extend_from_slice(&[0u8; 10]); // shorter than 32-byte ephemeral_pub
        assert_eq!(decode(&d), Err(CodecError::LengthOverflow));
    }

    #[test]
    fn rejects_trailing_bytes_on_empty_payload() {
        let d = vec![0x05, 0, 0, 0, 1, 0xAA];
        assert_eq!(decode(&d), Err(CodecError::TrailingBytes));
    }

    #[test]
    fn handshake_init_round_trip() {
        let blob = encode_cert_blob(&[1u8; 32], &[2u8; 10]);
        let pkt = Packet::HandshakeInit {
            cid: 0xDEADBEEF,
            ephemeral_pub: [3u8; 32],
            sealed_cert_blob: blob,
        };
        let wire = encode(&pkt);
        // 5-byte header + 32-byte ephemeral pub + cert blob
        assert_eq!(wire.len(), 5 + 32 + (2 + 32 + 2 + 10));
        let decoded = decode(&wire).unwrap();
        assert_eq!(decoded, pkt);
    }

    #[test]
    fn msg_round_trip() {
        let pkt = Packet::Msg {
            cid: 42,
            nonce: [9u8; 12],
            ciphertext: vec![1, 2, 3, 4, 5],
        };
        let wire = encode(&pkt);
        assert_eq!(decode(&wire).unwrap(), pkt);
    }

    #[test]
    fn empty_payload_packets_round_trip() {
        for pkt in [
            Packet::ReconnectReq { cid: 1 },
            Packet::ReconnectResp { cid: 1 },
            Packet::PendingSend { cid: 1 },
            Packet::PendingDone { cid: 1 },
        ] {
            let wire = encode(&pkt);
            assert_eq!(wire.len(), 5);
            assert_eq!(decode(&wire).unwrap(), pkt);
        }
    }

    #[test]
    fn cert_blob_round_trip() {
        let blob = encode_cert_blob(b"static-pub-32-bytes-padding-123!", b"fake-der-cert");
        let (p, c) = decode_cert_blob(&blob).unwrap();
        assert_eq!(p, b"static-pub-32-bytes-padding-123!");
        assert_eq!(c, b"fake-der-cert");
    }

    #[test]
    fn cert_blob_rejects_overshooting_length() {
        let mut blob = vec![0u8, 100]; // claims 100-byte pubkey
        blob.extend_from_slice(&[1u8; 5]);
        assert_eq!(decode_cert_blob(&blob), Err(CodecError::LengthOverflow));
    }
}
