//! The eight packet types and their on-wire type bytes.

/// `type:u8` values from the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
    HandshakeInit = 0x01,
    Msg = 0x02,
    HandshakeResp = 0x03,
    Ack = 0x04,
    ReconnectReq = 0x05,
    ReconnectResp = 0x06,
    PendingSend = 0x07,
    PendingDone = 0x08,
}

impl PacketType {
    pub fn from_byte(b: u8) -> Option<Self> {
        Some(match b {
            0x01 => Self::HandshakeInit,
            0x02 => Self::Msg,
            0x03 => Self::HandshakeResp,
            0x04 => Self::Ack,
            0x05 => Self::ReconnectReq,
            0x06 => Self::ReconnectResp,
            0x07 => Self::PendingSend,
            0x08 => Self::PendingDone,
            _ => return None,
        })
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// A parsed packet, header (`cid`) plus payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    HandshakeInit {
        cid: u32,
        ephemeral_pub: [u8; 32],
        sealed_cert_blob: Vec<u8>,
    },
    HandshakeResp {
        cid: u32,
        ephemeral_pub: [u8; 32],
        sealed_cert_blob: Vec<u8>,
    },
    Msg {
        cid: u32,
        nonce: [u8; 12],
        ciphertext: Vec<u8>,
    },
    Ack {
        cid: u32,
        nonce: [u8; 12],
        ciphertext: Vec<u8>,
    },
    ReconnectReq {
        cid: u32,
    },
    ReconnectResp {
        cid: u32,
    },
    PendingSend {
        cid: u32,
    },
    PendingDone {
        cid: u32,
    },
}

impl Packet {
    pub fn cid(&self) -> u32 {
        match self {
            Packet::HandshakeInit { cid, .. }
            | Packet::HandshakeResp { cid, .. }
            | Packet::Msg { cid, .. }
            | Packet::Ack { cid, .. }
            | Packet::ReconnectReq { cid }
            | Packet::ReconnectResp { cid }
            | Packet::PendingSend { cid }
            | Packet::PendingDone { cid } => *cid,
        }
    }

    pub fn packet_type(&self) -> PacketType {
        match self {
            Packet::HandshakeInit { .. } => PacketType::HandshakeInit,
            Packet::HandshakeResp { .. } => PacketType::HandshakeResp,
            Packet::Msg { .. } => PacketType::Msg,
            Packet::Ack { .. } => PacketType::Ack,
            Packet::ReconnectReq { .. } => PacketType::ReconnectReq,
            Packet::ReconnectResp { .. } => PacketType::ReconnectResp,
            Packet::PendingSend { .. } => PacketType::PendingSend,
            Packet::PendingDone { .. } => PacketType::PendingDone,
        }
    }
}
