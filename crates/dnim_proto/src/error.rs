use thiserror::Error;

/// Failures from the wire codec. All of these correspond to the
/// `MalformedPacket` error kind at the transport layer; callers that need
/// the distinction can match on the variant, but the datagram path treats
/// every one of them identically (drop, count in telemetry).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("datagram shorter than the minimum 5-byte header")]
    Truncated,

    #[error("unknown packet type byte {0:#04x}")]
    UnknownType(u8),

    #[error("length field overshoots the datagram")]
    LengthOverflow,

    #[error("trailing bytes after a fixed-size empty payload")]
    TrailingBytes,
}
