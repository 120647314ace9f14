//! Plaintext schema carried inside an AEAD-sealed MSG packet:
//! `uuid_ascii[36] || "|" || utf8_text`.

use uuid::Uuid;

use crate::error::CodecError;

pub fn encode_message_plaintext(id: Uuid, text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(36 + 1 + text.len());
    out.extend_from_slice(id.to_string().as_bytes());
    out.push(b'|');
    out.extend_from_slice(text.as_bytes());
    out
}

pub fn decode_message_plaintext(plaintext: &[u8]) -> Result<(Uuid, String), CodecError> {
    if plaintext.len() < 37 || plaintext[36] != b'|' {
        return Err(CodecError::Truncated);
    }
    let uuid_str =
        std::str::from_utf8(&plaintext[..36]).map_err(|_| CodecError::Truncated)?;
    let id = Uuid::parse_str(uuid_str).map_err(|_| CodecError::Truncated)?;
    let text = String::from_utf8(plaintext[37..].to_vec()).map_err(|_| CodecError::Truncated)?;
    Ok((id, text))
}

/// The ACK payload is the raw 16 UUID bytes, not the ASCII form.
pub fn encode_ack_plaintext(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

pub fn decode_ack_plaintext(plaintext: &[u8]) -> Result<Uuid, CodecError> {
    let bytes: [u8; 16] = plaintext.try_into().map_err(|_| CodecError::Truncated)?;
    Ok(Uuid::from_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_plaintext_round_trip() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let wire = encode_message_plaintext(id, "hola");
        let (decoded_id, decoded_text) = decode_message_plaintext(&wire).unwrap();
        assert_eq!(decoded_id, id);
        assert_eq!(decoded_text, "hola");
    }

    #[test]
    fn ack_plaintext_round_trip() {
        let id = Uuid::new_v4();
        let wire = encode_ack_plaintext(id);
        assert_eq!(wire.len(), 16);
        assert_eq!(decode_ack_plaintext(&wire).unwrap(), id);
    }

    #[test]
    fn rejects_missing_separator() {
        let bad = vec![b'x'; 36];
        assert!(decode_message_plaintext(&bad).is_err());
    }
}
