//! Per-session seal/open with replay window and duplicate suppression
//! (§4.5). The Session's own mutex is the caller's responsibility; these
//! functions take an already-locked `&mut Session`.

use rand_core::{OsRng, RngCore};
use tracing::{trace, warn};

use dnim_crypto::aead;

use crate::error::CoreError;
use crate::session::Session;

/// Seal `plaintext` under the session's key with a fresh CSPRNG nonce,
/// returning `(nonce, ciphertext)` ready to frame into a MSG/ACK packet.
pub fn seal(session: &Session, plaintext: &[u8]) -> Result<([u8; 12], Vec<u8>), CoreError> {
    let key = session.session_key.ok_or(CoreError::AuthFailure)?;
    let mut nonce = [0u8; 12];
    OsRng.fill_bytes(&mut nonce);
    let ciphertext = aead::aead_seal(&key, &nonce, plaintext, b"")?;
    Ok((nonce, ciphertext))
}

/// Open an inbound MSG/ACK ciphertext. Per §4.5 the nonce is only ever
/// recorded into the replay window for a packet that actually decrypts: a
/// tampered packet that merely reuses a fresh nonce must not poison that
/// nonce against a later, genuine retransmission.
pub fn open(
    session: &mut Session,
    nonce: [u8; 12],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CoreError> {
    let key = session.session_key.ok_or(CoreError::AuthFailure)?;
    match aead::aead_open(&key, &nonce, ciphertext, b"") {
        Ok(plaintext) => {
            if session.check_replay(nonce) {
                trace!(cid = session.cid, "dropped replayed nonce");
                return Err(CoreError::DuplicateMessage);
            }
            session.touch();
            Ok(plaintext.to_vec())
        }
        Err(e) => {
            let tripped = session.record_aead_failure();
            if tripped {
                warn!(cid = session.cid, "closing session after repeated AEAD failures");
                session.close();
            }
            Err(CoreError::from(e))
        }
    }
}
