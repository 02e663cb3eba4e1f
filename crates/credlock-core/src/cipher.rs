//! AES-256-GCM sealing and opening of credential documents.
//!
//! Sealed output is `nonce || ciphertext || tag` in one buffer; a fresh
//! random 96-bit nonce is generated per call and never reused under a key.
//! Opening takes ciphertext and tag together, with the tag as the trailing
//! [`TAG_LEN`] bytes, because that is how the AEAD primitive consumes them.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};

use crate::error::{Error, Result};

/// Byte length of an AES-256 key.
pub const KEY_LEN: usize = 32;

/// Byte length of a GCM nonce.
pub const NONCE_LEN: usize = 12;

/// Byte length of the GCM authentication tag.
pub const TAG_LEN: usize = 16;

/// Encrypt `plaintext`, returning `nonce || ciphertext || tag`.
///
/// # Errors
///
/// Returns [`Error::KeyFormat`] if `key` is not [`KEY_LEN`] bytes and
/// [`Error::Entropy`] if the OS random source fails to produce a nonce.
pub fn seal(plaintext: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    let cipher = build_cipher(key)?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng
        .try_fill_bytes(&mut nonce_bytes)
        .map_err(|e| Error::Entropy(e.to_string()))?;
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| Error::EnvelopeFormat("plaintext too large to seal".to_string()))?;

    let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(&nonce_bytes);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Decrypt `ciphertext_and_tag` (tag trailing) under `nonce` and `key`.
///
/// # Errors
///
/// Returns [`Error::Authentication`] when the tag does not verify (wrong
/// key or tampered ciphertext) so callers can report that case distinctly.
pub fn open(ciphertext_and_tag: &[u8], nonce: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    let cipher = build_cipher(key)?;

    if nonce.len() != NONCE_LEN {
        return Err(Error::EnvelopeFormat(format!(
            "nonce must be {} bytes, got {}",
            NONCE_LEN,
            nonce.len()
        )));
    }
    if ciphertext_and_tag.len() < TAG_LEN {
        return Err(Error::EnvelopeFormat(format!(
            "ciphertext too short to carry a tag: {} bytes",
            ciphertext_and_tag.len()
        )));
    }

    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext_and_tag)
        .map_err(|_| Error::Authentication)
}

fn build_cipher(key: &[u8]) -> Result<Aes256Gcm> {
    if key.len() != KEY_LEN {
        return Err(Error::KeyFormat(format!(
            "expected a {}-byte key, got {}",
            KEY_LEN,
            key.len()
        )));
    }
    Aes256Gcm::new_from_slice(key)
        .map_err(|_| Error::KeyFormat("key rejected by cipher".to_string()))
}
