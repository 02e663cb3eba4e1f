//! The credentials codec: native seal/open plus read-only legacy opening.
//!
//! The two formats are intentionally asymmetric. Legacy stores are read for
//! migration only; every write is native. The native layout is a single
//! buffer, `nonce || ciphertext || tag`, with no serialization wrapper
//! around the document.

use crate::cipher::{self, NONCE_LEN, TAG_LEN};
use crate::error::{Error, Result};
use crate::{legacy, marshal};

/// Decrypt a legacy (Rails-format) store: split the text envelope, open the
/// AEAD over the recombined ciphertext+tag, then unwrap the Marshal payload.
pub fn open_legacy(text: &str, key: &[u8]) -> Result<Vec<u8>> {
    let envelope = legacy::split(text)?;
    let plaintext = cipher::open(&envelope.recombine(), &envelope.nonce, key)?;
    marshal::decode(&plaintext)
}

/// Decrypt a store sealed by [`seal_native`]: first [`NONCE_LEN`] bytes are
/// the nonce, the remainder is ciphertext+tag. No payload unwrapping.
pub fn open_native(raw: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    if raw.len() < NONCE_LEN + TAG_LEN {
        return Err(Error::EnvelopeFormat(format!(
            "store too short to hold nonce and tag: {} bytes",
            raw.len()
        )));
    }
    let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
    cipher::open(ciphertext, nonce, key)
}

/// Seal a document into the native single-buffer layout.
pub fn seal_native(plaintext: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    cipher::seal(plaintext, key)
}
