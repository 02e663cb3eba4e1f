//! Error taxonomy for the credentials codec.
//!
//! Every failure is a distinct kind so callers can tell "bad key" from
//! "corrupted file" from "unsupported legacy format" and advise accordingly.
//! Nothing in this crate panics on malformed input.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The OS random source failed while generating a key or nonce.
    #[error("system random source unavailable: {0}")]
    Entropy(String),

    /// Neither the override variable nor the key file yielded a key.
    #[error("no key found for '{0}'")]
    KeyNotFound(String),

    /// The key decoded to the wrong length, or was not valid base64/hex.
    #[error("malformed key: {0}")]
    KeyFormat(String),

    /// The envelope around the ciphertext is not structurally valid.
    #[error("malformed encrypted envelope: {0}")]
    EnvelopeFormat(String),

    /// The serialized legacy payload is structurally broken or truncated.
    #[error("malformed serialized payload: {0}")]
    ObjectFormat(String),

    /// The legacy payload encodes something other than a binary string.
    #[error("payload does not encode a binary string value (type byte 0x{0:02x})")]
    UnsupportedObject(u8),

    /// The legacy payload uses a string length encoding this codec rejects.
    #[error("unsupported string length encoding 0x{0:02x}")]
    UnsupportedLengthEncoding(u8),

    /// GCM tag verification failed: wrong key or tampered ciphertext.
    #[error("decryption failed: wrong key or corrupted data")]
    Authentication,

    /// The decrypted document no longer parses as YAML.
    #[error("document is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
