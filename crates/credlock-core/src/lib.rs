//! credlock-core - Encrypted per-environment credentials
//!
//! "One key, one document, one environment."
//!
//! A 256-bit key stored in `<env>.key` seals a small YAML document into
//! `<env>.yml.enc` using AES-256-GCM. The sealed layout is
//! `nonce || ciphertext || tag` in a single buffer. Stores produced by the
//! Rails credentials tooling (`base64(ct)--base64(iv)--base64(tag)` wrapping
//! a Ruby Marshal string) can be read as well, for one-way migration into
//! the native format.

pub mod cipher;
pub mod codec;
pub mod error;
pub mod key;
pub mod legacy;
pub mod marshal;
pub mod session;

pub use error::{Error, Result};
pub use session::CredentialsSession;
