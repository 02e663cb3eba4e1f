//! Key generation, persistence, and loading.
//!
//! A key is 32 random bytes, stored as base64 text in `<environment>.key`
//! with owner-only permissions. An override environment variable, when set,
//! wins over the file and skips the filesystem entirely: base64 on the
//! native path, hex on the legacy path (the encoding Rails deployments use).

use std::env;
use std::fs::{self, File, Permissions};
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::OsRng;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::debug;

use crate::cipher::KEY_LEN;
use crate::error::{Error, Result};

/// Override variable consulted before `<environment>.key` (base64 value).
pub const KEY_ENV_VAR: &str = "CREDLOCK_KEY";

/// Override variable consulted before a legacy master key file (hex value).
pub const MASTER_KEY_ENV_VAR: &str = "RAILS_MASTER_KEY";

/// Path of the key file for an environment.
pub fn key_path(dir: &Path, environment: &str) -> PathBuf {
    dir.join(format!("{}.key", environment))
}

/// Generate a fresh 32-byte key from the OS random source.
pub fn generate() -> Result<Vec<u8>> {
    let mut key = vec![0u8; KEY_LEN];
    OsRng
        .try_fill_bytes(&mut key)
        .map_err(|e| Error::Entropy(e.to_string()))?;
    Ok(key)
}

/// Write base64(key) to `<environment>.key`, mode 0600. Overwrites.
pub fn persist(key: &[u8], dir: &Path, environment: &str) -> Result<()> {
    let path = key_path(dir, environment);
    let mut file = File::create(&path)?;
    file.write_all(STANDARD.encode(key).as_bytes())?;
    fs::set_permissions(&path, Permissions::from_mode(0o600))?;
    Ok(())
}

/// Load the key for `environment`.
///
/// If `override_var` names a set, non-empty environment variable, its value
/// is decoded directly and the filesystem is never touched. Otherwise the
/// key file is read, trimmed, and decoded.
///
/// # Errors
///
/// [`Error::KeyNotFound`] when neither source exists; [`Error::KeyFormat`]
/// on a decode failure or a decoded length other than 32 bytes.
pub fn load(dir: &Path, environment: &str, override_var: Option<&str>) -> Result<Vec<u8>> {
    if let Some(encoded) = read_override(override_var) {
        debug!("decryption key taken from override variable");
        return check_length(
            STANDARD
                .decode(encoded.trim())
                .map_err(|e| Error::KeyFormat(format!("invalid base64: {}", e)))?,
        );
    }

    let path = key_path(dir, environment);
    let encoded = match fs::read_to_string(&path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::KeyNotFound(environment.to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    debug!("decryption key loaded from {}", path.display());
    check_length(
        STANDARD
            .decode(encoded.trim())
            .map_err(|e| Error::KeyFormat(format!("invalid base64: {}", e)))?,
    )
}

/// Load a hex-encoded legacy master key from `path`, with the same override
/// precedence as [`load`].
pub fn load_master(path: &Path, override_var: Option<&str>) -> Result<Vec<u8>> {
    if let Some(encoded) = read_override(override_var) {
        debug!("master key taken from override variable");
        return check_length(
            hex::decode(encoded.trim()).map_err(|e| Error::KeyFormat(format!("invalid hex: {}", e)))?,
        );
    }

    let encoded = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::KeyNotFound(path.display().to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    debug!("master key loaded from {}", path.display());
    check_length(
        hex::decode(encoded.trim()).map_err(|e| Error::KeyFormat(format!("invalid hex: {}", e)))?,
    )
}

fn read_override(override_var: Option<&str>) -> Option<String> {
    let var = override_var?;
    match env::var(var) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}

fn check_length(key: Vec<u8>) -> Result<Vec<u8>> {
    if key.len() != KEY_LEN {
        return Err(Error::KeyFormat(format!(
            "expected {} bytes after decoding, got {}",
            KEY_LEN,
            key.len()
        )));
    }
    Ok(key)
}
