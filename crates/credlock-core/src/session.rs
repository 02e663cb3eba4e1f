//! A caller-owned session over one environment's key and store.
//!
//! The session holds the resolved key and caches the decrypted document for
//! its own lifetime, so nothing about the current environment lives in
//! process-wide state. Each CLI invocation builds one session, uses it, and
//! drops it.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::codec;
use crate::error::Result;
use crate::key;

/// Path of the encrypted store for an environment.
pub fn store_path(dir: &Path, environment: &str) -> PathBuf {
    dir.join(format!("{}.yml.enc", environment))
}

/// Check that a document still parses as YAML before it is sealed.
pub fn validate_document(plaintext: &[u8]) -> Result<()> {
    let _: serde_yaml::Value = serde_yaml::from_slice(plaintext)?;
    Ok(())
}

#[derive(Debug)]
pub struct CredentialsSession {
    dir: PathBuf,
    environment: String,
    key: Vec<u8>,
    decrypted: Option<Vec<u8>>,
}

impl CredentialsSession {
    /// Build a session from an already-resolved key.
    pub fn new(dir: &Path, environment: &str, key: Vec<u8>) -> Self {
        Self {
            dir: dir.to_path_buf(),
            environment: environment.to_string(),
            key,
            decrypted: None,
        }
    }

    /// Resolve the key (override variable first, then `<env>.key`) and open
    /// a session on it.
    pub fn open(dir: &Path, environment: &str) -> Result<Self> {
        let key = key::load(dir, environment, Some(key::KEY_ENV_VAR))?;
        Ok(Self::new(dir, environment, key))
    }

    /// Generate and persist a fresh key, then seal an empty document as the
    /// initial store. Overwrites both files; callers guard a live key.
    pub fn init(dir: &Path, environment: &str) -> Result<Self> {
        let fresh = key::generate()?;
        key::persist(&fresh, dir, environment)?;

        let empty = serde_yaml::to_string(&serde_yaml::Mapping::new())?;
        let mut session = Self::new(dir, environment, fresh);
        session.save(empty.as_bytes())?;
        Ok(session)
    }

    /// Decrypt the store, caching the plaintext for the life of the session.
    pub fn decrypt(&mut self) -> Result<&[u8]> {
        if self.decrypted.is_none() {
            let raw = fs::read(self.store_path())?;
            let plaintext = codec::open_native(&raw, &self.key)?;
            debug!("decrypted {} byte credentials document", plaintext.len());
            self.decrypted = Some(plaintext);
        }
        Ok(self.decrypted.as_deref().unwrap_or(&[]))
    }

    /// Look up a value by dotted key, e.g. `database.password`. Non-string
    /// scalars are rendered through the YAML printer.
    pub fn get(&mut self, dotted: &str) -> Result<Option<String>> {
        let document: serde_yaml::Value = serde_yaml::from_slice(self.decrypt()?)?;

        let mut node = &document;
        for segment in dotted.split('.') {
            match node.get(segment) {
                Some(child) => node = child,
                None => return Ok(None),
            }
        }
        render(node).map(Some)
    }

    /// Seal `plaintext` and write the store file, refreshing the cache.
    pub fn save(&mut self, plaintext: &[u8]) -> Result<()> {
        let sealed = codec::seal_native(plaintext, &self.key)?;
        fs::write(self.store_path(), sealed)?;
        self.decrypted = Some(plaintext.to_vec());
        Ok(())
    }

    /// Read a legacy-format store and re-seal it natively. The legacy
    /// envelope is never written back; migration is one-way.
    pub fn import_legacy(&mut self, legacy_text: &str, master_key: &[u8]) -> Result<()> {
        let plaintext = codec::open_legacy(legacy_text, master_key)?;
        debug!("migrating legacy credentials store to the native format");
        self.save(&plaintext)
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    fn store_path(&self) -> PathBuf {
        store_path(&self.dir, &self.environment)
    }
}

fn render(value: &serde_yaml::Value) -> Result<String> {
    match value {
        serde_yaml::Value::String(s) => Ok(s.clone()),
        other => Ok(serde_yaml::to_string(other)?.trim_end().to_string()),
    }
}
