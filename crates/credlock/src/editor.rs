//! Temp-file plus `$EDITOR` round trip for `credlock edit`.
//!
//! The decrypted document briefly exists in cleartext on disk, so the temp
//! file is created exclusively under a random name (mode 0600) and removed
//! on every exit path, including editor failure, by its drop guard.

use std::env;
use std::fs;
use std::io::Write;
use std::process::Command;

use anyhow::{bail, Context, Result};
use tempfile::Builder;
use tracing::debug;

/// Write `plaintext` to a private temp file, run the user's editor on it,
/// and return the edited bytes.
pub fn edit_document(plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut tmp = Builder::new()
        .prefix("credentials-")
        .suffix(".yml")
        .tempfile()
        .context("failed to create temporary file")?;

    tmp.write_all(plaintext)
        .context("failed to write temporary file")?;
    tmp.flush().context("failed to flush temporary file")?;

    let (program, args) = split_editor(
        &env::var("EDITOR").unwrap_or_else(|_| "vim".to_string()),
    );
    debug!("editing {} bytes with {}", plaintext.len(), program);

    let status = Command::new(&program)
        .args(&args)
        .arg(tmp.path())
        .status()
        .with_context(|| format!("failed to launch editor: {}", program))?;

    if !status.success() {
        bail!("editor exited with {}; aborting without saving", status);
    }

    fs::read(tmp.path()).context("failed to read edited file")
}

/// `$EDITOR` may carry arguments ("code --wait"); split on whitespace.
fn split_editor(raw: &str) -> (String, Vec<String>) {
    let mut parts = raw.split_whitespace().map(str::to_string);
    let program = parts.next().unwrap_or_else(|| "vim".to_string());
    (program, parts.collect())
}
