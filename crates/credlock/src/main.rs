//! credlock - Encrypted per-environment credentials
//!
//! "Commit the ciphertext, keep the key."
//!
//! Each environment gets a 256-bit key in `<env>.key` and an encrypted YAML
//! store in `<env>.yml.enc`. The store is safe to commit; the key is not.
//!
//! Commands:
//! - init: generate a key and create an empty encrypted store
//! - edit: decrypt to a temp file, open $EDITOR, re-encrypt on save
//! - show: print the decrypted document
//! - get <KEY>: look up one value by dotted key
//! - import <FILE>: migrate a Rails-format store into the native format

mod editor;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use credlock_core::{key, session, CredentialsSession};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "credlock")]
#[command(about = "Encrypted per-environment credentials - AES-256-GCM sealed YAML stores")]
#[command(version)]
#[command(after_help = r#"FILES:
    <env>.key        base64 decryption key (0600, never commit)
    <env>.yml.enc    encrypted YAML store (safe to commit)

KEYS:
    The CREDLOCK_KEY environment variable overrides <env>.key (base64).
    Rails imports read RAILS_MASTER_KEY or a hex master.key file."#)]
struct Cli {
    /// Directory holding the key and store files
    #[arg(long, global = true, default_value = ".")]
    dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a key and create an empty encrypted store
    Init {
        /// Environment name (e.g. development, production)
        #[arg(short, long)]
        environment: String,
    },

    /// Edit the decrypted document in $EDITOR, then re-encrypt
    Edit {
        /// Environment name
        #[arg(short, long)]
        environment: String,
    },

    /// Print the decrypted document
    Show {
        /// Environment name
        #[arg(short, long)]
        environment: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Look up a single value by dotted key
    Get {
        /// Environment name
        #[arg(short, long)]
        environment: String,

        /// Don't print a trailing newline (useful for piping)
        #[arg(short = 'n')]
        no_newline: bool,

        /// Dotted key path (e.g. database.password)
        key: String,
    },

    /// Migrate a Rails-format credentials file into the native store
    Import {
        /// Environment name for the migrated store
        #[arg(short, long)]
        environment: String,

        /// Hex master key file (defaults to master.key next to FILE;
        /// RAILS_MASTER_KEY overrides)
        #[arg(long)]
        key_file: Option<PathBuf>,

        /// Rails credentials file (e.g. credentials.yml.enc)
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let Cli { dir, command } = Cli::parse();

    match command {
        Commands::Init { environment } => cmd_init(&dir, &environment),
        Commands::Edit { environment } => cmd_edit(&dir, &environment),
        Commands::Show { environment, json } => cmd_show(&dir, &environment, json),
        Commands::Get {
            environment,
            no_newline,
            key,
        } => cmd_get(&dir, &environment, &key, no_newline),
        Commands::Import {
            environment,
            key_file,
            file,
        } => cmd_import(&dir, &environment, &file, key_file.as_deref()),
    }
}

/// Create a new environment: fresh key, empty store.
fn cmd_init(dir: &Path, environment: &str) -> Result<()> {
    let key_file = key::key_path(dir, environment);
    if key_file.exists() {
        bail!(
            "key file already exists: {} (refusing to overwrite a live key)",
            key_file.display()
        );
    }

    CredentialsSession::init(dir, environment)
        .with_context(|| format!("failed to initialize environment '{}'", environment))?;

    println!("success: Created {0}.key and {0}.yml.enc", environment);
    println!();
    println!("Keep {}.key out of version control.", environment);
    println!("Edit with: credlock edit -e {}", environment);
    Ok(())
}

/// Decrypt, edit in $EDITOR, re-encrypt.
fn cmd_edit(dir: &Path, environment: &str) -> Result<()> {
    let mut session = CredentialsSession::open(dir, environment)
        .context("failed to load decryption key")?;
    let plaintext = session
        .decrypt()
        .context("failed to decrypt credentials")?
        .to_vec();

    let edited = editor::edit_document(&plaintext)?;

    if edited == plaintext {
        println!("info: No changes");
        return Ok(());
    }

    session::validate_document(&edited)
        .context("edited document is not valid YAML; store left untouched")?;

    session
        .save(&edited)
        .context("failed to re-encrypt credentials")?;
    println!("success: Updated {}.yml.enc", environment);
    Ok(())
}

/// Print the decrypted document.
fn cmd_show(dir: &Path, environment: &str, json: bool) -> Result<()> {
    let mut session = CredentialsSession::open(dir, environment)?;
    let plaintext = session.decrypt().context("failed to decrypt credentials")?;
    let text = std::str::from_utf8(plaintext).context("document is not UTF-8")?;

    if json {
        let value: serde_json::Value =
            serde_yaml::from_str(text).context("document is not valid YAML")?;
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    print!("{}", text);
    if !text.ends_with('\n') {
        println!();
    }
    Ok(())
}

/// Look up one value by dotted key.
fn cmd_get(dir: &Path, environment: &str, key: &str, no_newline: bool) -> Result<()> {
    let mut session = CredentialsSession::open(dir, environment)?;

    match session.get(key)? {
        Some(value) => {
            if no_newline {
                print!("{}", value);
            } else {
                println!("{}", value);
            }
            Ok(())
        }
        None => bail!("no value for key: {}", key),
    }
}

/// Migrate a Rails-format credentials file to the native store.
fn cmd_import(
    dir: &Path,
    environment: &str,
    file: &Path,
    key_file: Option<&Path>,
) -> Result<()> {
    let legacy_text = fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    let master_path = match key_file {
        Some(path) => path.to_path_buf(),
        None => file
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("master.key"),
    };
    let master_key = key::load_master(&master_path, Some(key::MASTER_KEY_ENV_VAR))
        .context("failed to load master key")?;

    // The migrated store gets this environment's native key, generating one
    // on first import.
    let native_key = match key::load(dir, environment, Some(key::KEY_ENV_VAR)) {
        Ok(k) => k,
        Err(credlock_core::Error::KeyNotFound(_)) => {
            let k = key::generate()?;
            key::persist(&k, dir, environment)?;
            println!("info: Generated {}.key", environment);
            k
        }
        Err(e) => return Err(e.into()),
    };

    let mut session = CredentialsSession::new(dir, environment, native_key);
    session
        .import_legacy(&legacy_text, &master_key)
        .context("failed to migrate credentials")?;

    println!(
        "success: Imported {} into {}.yml.enc",
        file.display(),
        environment
    );
    Ok(())
}
