//! CLI argument definitions for Keyward.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! dispatching subcommands.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use keyward_vault::CharacterClasses;

/// Keyward -- a local credential vault.
#[derive(Parser)]
#[command(
    name = "keyward",
    version,
    about = "Keyward -- local credential vault",
    long_about = "Stores website and app credentials with every secret encrypted at rest. \
                  The vault key lives in the OS keychain or an encrypted key file."
)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, short, global = true, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Log at debug level (RUST_LOG still wins when set).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Print machine-readable JSON instead of tables.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new credential.
    Add {
        title: String,
        username: String,

        #[command(flatten)]
        secret: SecretArgs,

        #[arg(long, default_value = "")]
        website: String,

        #[arg(long, default_value = "")]
        notes: String,
    },

    /// List all credentials (secrets are never shown).
    List,

    /// Show a single credential.
    Show {
        id: i64,

        /// Also decrypt and print the secret.
        #[arg(long)]
        reveal: bool,
    },

    /// Edit a credential. Omitted fields keep their current value.
    Update {
        id: i64,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        username: Option<String>,

        #[command(flatten)]
        secret: SecretArgs,

        #[arg(long)]
        website: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Delete a credential permanently.
    Delete {
        id: i64,

        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },

    /// Case-insensitive search over title, username and website.
    Search { query: String },

    /// Print a freshly generated secret.
    Generate {
        #[command(flatten)]
        options: GenerateArgs,
    },

    /// Show how many credentials are stored.
    Count,

    /// Verify the vault key can encrypt and decrypt.
    Check,
}

/// Where a new secret comes from. At most one source may be given.
#[derive(Args)]
#[group(multiple = false)]
pub struct SecretArgs {
    /// Secret value. Visible in shell history; prefer --secret-stdin.
    #[arg(long)]
    pub secret: Option<String>,

    /// Read the secret from the first line of stdin.
    #[arg(long)]
    pub secret_stdin: bool,

    /// Generate the secret using the configured default policy.
    #[arg(long)]
    pub generate: bool,
}

impl SecretArgs {
    pub fn is_given(&self) -> bool {
        self.secret.is_some() || self.secret_stdin || self.generate
    }
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Secret length; defaults to the configured default length.
    #[arg(long, short)]
    pub length: Option<usize>,

    #[arg(long)]
    pub no_uppercase: bool,

    #[arg(long)]
    pub no_lowercase: bool,

    #[arg(long)]
    pub no_digits: bool,

    #[arg(long)]
    pub no_symbols: bool,
}

impl GenerateArgs {
    /// Apply the `--no-*` switches on top of `base`.
    pub fn classes(&self, base: CharacterClasses) -> CharacterClasses {
        CharacterClasses {
            uppercase: base.uppercase && !self.no_uppercase,
            lowercase: base.lowercase && !self.no_lowercase,
            digits: base.digits && !self.no_digits,
            symbols: base.symbols && !self.no_symbols,
        }
    }
}
