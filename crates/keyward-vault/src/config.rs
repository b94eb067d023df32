//! Vault configuration.
//!
//! [`VaultConfig`] says where the vault keeps its files, which sealed store
//! backs the key, and what the secret-generation policy is. It deserializes
//! from TOML (usually `config/default.toml`), every field has a default, and
//! builder-style `with_*` setters cover programmatic setup.
//!
//! ```toml
//! data_dir = "data"
//! database_file = "vault.db"
//! key_alias = "secret_key"
//! sealed_store = "platform"
//!
//! [generator]
//! default_length = 16
//! min_length = 8
//! max_length = 32
//! uppercase = true
//! lowercase = true
//! digits = true
//! symbols = true
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, VaultError};
use crate::generator::{CharacterClasses, DEFAULT_SECRET_LENGTH};
use crate::keystore::DEFAULT_KEY_ALIAS;

/// Environment variable that overrides [`VaultConfig::data_dir`].
pub const DATA_DIR_ENV: &str = "KEYWARD_DATA_DIR";

/// Which [`SealedStore`](crate::keychain::SealedStore) backend holds the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SealedStoreKind {
    /// Best backend for the current OS.
    #[default]
    Platform,
    /// Encrypted file under the data directory on every OS.
    File,
    /// Process memory only; the key is lost on exit.
    Memory,
}

/// Length range and default classes for generated secrets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorPolicy {
    /// Length used when the caller does not ask for one.
    pub default_length: usize,
    pub min_length: usize,
    pub max_length: usize,
    /// Classes used when the caller does not choose.
    #[serde(flatten)]
    pub classes: CharacterClasses,
}

impl Default for GeneratorPolicy {
    fn default() -> Self {
        Self {
            default_length: DEFAULT_SECRET_LENGTH,
            min_length: 8,
            max_length: 32,
            classes: CharacterClasses::default(),
        }
    }
}

impl GeneratorPolicy {
    /// Check that `length` falls inside the allowed range.
    pub fn check_length(&self, length: usize) -> Result<()> {
        if length < self.min_length || length > self.max_length {
            return Err(VaultError::validation(
                "length",
                format!(
                    "must be between {} and {}, got {length}",
                    self.min_length, self.max_length
                ),
            ));
        }
        Ok(())
    }
}

/// Top-level vault configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Directory holding the database and (for the file backend) the sealed
    /// key file.
    pub data_dir: PathBuf,
    /// Database file name, relative to `data_dir`.
    pub database_file: String,
    /// Alias the vault key is stored under in the sealed store.
    pub key_alias: String,
    pub sealed_store: SealedStoreKind,
    pub generator: GeneratorPolicy,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            database_file: "vault.db".into(),
            key_alias: DEFAULT_KEY_ALIAS.into(),
            sealed_store: SealedStoreKind::default(),
            generator: GeneratorPolicy::default(),
        }
    }
}

impl VaultConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults. The
    /// [`DATA_DIR_ENV`] variable overrides `data_dir` either way.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let source = std::fs::read_to_string(path)?;
            let config = Self::from_toml_str(&source)?;
            tracing::debug!(path = %path.display(), "loaded vault configuration");
            config
        } else {
            tracing::debug!(path = %path.display(), "no configuration file, using defaults");
            Self::default()
        };

        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if !dir.trim().is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }

        Ok(config)
    }

    /// Reject settings that cannot work together.
    pub fn validate(&self) -> Result<()> {
        let generator = &self.generator;
        if generator.min_length == 0 {
            return Err(config_error("generator.min_length must be at least 1"));
        }
        if generator.min_length > generator.max_length {
            return Err(config_error(format!(
                "generator.min_length ({}) exceeds generator.max_length ({})",
                generator.min_length, generator.max_length
            )));
        }
        if generator.check_length(generator.default_length).is_err() {
            return Err(config_error(format!(
                "generator.default_length ({}) is outside {}..={}",
                generator.default_length, generator.min_length, generator.max_length
            )));
        }
        if generator.classes.is_empty() {
            return Err(config_error("generator must enable at least one character class"));
        }
        if self.key_alias.trim().is_empty() {
            return Err(config_error("key_alias must not be empty"));
        }
        if self.database_file.trim().is_empty() {
            return Err(config_error("database_file must not be empty"));
        }
        Ok(())
    }

    /// Full path of the credential database.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_database_file(mut self, file: impl Into<String>) -> Self {
        self.database_file = file.into();
        self
    }

    pub fn with_key_alias(mut self, alias: impl Into<String>) -> Self {
        self.key_alias = alias.into();
        self
    }

    pub fn with_sealed_store(mut self, kind: SealedStoreKind) -> Self {
        self.sealed_store = kind;
        self
    }

    pub fn with_generator(mut self, policy: GeneratorPolicy) -> Self {
        self.generator = policy;
        self
    }
}

fn config_error(reason: impl Into<String>) -> VaultError {
    VaultError::Config {
        reason: reason.into(),
    }
}
