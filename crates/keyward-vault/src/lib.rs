//! Keyward credential vault core.
//!
//! Stores website/app credentials with every secret encrypted at rest under
//! a single AES-256-GCM vault key. The vault key is minted on first use and
//! kept in a platform-sealed store (macOS Keychain, or an encrypted file
//! keyed by a device-derived key elsewhere).
//!
//! # Modules
//!
//! - [`crypto`]: cipher engine. AES-256-GCM envelopes, PBKDF2 derivation.
//! - [`keychain`]: sealed store backends for the vault key.
//! - [`keystore`]: vault key lifecycle, exactly-once creation.
//! - [`generator`]: random secret generation from character classes.
//! - [`store`]: credential records and the SQLite record store.
//! - [`service`]: validation, encryption and persistence in one place.
//! - [`config`]: TOML configuration.
//! - [`error`]: unified error type.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use keyward_vault::{CredentialService, VaultConfig};
//!
//! # fn example() -> keyward_vault::Result<()> {
//! let config = VaultConfig::load("config/default.toml")?;
//! let service = CredentialService::open(&config)?;
//!
//! let id = service.create("Gmail", "bob@example.com", "Tr0ub4dor&3", "mail.google.com", "")?;
//! let secret = service.reveal_by_id(id)?;
//! assert_eq!(secret.as_str(), "Tr0ub4dor&3");
//!
//! for record in service.search("gmail")? {
//!     println!("{} {}", record.title, record.username);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod crypto;
pub mod error;
pub mod generator;
pub mod keychain;
pub mod keystore;
pub mod service;
pub mod store;

pub use config::{GeneratorPolicy, SealedStoreKind, VaultConfig};
pub use error::{Result, VaultError};
pub use generator::{CharacterClasses, SecretGenerator};
pub use keychain::{FileSealedStore, MemorySealedStore, SealedStore};
pub use keystore::{SecretKeyStore, VaultKey};
pub use service::CredentialService;
pub use store::{CredentialRecord, NewCredentialRecord, RecordId, RecordStore, SqliteRecordStore};
