//! Credential orchestration and business rules.
//!
//! [`CredentialService`] is the only entry point hosts should use for
//! credential records. It validates and trims input, encrypts secrets with
//! the key from [`SecretKeyStore`], stamps timestamps and hands the record
//! to the [`RecordStore`]. Decrypted secrets leave only through
//! [`CredentialService::reveal`], wrapped so they are wiped on drop.
//!
//! Integrity errors from decryption are passed through untouched. A failed
//! reveal must never look like an empty secret.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use zeroize::Zeroizing;

use crate::config::{GeneratorPolicy, SealedStoreKind, VaultConfig};
use crate::crypto;
use crate::error::{Result, VaultError};
use crate::generator::{CharacterClasses, SecretGenerator};
use crate::keychain::{self, FileSealedStore, MemorySealedStore, SealedStore};
use crate::keystore::SecretKeyStore;
use crate::store::{
    CredentialRecord, NewCredentialRecord, RecordId, RecordStore, SqliteRecordStore,
};

/// Plaintext used by [`CredentialService::check_encryption`].
const CHECK_PLAINTEXT: &str = "keyward-encryption-check";

/// Validates, encrypts and persists credential records.
pub struct CredentialService {
    store: Arc<dyn RecordStore>,
    keys: Arc<SecretKeyStore>,
    generator: SecretGenerator,
    policy: GeneratorPolicy,
}

impl CredentialService {
    /// Build a service with the default generator policy.
    pub fn new(store: Arc<dyn RecordStore>, keys: Arc<SecretKeyStore>) -> Self {
        Self::with_policy(store, keys, GeneratorPolicy::default())
    }

    pub fn with_policy(
        store: Arc<dyn RecordStore>,
        keys: Arc<SecretKeyStore>,
        policy: GeneratorPolicy,
    ) -> Self {
        Self {
            store,
            keys,
            generator: SecretGenerator::new(),
            policy,
        }
    }

    /// Wire up a service from configuration: create the data directory,
    /// pick the sealed store backend and open the SQLite database.
    ///
    /// The vault key is not touched here; it is loaded on first use.
    pub fn open(config: &VaultConfig) -> Result<Self> {
        config.validate()?;
        std::fs::create_dir_all(&config.data_dir)?;

        let sealed: Box<dyn SealedStore> = match config.sealed_store {
            SealedStoreKind::Platform => keychain::platform_sealed_store(&config.data_dir),
            SealedStoreKind::File => Box::new(FileSealedStore::new(
                FileSealedStore::default_path(&config.data_dir),
            )),
            SealedStoreKind::Memory => {
                tracing::warn!("using in-memory sealed store; the vault key will not persist");
                Box::new(MemorySealedStore::new())
            }
        };
        let keys = Arc::new(SecretKeyStore::new(sealed, config.key_alias.clone()));
        let store = Arc::new(SqliteRecordStore::open(config.database_path())?);

        tracing::info!(
            data_dir = %config.data_dir.display(),
            backend = ?config.sealed_store,
            "opened credential vault"
        );
        Ok(Self::with_policy(store, keys, config.generator))
    }

    pub fn policy(&self) -> &GeneratorPolicy {
        &self.policy
    }

    // -- Writes -------------------------------------------------------------

    /// Create a credential and return the store-assigned id.
    ///
    /// `title`, `username`, `website` and `notes` are trimmed. The secret is
    /// encrypted exactly as given.
    ///
    /// # Errors
    ///
    /// [`VaultError::Validation`] if title, username or secret is blank;
    /// [`VaultError::KeyStoreUnavailable`] if the vault key cannot be loaded.
    pub fn create(
        &self,
        title: &str,
        username: &str,
        secret: &str,
        website: &str,
        notes: &str,
    ) -> Result<RecordId> {
        let title = required("title", title)?;
        let username = required("username", username)?;
        required("secret", secret)?;

        let secret_envelope = self.seal(secret)?;
        let now = now_millis();

        let id = self.store.insert(&NewCredentialRecord {
            title: title.to_string(),
            username: username.to_string(),
            secret_envelope,
            website: website.trim().to_string(),
            notes: notes.trim().to_string(),
            created_at: now,
            updated_at: now,
        })?;

        tracing::info!(%id, "created credential");
        Ok(id)
    }

    /// Replace a credential's metadata and, if `secret` is given, its secret.
    ///
    /// With `secret == None` the stored envelope is kept byte-for-byte.
    /// `updated_at` always moves forward; `created_at` never changes.
    ///
    /// # Errors
    ///
    /// [`VaultError::NotFound`] if `id` does not exist;
    /// [`VaultError::Validation`] if title, username or a supplied secret is
    /// blank.
    pub fn update(
        &self,
        id: RecordId,
        title: &str,
        username: &str,
        secret: Option<&str>,
        website: &str,
        notes: &str,
    ) -> Result<CredentialRecord> {
        let existing = self.require(id)?;

        let title = required("title", title)?;
        let username = required("username", username)?;
        let secret_envelope = match secret {
            Some(secret) => {
                required("secret", secret)?;
                self.seal(secret)?
            }
            None => existing.secret_envelope.clone(),
        };

        let updated = CredentialRecord {
            id: existing.id,
            title: title.to_string(),
            username: username.to_string(),
            secret_envelope,
            website: website.trim().to_string(),
            notes: notes.trim().to_string(),
            created_at: existing.created_at,
            updated_at: next_timestamp(existing.updated_at),
        };
        self.store.update(&updated)?;

        tracing::info!(%id, secret_changed = secret.is_some(), "updated credential");
        Ok(updated)
    }

    /// Delete a credential. There is no undo.
    pub fn delete(&self, record: &CredentialRecord) -> Result<()> {
        self.store.delete(record)?;
        tracing::info!(id = %record.id, "deleted credential");
        Ok(())
    }

    // -- Reads --------------------------------------------------------------

    /// Decrypt a record's secret.
    ///
    /// # Errors
    ///
    /// [`VaultError::MalformedEnvelope`], [`VaultError::AuthenticationFailed`]
    /// and [`VaultError::InvalidPlaintextEncoding`] are returned unchanged.
    pub fn reveal(&self, record: &CredentialRecord) -> Result<Zeroizing<String>> {
        let key = self.keys.get_or_create_key()?;
        match crypto::open_envelope(&record.secret_envelope, &key) {
            Ok(plaintext) => Ok(Zeroizing::new(plaintext)),
            Err(err) => {
                tracing::warn!(id = %record.id, error = %err, "failed to reveal credential");
                Err(err)
            }
        }
    }

    /// Look up a record by id and decrypt its secret.
    pub fn reveal_by_id(&self, id: RecordId) -> Result<Zeroizing<String>> {
        let record = self.require(id)?;
        self.reveal(&record)
    }

    pub fn get(&self, id: RecordId) -> Result<Option<CredentialRecord>> {
        self.store.get_by_id(id)
    }

    /// Every record, ordered by title.
    pub fn list(&self) -> Result<Vec<CredentialRecord>> {
        self.store.query_all()
    }

    /// Records whose title, username or website contains `query`, ignoring
    /// case. A blank query returns everything.
    pub fn search(&self, query: &str) -> Result<Vec<CredentialRecord>> {
        let query = query.trim();
        if query.is_empty() {
            return self.list();
        }
        self.store.query_substring(query)
    }

    pub fn count(&self) -> Result<usize> {
        self.store.count()
    }

    // -- Secrets ------------------------------------------------------------

    /// Generate a secret, enforcing the configured length range.
    pub fn generate_secret(&self, length: usize, classes: CharacterClasses) -> Result<String> {
        self.policy.check_length(length)?;
        self.generator.generate(length, classes)
    }

    /// Generate a secret with the policy's default length and classes.
    pub fn generate_default_secret(&self) -> Result<String> {
        self.generate_secret(self.policy.default_length, self.policy.classes)
    }

    /// Round-trip a known value through the cipher with the vault key.
    ///
    /// Loads (or mints) the key as a side effect. Returns the first failure.
    pub fn check_encryption(&self) -> Result<()> {
        let envelope = self.seal(CHECK_PLAINTEXT)?;
        let key = self.keys.get_or_create_key()?;
        let plaintext = crypto::open_envelope(&envelope, &key)?;
        if plaintext != CHECK_PLAINTEXT {
            return Err(VaultError::Internal(
                "encryption check did not round-trip".into(),
            ));
        }
        Ok(())
    }

    // -- Internal helpers ---------------------------------------------------

    fn seal(&self, secret: &str) -> Result<String> {
        let key = self.keys.get_or_create_key()?;
        crypto::seal_envelope(secret.as_bytes(), &key)
    }

    fn require(&self, id: RecordId) -> Result<CredentialRecord> {
        self.store
            .get_by_id(id)?
            .ok_or(VaultError::NotFound { id: id.0 })
    }
}

/// Trim `value` and reject it if nothing is left.
fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(VaultError::validation(field, "must not be empty"));
    }
    Ok(trimmed)
}

/// Current time truncated to the millisecond precision the store keeps.
fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

/// A timestamp strictly after `previous`, normally "now".
fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = now_millis();
    if now > previous {
        now
    } else {
        previous + Duration::milliseconds(1)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
