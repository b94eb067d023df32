//! Vault key lifecycle.
//!
//! [`SecretKeyStore`] owns the one symmetric key that protects every
//! credential envelope. The key is minted on first access, persisted through
//! a [`SealedStore`], and loaded from there on every later run. It is never
//! rotated automatically and never leaves this crate in cleartext.
//!
//! Several `SecretKeyStore`s may sit over the same sealed store. Key
//! creation goes through [`SealedStore::put_string_if_absent`], so whichever
//! instance persists first wins and every other instance adopts that key.

use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::crypto::{self, KEY_LEN};
use crate::error::{Result, VaultError};
use crate::keychain::SealedStore;

/// Default alias the vault key is stored under.
pub const DEFAULT_KEY_ALIAS: &str = "secret_key";

// ---------------------------------------------------------------------------
// VaultKey
// ---------------------------------------------------------------------------

/// A 256-bit AES-GCM key. Bytes are wiped on drop and never printed.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct VaultKey {
    bytes: [u8; KEY_LEN],
}

impl VaultKey {
    /// Generate a fresh key from the system CSPRNG.
    pub fn generate() -> Result<Self> {
        let random = Zeroizing::new(crypto::random_bytes(KEY_LEN)?);
        Self::from_slice(&random)
    }

    fn from_slice(slice: &[u8]) -> Result<Self> {
        if slice.len() != KEY_LEN {
            return Err(VaultError::key_store(format!(
                "vault key must be {KEY_LEN} bytes, got {}",
                slice.len()
            )));
        }
        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(slice);
        Ok(Self { bytes })
    }

    /// Parse the persisted (base64) form.
    fn decode(encoded: &str) -> Result<Self> {
        let raw = Zeroizing::new(
            STANDARD
                .decode(encoded.trim())
                .map_err(|e| VaultError::key_store(format!("persisted key is not base64: {e}")))?,
        );
        Self::from_slice(&raw)
    }

    /// The persisted (base64) form.
    fn encode(&self) -> Zeroizing<String> {
        Zeroizing::new(STANDARD.encode(self.bytes))
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VaultKey([REDACTED])")
    }
}

// ---------------------------------------------------------------------------
// SecretKeyStore
// ---------------------------------------------------------------------------

/// Creates, persists and hands out the vault key.
pub struct SecretKeyStore {
    sealed: Box<dyn SealedStore>,
    alias: String,
    /// Set once the key has been loaded or minted.
    key: OnceLock<Arc<VaultKey>>,
    /// Held only around load-or-generate so concurrent first callers mint at
    /// most one key.
    creation: Mutex<()>,
}

impl SecretKeyStore {
    /// Create a key store over `sealed`, storing the key under `alias`.
    pub fn new(sealed: impl SealedStore + 'static, alias: impl Into<String>) -> Self {
        Self {
            sealed: Box::new(sealed),
            alias: alias.into(),
            key: OnceLock::new(),
            creation: Mutex::new(()),
        }
    }

    /// Create a key store using [`DEFAULT_KEY_ALIAS`].
    pub fn with_default_alias(sealed: impl SealedStore + 'static) -> Self {
        Self::new(sealed, DEFAULT_KEY_ALIAS)
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Return the vault key, minting and persisting it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::KeyStoreUnavailable`] if the sealed store cannot
    /// be read or written, or holds a value that is not a 256-bit key. A
    /// failed read never falls through to generating a replacement key: that
    /// would orphan every existing envelope.
    pub fn get_or_create_key(&self) -> Result<Arc<VaultKey>> {
        if let Some(key) = self.key.get() {
            return Ok(Arc::clone(key));
        }

        let _guard = self
            .creation
            .lock()
            .map_err(|e| VaultError::key_store(format!("key creation lock poisoned: {e}")))?;

        // Another caller may have finished while we waited for the lock.
        if let Some(key) = self.key.get() {
            return Ok(Arc::clone(key));
        }

        let key = match self.sealed.get_string(&self.alias)? {
            Some(encoded) => {
                let encoded = Zeroizing::new(encoded);
                let key = VaultKey::decode(&encoded)?;
                tracing::debug!(alias = %self.alias, "loaded vault key from sealed store");
                key
            }
            None => {
                let candidate = VaultKey::generate()?;
                let encoded = candidate.encode();
                let stored = Zeroizing::new(
                    self.sealed
                        .put_string_if_absent(&self.alias, &encoded)?,
                );
                if *stored == *encoded {
                    tracing::info!(alias = %self.alias, "generated new vault key");
                    candidate
                } else {
                    tracing::debug!(alias = %self.alias, "vault key created by another writer, adopting it");
                    VaultKey::decode(&stored)?
                }
            }
        };

        let key = Arc::new(key);
        // Cannot already be set: every writer holds `creation`.
        let _ = self.key.set(Arc::clone(&key));
        Ok(key)
    }
}

impl fmt::Debug for SecretKeyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKeyStore")
            .field("alias", &self.alias)
            .field("loaded", &self.key.get().is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::keychain::MemorySealedStore;

    /// Counts key writes that actually landed. Reads are slowed down after
    /// they complete so every racing caller sees the alias as absent.
    #[derive(Default)]
    struct CountingStore {
        inner: MemorySealedStore,
        puts: AtomicUsize,
    }

    impl SealedStore for CountingStore {
        fn get_string(&self, alias: &str) -> Result<Option<String>> {
            let value = self.inner.get_string(alias);
            thread::sleep(Duration::from_millis(20));
            value
        }

        fn put_string(&self, alias: &str, value: &str) -> Result<()> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            self.inner.put_string(alias, value)
        }

        fn put_string_if_absent(&self, alias: &str, value: &str) -> Result<String> {
            let stored = self.inner.put_string_if_absent(alias, value)?;
            if stored == value {
                self.puts.fetch_add(1, Ordering::SeqCst);
            }
            Ok(stored)
        }
    }

    /// A backend that is locked or otherwise unreachable.
    struct UnavailableStore;

    impl SealedStore for UnavailableStore {
        fn get_string(&self, _alias: &str) -> Result<Option<String>> {
            Err(VaultError::key_store("device locked"))
        }

        fn put_string(&self, _alias: &str, _value: &str) -> Result<()> {
            panic!("must not write a key when the read failed");
        }

        fn put_string_if_absent(&self, _alias: &str, _value: &str) -> Result<String> {
            panic!("must not write a key when the read failed");
        }
    }

    #[test]
    fn key_is_stable_across_calls() {
        let store = SecretKeyStore::with_default_alias(MemorySealedStore::new());
        let a = store.get_or_create_key().unwrap();
        let b = store.get_or_create_key().unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn key_survives_a_new_key_store_over_the_same_backend() {
        let sealed = Arc::new(MemorySealedStore::new());

        let first = SecretKeyStore::with_default_alias(Arc::clone(&sealed));
        let key = first.get_or_create_key().unwrap();

        let second = SecretKeyStore::with_default_alias(Arc::clone(&sealed));
        assert_eq!(second.get_or_create_key().unwrap().as_bytes(), key.as_bytes());
    }

    #[test]
    fn concurrent_first_access_mints_one_key() {
        let sealed = Arc::new(CountingStore::default());
        let store = Arc::new(SecretKeyStore::with_default_alias(Arc::clone(&sealed)));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.get_or_create_key().unwrap().as_bytes().to_vec())
            })
            .collect();

        let keys: Vec<Vec<u8>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(sealed.puts.load(Ordering::SeqCst), 1);
        assert!(keys.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn independent_key_stores_over_one_backend_mint_one_key() {
        const INSTANCES: usize = 8;
        let sealed = Arc::new(CountingStore::default());
        let barrier = Arc::new(Barrier::new(INSTANCES));

        let handles: Vec<_> = (0..INSTANCES)
            .map(|_| {
                let sealed = Arc::clone(&sealed);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    let store = SecretKeyStore::with_default_alias(sealed);
                    barrier.wait();
                    store.get_or_create_key().unwrap().as_bytes().to_vec()
                })
            })
            .collect();

        let keys: Vec<Vec<u8>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(sealed.puts.load(Ordering::SeqCst), 1);
        assert!(keys.windows(2).all(|w| w[0] == w[1]));

        let persisted = sealed.get_string(DEFAULT_KEY_ALIAS).unwrap().unwrap();
        assert_eq!(STANDARD.decode(persisted).unwrap(), keys[0]);
    }

    #[test]
    fn unavailable_store_is_fatal_and_never_mints() {
        let store = SecretKeyStore::with_default_alias(UnavailableStore);
        let result = store.get_or_create_key();
        assert!(matches!(result, Err(VaultError::KeyStoreUnavailable { .. })));
    }

    #[test]
    fn corrupt_persisted_key_is_not_replaced() {
        let sealed = Arc::new(MemorySealedStore::new());
        sealed.put_string(DEFAULT_KEY_ALIAS, "dG9vLXNob3J0").unwrap();

        let store = SecretKeyStore::with_default_alias(Arc::clone(&sealed));
        let result = store.get_or_create_key();
        assert!(matches!(result, Err(VaultError::KeyStoreUnavailable { .. })));

        // The bad value is left in place for the host to deal with.
        assert_eq!(
            sealed.get_string(DEFAULT_KEY_ALIAS).unwrap().as_deref(),
            Some("dG9vLXNob3J0")
        );
    }

    #[test]
    fn persisted_form_is_base64_of_32_bytes() {
        let sealed = Arc::new(MemorySealedStore::new());
        let store = SecretKeyStore::new(Arc::clone(&sealed), "custom_alias");
        let key = store.get_or_create_key().unwrap();

        let persisted = sealed.get_string("custom_alias").unwrap().unwrap();
        assert_eq!(STANDARD.decode(persisted).unwrap(), key.as_bytes());
        assert_eq!(sealed.get_string(DEFAULT_KEY_ALIAS).unwrap(), None);
    }

    #[test]
    fn debug_output_is_redacted() {
        let key = VaultKey::generate().unwrap();
        assert_eq!(format!("{key:?}"), "VaultKey([REDACTED])");
    }
}
