//! Vault error types.
//!
//! All vault subsystems surface errors through [`VaultError`], which is the
//! single error type returned by every public API in this crate. Integrity
//! failures on decrypt keep distinct variants and are never folded into an
//! empty value.

/// Unified error type for the Keyward credential vault.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    // -- Caller errors ------------------------------------------------------
    /// A caller-supplied value failed validation (empty title, bad length...).
    #[error("validation failed: {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// The referenced credential record does not exist.
    #[error("credential not found: id={id}")]
    NotFound { id: i64 },

    // -- Key lifecycle ------------------------------------------------------
    /// The sealed key storage could not be read or written, or it holds a
    /// value that is not a valid vault key. Fatal for every crypto operation.
    #[error("key store unavailable: {reason}")]
    KeyStoreUnavailable { reason: String },

    // -- Integrity errors on decrypt ---------------------------------------
    /// The envelope is not valid base64 or is too short to hold nonce + tag.
    #[error("malformed envelope: {reason}")]
    MalformedEnvelope { reason: String },

    /// The AEAD tag did not verify: wrong key, corrupted data or tampering.
    #[error("authentication failed: wrong key or corrupted data")]
    AuthenticationFailed,

    /// The decrypted bytes are not valid UTF-8.
    #[error("decrypted secret is not valid UTF-8")]
    InvalidPlaintextEncoding,

    // -- Generator ----------------------------------------------------------
    /// Every character class was disabled.
    #[error("at least one character class must be enabled")]
    EmptyCharacterSet,

    // -- Primitive failures -------------------------------------------------
    /// Encryption failed (CSPRNG failure, ring internal error).
    #[error("encryption failed: {reason}")]
    EncryptionFailed { reason: String },

    // -- Underlying errors --------------------------------------------------
    /// SQLite error from `rusqlite`.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration could not be parsed or is inconsistent.
    #[error("invalid configuration: {reason}")]
    Config { reason: String },

    /// I/O error from the filesystem.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    // -- Generic ------------------------------------------------------------
    /// Catch-all for unexpected internal errors. Prefer a typed variant.
    #[error("internal vault error: {0}")]
    Internal(String),
}

impl VaultError {
    /// Shorthand for a [`VaultError::Validation`] error.
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`VaultError::KeyStoreUnavailable`] error.
    pub fn key_store(reason: impl Into<String>) -> Self {
        Self::KeyStoreUnavailable {
            reason: reason.into(),
        }
    }

    /// Whether this error means a stored envelope could not be trusted.
    pub fn is_integrity_failure(&self) -> bool {
        matches!(
            self,
            Self::MalformedEnvelope { .. } | Self::AuthenticationFailed | Self::InvalidPlaintextEncoding
        )
    }

    /// Whether the caller can fix the problem by changing its input.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::NotFound { .. } | Self::EmptyCharacterSet
        )
    }
}

impl From<toml::de::Error> for VaultError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config {
            reason: err.to_string(),
        }
    }
}

/// Convenience alias used throughout the vault crate.
pub type Result<T> = std::result::Result<T, VaultError>;
