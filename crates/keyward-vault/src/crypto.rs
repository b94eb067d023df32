//! AES-256-GCM encryption and decryption using the `ring` crate.
//!
//! This module is the vault's cipher engine:
//!
//! - **Envelopes**: [`seal_envelope`] / [`open_envelope`] turn a secret into
//!   the stable, self-contained string stored on every credential record,
//!   and back again.
//! - **Raw AEAD**: [`encrypt`] / [`decrypt`] operate on `(nonce, ciphertext)`
//!   pairs and back the file-based sealed store.
//! - **Key derivation**: PBKDF2-HMAC-SHA256 for device-derived keys.
//! - **Random generation**: Cryptographically secure random bytes via `ring`.
//!
//! # Envelope format
//!
//! ```text
//! base64-standard( nonce[12] || ciphertext[len(plaintext)] || tag[16] )
//! ```
//!
//! The nonce is always generated here. Callers can never supply one, so
//! nonce reuse under a key is impossible through this API.

use std::num::NonZeroU32;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ring::aead::{self, Aad, BoundKey, NONCE_LEN, Nonce, NonceSequence, SealingKey, UnboundKey};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};

use crate::error::{Result, VaultError};
use crate::keystore::VaultKey;

/// Length of the AES-256-GCM key in bytes.
pub const KEY_LEN: usize = 32;

/// Length of the AES-256-GCM nonce in bytes (96 bits).
pub const NONCE_LEN_BYTES: usize = NONCE_LEN;

/// Length of the AES-256-GCM authentication tag in bytes (128 bits).
pub const TAG_LEN: usize = 16;

/// Smallest decoded envelope: a nonce and a tag around an empty ciphertext.
pub const MIN_ENVELOPE_LEN: usize = NONCE_LEN_BYTES + TAG_LEN;

/// Length of the PBKDF2 salt in bytes.
pub const SALT_LEN: usize = 32;

/// PBKDF2 iteration count, 600,000 per OWASP 2023 for HMAC-SHA256.
const PBKDF2_ITERATIONS: NonZeroU32 = match NonZeroU32::new(600_000) {
    Some(n) => n,
    None => panic!("PBKDF2 iteration count must be non-zero"),
};

/// PBKDF2 algorithm: HMAC-SHA256.
static PBKDF2_ALG: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;

/// AES-256-GCM algorithm from `ring`.
static AEAD_ALG: &aead::Algorithm = &aead::AES_256_GCM;

// ---------------------------------------------------------------------------
// Nonce handling
// ---------------------------------------------------------------------------

/// A single-use nonce sequence that yields exactly one nonce and then errors.
///
/// `ring` requires a [`NonceSequence`] for sealing and opening keys. Every
/// call builds a fresh key around one nonce, so a key object can never be
/// advanced onto a second message.
struct SingleNonce(Option<[u8; NONCE_LEN_BYTES]>);

impl SingleNonce {
    fn new(bytes: [u8; NONCE_LEN_BYTES]) -> Self {
        Self(Some(bytes))
    }
}

impl NonceSequence for SingleNonce {
    fn advance(&mut self) -> std::result::Result<Nonce, ring::error::Unspecified> {
        self.0
            .take()
            .map(Nonce::assume_unique_for_key)
            .ok_or(ring::error::Unspecified)
    }
}

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

/// Encrypt `plaintext` under the vault key and return the encoded envelope.
///
/// # Errors
///
/// Returns [`VaultError::EncryptionFailed`] if the CSPRNG or `ring` fails.
pub fn seal_envelope(plaintext: &[u8], key: &VaultKey) -> Result<String> {
    let (nonce, ciphertext) = encrypt(plaintext, key.as_bytes())?;

    let mut raw = Vec::with_capacity(NONCE_LEN_BYTES + ciphertext.len());
    raw.extend_from_slice(&nonce);
    raw.extend_from_slice(&ciphertext);

    Ok(STANDARD.encode(raw))
}

/// Decode and decrypt an envelope produced by [`seal_envelope`].
///
/// # Errors
///
/// - [`VaultError::MalformedEnvelope`] if the string is not base64 or is
///   shorter than nonce + tag once decoded.
/// - [`VaultError::AuthenticationFailed`] if the tag does not verify.
/// - [`VaultError::InvalidPlaintextEncoding`] if the plaintext is not UTF-8.
pub fn open_envelope(envelope: &str, key: &VaultKey) -> Result<String> {
    let raw = STANDARD
        .decode(envelope)
        .map_err(|e| VaultError::MalformedEnvelope {
            reason: format!("base64 decode failed: {e}"),
        })?;

    if raw.len() < MIN_ENVELOPE_LEN {
        return Err(VaultError::MalformedEnvelope {
            reason: format!(
                "envelope is {} bytes, need at least {MIN_ENVELOPE_LEN}",
                raw.len()
            ),
        });
    }

    // The tag stays attached to the ciphertext; `ring` verifies it in place.
    let (nonce_bytes, sealed) = raw.split_at(NONCE_LEN_BYTES);
    let mut nonce = [0u8; NONCE_LEN_BYTES];
    nonce.copy_from_slice(nonce_bytes);

    let plaintext = decrypt(&nonce, sealed, key.as_bytes())?;
    String::from_utf8(plaintext).map_err(|_| VaultError::InvalidPlaintextEncoding)
}

// ---------------------------------------------------------------------------
// Raw AEAD
// ---------------------------------------------------------------------------

/// Encrypt `plaintext` with AES-256-GCM using the given 256-bit `key`.
///
/// Returns `(nonce, ciphertext)` where `nonce` is a randomly generated 96-bit
/// value and `ciphertext` includes the 128-bit authentication tag appended by
/// `ring`.
///
/// # Errors
///
/// Returns [`VaultError::EncryptionFailed`] if the key length is wrong or
/// `ring` reports a failure.
pub fn encrypt(plaintext: &[u8], key: &[u8]) -> Result<([u8; NONCE_LEN_BYTES], Vec<u8>)> {
    if key.len() != KEY_LEN {
        return Err(VaultError::EncryptionFailed {
            reason: format!("key must be {} bytes, got {}", KEY_LEN, key.len()),
        });
    }

    let mut nonce_bytes = [0u8; NONCE_LEN_BYTES];
    SystemRandom::new()
        .fill(&mut nonce_bytes)
        .map_err(|_| VaultError::EncryptionFailed {
            reason: "failed to generate random nonce".into(),
        })?;

    let unbound_key = UnboundKey::new(AEAD_ALG, key).map_err(|_| VaultError::EncryptionFailed {
        reason: "failed to create AES-256-GCM key".into(),
    })?;

    let mut sealing_key = SealingKey::new(unbound_key, SingleNonce::new(nonce_bytes));

    let mut in_out = plaintext.to_vec();
    sealing_key
        .seal_in_place_append_tag(Aad::empty(), &mut in_out)
        .map_err(|_| VaultError::EncryptionFailed {
            reason: "seal_in_place failed".into(),
        })?;

    tracing::trace!(
        plaintext_len = plaintext.len(),
        ciphertext_len = in_out.len(),
        "encrypted data"
    );

    Ok((nonce_bytes, in_out))
}

/// Decrypt `ciphertext` (which includes the GCM tag) using the given `nonce`
/// and 256-bit `key`.
///
/// # Errors
///
/// Returns [`VaultError::AuthenticationFailed`] if the key is wrong or the
/// ciphertext, tag or nonce has been altered, and
/// [`VaultError::EncryptionFailed`] if the key has the wrong length.
pub fn decrypt(nonce: &[u8; NONCE_LEN_BYTES], ciphertext: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    if key.len() != KEY_LEN {
        return Err(VaultError::EncryptionFailed {
            reason: format!("key must be {} bytes, got {}", KEY_LEN, key.len()),
        });
    }

    let unbound_key = UnboundKey::new(AEAD_ALG, key).map_err(|_| VaultError::EncryptionFailed {
        reason: "failed to create AES-256-GCM key".into(),
    })?;

    let mut opening_key = aead::OpeningKey::new(unbound_key, SingleNonce::new(*nonce));

    let mut in_out = ciphertext.to_vec();
    let plaintext = opening_key
        .open_in_place(Aad::empty(), &mut in_out)
        .map_err(|_| VaultError::AuthenticationFailed)?;

    let result = plaintext.to_vec();

    tracing::trace!(
        ciphertext_len = ciphertext.len(),
        plaintext_len = result.len(),
        "decrypted data"
    );

    Ok(result)
}

// ---------------------------------------------------------------------------
// Key derivation
// ---------------------------------------------------------------------------

/// Derive a 256-bit key from `material` and a known `salt` with
/// PBKDF2-HMAC-SHA256.
pub fn derive_key_with_salt(material: &[u8], salt: &[u8], out: &mut [u8; KEY_LEN]) {
    pbkdf2::derive(PBKDF2_ALG, PBKDF2_ITERATIONS, salt, material, out);
}

// ---------------------------------------------------------------------------
// Random bytes
// ---------------------------------------------------------------------------

/// Generate `len` cryptographically secure random bytes.
///
/// # Errors
///
/// Returns [`VaultError::EncryptionFailed`] if the system CSPRNG fails.
pub fn random_bytes(len: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    SystemRandom::new()
        .fill(&mut buf)
        .map_err(|_| VaultError::EncryptionFailed {
            reason: "failed to generate random bytes".into(),
        })?;
    Ok(buf)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
