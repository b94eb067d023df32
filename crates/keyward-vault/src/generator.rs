//! Random secret generation.
//!
//! Secrets are drawn uniformly from the union of the enabled character
//! classes using the OS CSPRNG (`ring::rand::SystemRandom`). There is no
//! guarantee that every enabled class shows up in a given secret: a short
//! secret with all classes enabled can, rarely, come out all digits. Forcing
//! per-class presence would change the output distribution.

use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VaultError};

pub const UPPERCASE_CHARS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const LOWERCASE_CHARS: &str = "abcdefghijklmnopqrstuvwxyz";
pub const DIGIT_CHARS: &str = "0123456789";
pub const SYMBOL_CHARS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Length used by [`SecretGenerator::generate_default`].
pub const DEFAULT_SECRET_LENGTH: usize = 16;

/// Which character classes a generated secret may draw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterClasses {
    pub uppercase: bool,
    pub lowercase: bool,
    pub digits: bool,
    pub symbols: bool,
}

impl Default for CharacterClasses {
    /// All four classes enabled.
    fn default() -> Self {
        Self {
            uppercase: true,
            lowercase: true,
            digits: true,
            symbols: true,
        }
    }
}

impl CharacterClasses {
    /// No class enabled. Useful as a starting point for the `with_*` setters.
    pub fn none() -> Self {
        Self {
            uppercase: false,
            lowercase: false,
            digits: false,
            symbols: false,
        }
    }

    pub fn with_uppercase(mut self, enabled: bool) -> Self {
        self.uppercase = enabled;
        self
    }

    pub fn with_lowercase(mut self, enabled: bool) -> Self {
        self.lowercase = enabled;
        self
    }

    pub fn with_digits(mut self, enabled: bool) -> Self {
        self.digits = enabled;
        self
    }

    pub fn with_symbols(mut self, enabled: bool) -> Self {
        self.symbols = enabled;
        self
    }

    pub fn is_empty(&self) -> bool {
        !(self.uppercase || self.lowercase || self.digits || self.symbols)
    }

    /// The ordered union of the enabled classes: upper, lower, digits, symbols.
    pub fn alphabet(&self) -> Vec<u8> {
        let mut alphabet = Vec::with_capacity(
            UPPERCASE_CHARS.len() + LOWERCASE_CHARS.len() + DIGIT_CHARS.len() + SYMBOL_CHARS.len(),
        );
        for (enabled, chars) in [
            (self.uppercase, UPPERCASE_CHARS),
            (self.lowercase, LOWERCASE_CHARS),
            (self.digits, DIGIT_CHARS),
            (self.symbols, SYMBOL_CHARS),
        ] {
            if enabled {
                alphabet.extend_from_slice(chars.as_bytes());
            }
        }
        alphabet
    }
}

/// Generates random secrets from a character-class policy.
pub struct SecretGenerator {
    rng: SystemRandom,
}

impl Default for SecretGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretGenerator {
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }

    /// Generate a secret of exactly `length` characters.
    ///
    /// # Errors
    ///
    /// - [`VaultError::Validation`] if `length` is zero.
    /// - [`VaultError::EmptyCharacterSet`] if no class is enabled.
    /// - [`VaultError::EncryptionFailed`] if the CSPRNG fails.
    pub fn generate(&self, length: usize, classes: CharacterClasses) -> Result<String> {
        if length == 0 {
            return Err(VaultError::validation("length", "must be at least 1"));
        }
        if classes.is_empty() {
            return Err(VaultError::EmptyCharacterSet);
        }

        let alphabet = classes.alphabet();
        let mut secret = String::with_capacity(length);
        for _ in 0..length {
            let index = self.random_index(alphabet.len())?;
            secret.push(char::from(alphabet[index]));
        }

        tracing::debug!(length, alphabet_len = alphabet.len(), "generated secret");
        Ok(secret)
    }

    /// Generate a [`DEFAULT_SECRET_LENGTH`]-character secret from all classes.
    pub fn generate_default(&self) -> Result<String> {
        self.generate(DEFAULT_SECRET_LENGTH, CharacterClasses::default())
    }

    /// Uniform index in `0..bound` by rejection sampling over `u32` draws.
    fn random_index(&self, bound: usize) -> Result<usize> {
        let bound = u32::try_from(bound)
            .map_err(|_| VaultError::Internal(format!("alphabet too large: {bound}")))?;
        // Largest multiple of `bound` that fits; draws at or above it are
        // rejected so every index is equally likely.
        let zone = u32::MAX - (u32::MAX % bound);
        loop {
            let mut buf = [0u8; 4];
            self.rng
                .fill(&mut buf)
                .map_err(|_| VaultError::EncryptionFailed {
                    reason: "failed to generate random bytes".into(),
                })?;
            let draw = u32::from_le_bytes(buf);
            if draw < zone {
                return Ok((draw % bound) as usize);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_has_requested_length() {
        let generator = SecretGenerator::new();
        for length in [1, 8, 16, 32, 257] {
            let secret = generator.generate(length, CharacterClasses::default()).unwrap();
            assert_eq!(secret.chars().count(), length);
        }
    }

    #[test]
    fn long_secret_covers_every_class() {
        let secret = SecretGenerator::new()
            .generate(1000, CharacterClasses::default())
            .unwrap();
        assert!(secret.chars().any(|c| c.is_ascii_uppercase()));
        assert!(secret.chars().any(|c| c.is_ascii_lowercase()));
        assert!(secret.chars().any(|c| c.is_ascii_digit()));
        assert!(secret.chars().any(|c| SYMBOL_CHARS.contains(c)));
    }

    #[test]
    fn only_enabled_classes_are_used() {
        let classes = CharacterClasses::none().with_digits(true);
        let secret = SecretGenerator::new().generate(200, classes).unwrap();
        assert!(secret.chars().all(|c| c.is_ascii_digit()));

        let classes = CharacterClasses::none().with_lowercase(true).with_symbols(true);
        let secret = SecretGenerator::new().generate(200, classes).unwrap();
        assert!(
            secret
                .chars()
                .all(|c| c.is_ascii_lowercase() || SYMBOL_CHARS.contains(c))
        );
    }

    #[test]
    fn no_classes_is_an_error() {
        let result = SecretGenerator::new().generate(16, CharacterClasses::none());
        assert!(matches!(result, Err(VaultError::EmptyCharacterSet)));
    }

    #[test]
    fn zero_length_is_rejected() {
        let result = SecretGenerator::new().generate(0, CharacterClasses::default());
        assert!(matches!(result, Err(VaultError::Validation { .. })));
    }

    #[test]
    fn alphabet_is_ordered_union() {
        let alphabet = CharacterClasses::none()
            .with_digits(true)
            .with_uppercase(true)
            .alphabet();
        assert_eq!(alphabet, format!("{UPPERCASE_CHARS}{DIGIT_CHARS}").into_bytes());
        assert_eq!(CharacterClasses::default().alphabet().len(), 26 + 26 + 10 + 26);
    }

    #[test]
    fn default_generation() {
        let secret = SecretGenerator::new().generate_default().unwrap();
        assert_eq!(secret.len(), DEFAULT_SECRET_LENGTH);
    }

    #[test]
    fn random_index_stays_in_bounds() {
        let generator = SecretGenerator::new();
        for bound in [1, 2, 10, 88] {
            for _ in 0..200 {
                assert!(generator.random_index(bound).unwrap() < bound);
            }
        }
    }
}
