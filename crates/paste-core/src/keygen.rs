//! Paste key generation
//!
//! A key is a truncated, URL-safe encoding of a hashed random draw,
//! followed by the creation timestamp to the second:
//! `<random part><yyyyMMddHHmmss>`. Two keys only collide if their
//! random parts collide within the same second.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};

use crate::error::CoreError;

/// Shortest allowed random part
pub const MIN_RANDOM_LENGTH: usize = 8;

/// Longest allowed random part
pub const MAX_RANDOM_LENGTH: usize = 14;

/// Default random part length
pub const DEFAULT_RANDOM_LENGTH: usize = 8;

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Generates unique, unguessable paste keys
#[derive(Debug, Clone)]
pub struct KeyGenerator {
    random_length: usize,
}

impl Default for KeyGenerator {
    fn default() -> Self {
        Self {
            random_length: DEFAULT_RANDOM_LENGTH,
        }
    }
}

impl KeyGenerator {
    /// Create a key generator producing random parts of `random_length` characters
    pub fn new(random_length: usize) -> Result<Self, CoreError> {
        if !(MIN_RANDOM_LENGTH..=MAX_RANDOM_LENGTH).contains(&random_length) {
            return Err(CoreError::Validation(format!(
                "key length must be between {} and {}, got {}",
                MIN_RANDOM_LENGTH, MAX_RANDOM_LENGTH, random_length
            )));
        }

        Ok(Self { random_length })
    }

    pub fn random_length(&self) -> usize {
        self.random_length
    }

    /// Generate a key stamped with the current time
    pub fn generate(&self) -> String {
        self.generate_at(Utc::now())
    }

    /// Generate a key stamped with `now`
    pub fn generate_at(&self, now: DateTime<Utc>) -> String {
        let mut key = self.random_part();
        key.push_str(&now.format(TIMESTAMP_FORMAT).to_string());
        key
    }

    fn random_part(&self) -> String {
        let mut seed = [0u8; 32];
        OsRng.fill_bytes(&mut seed);

        let digest = Sha256::digest(seed);
        let mut encoded = URL_SAFE_NO_PAD.encode(digest);
        encoded.truncate(self.random_length);
        encoded
    }
}
