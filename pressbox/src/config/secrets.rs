//! WordPress security keys and salts

use std::fmt;

use rand::distr::{Alphanumeric, SampleString};
use rand::Rng;

/// Names of the keys and salts defined in wp-config.php, in render order
pub const KEY_NAMES: [&str; 8] = [
    "AUTH_KEY",
    "SECURE_AUTH_KEY",
    "LOGGED_IN_KEY",
    "NONCE_KEY",
    "AUTH_SALT",
    "SECURE_AUTH_SALT",
    "LOGGED_IN_SALT",
    "NONCE_SALT",
];

pub const KEY_LENGTH: usize = 64;

/// One freshly generated set of keys and salts
#[derive(Clone, PartialEq, Eq)]
pub struct SecurityKeys {
    values: [String; 8],
}

impl SecurityKeys {
    /// Generate every key independently from `rng`
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            values: std::array::from_fn(|_| Alphanumeric.sample_string(&mut *rng, KEY_LENGTH)),
        }
    }

    /// Generate from the thread-local RNG
    pub fn random() -> Self {
        Self::generate(&mut rand::rng())
    }

    /// `(name, value)` pairs in render order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        KEY_NAMES
            .iter()
            .copied()
            .zip(self.values.iter().map(String::as_str))
    }
}

impl fmt::Debug for SecurityKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityKeys")
            .field("count", &self.values.len())
            .finish_non_exhaustive()
    }
}
