//! Cache key type and derivation.
//!
//! A [`CacheKey`] is the hash of a request fingerprint (method, full URL and
//! an optional suffix such as the authenticated user id). The hash is the
//! first 128 bits of SHA-256, rendered as 32 lowercase hex characters:
//!
//! ```
//! use tagcache_core::CacheKey;
//!
//! let key = CacheKey::from_fingerprint("GEThttp://localhost/users");
//! assert_eq!(key.as_str().len(), CacheKey::LEN);
//! assert_eq!(key, CacheKey::from_fingerprint("GEThttp://localhost/users"));
//! ```
//!
//! The derivation has no randomness and no time dependency, so keys are stable
//! across process restarts and across instances sharing a remote store.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use smol_str::SmolStr;

/// Number of digest bytes kept in a key.
const DIGEST_BYTES: usize = 16;

/// Hash-derived identifier of a cached response.
///
/// Cloning is cheap: the 32-character hex string is reference counted by
/// [`SmolStr`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(SmolStr);

impl CacheKey {
    /// Length of the hex representation of every key.
    pub const LEN: usize = DIGEST_BYTES * 2;

    /// Derives a key from a request fingerprint.
    ///
    /// Equal fingerprints always produce equal keys.
    pub fn from_fingerprint(fingerprint: &str) -> Self {
        let digest = Sha256::digest(fingerprint.as_bytes());
        Self(SmolStr::new(hex::encode(&digest[..DIGEST_BYTES])))
    }

    /// Returns the key as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
