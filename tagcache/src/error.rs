//! Error types for cache operations.

use tagcache_backend::StoreError;
use thiserror::Error;

/// Error type for coordinator and repository operations.
///
/// Store failures are passed through unchanged; the cache never retries and
/// never turns a failed read into a miss on its own.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The store adapter failed, including payload decoding and rejected
    /// tag sets.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A URI given to the cache could not be parsed or completed.
    #[error("invalid uri `{0}`")]
    InvalidUri(String),

    /// The settings select a store other than the one the repository holds.
    #[error("settings select store `{configured}`, but the repository holds `{actual}`")]
    StoreMismatch {
        /// Store named in the settings.
        configured: String,
        /// Label of the repository's store.
        actual: String,
    },

    /// Settings could not be loaded.
    #[error("invalid cache settings: {0}")]
    Settings(String),
}
