//! Error types for store operations.

use crate::format::FormatError;
use thiserror::Error;

/// Error type for store operations.
///
/// Groups the failures a store adapter can surface. The response cache never
/// retries any of them; they are propagated to the caller verbatim.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Internal store error, state or computation error.
    ///
    /// Any error not related to network interaction.
    #[error(transparent)]
    InternalError(Box<dyn std::error::Error + Send + Sync>),

    /// Network interaction error.
    ///
    /// Errors occurring during communication with remote stores.
    #[error(transparent)]
    ConnectionError(Box<dyn std::error::Error + Send + Sync>),

    /// Serialization or deserialization of a cached payload failed.
    #[error(transparent)]
    FormatError(#[from] FormatError),

    /// The store cannot scope entries by the requested tags.
    ///
    /// This is a configuration error: retrying the same call fails again.
    #[error("store `{store}` rejected tag set [{tags}]: {reason}")]
    InvalidTags {
        /// Label of the store that rejected the tags.
        store: String,
        /// The offending tag set, comma separated.
        tags: String,
        /// Why the tags were rejected.
        reason: String,
    },
}
