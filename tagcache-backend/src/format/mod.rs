//! Payload formats.
//!
//! A [`Format`] turns a cached payload into bytes before it reaches a
//! [`Store`](crate::Store), and hydrates it back on read. The repository is
//! generic over its format, which is the override point for custom payload
//! encodings.
//!
//! | Format | Size | Human-readable |
//! |--------|------|----------------|
//! | [`JsonFormat`] | Large | Yes |
//! | [`BincodeFormat`] | Compact | No |

use serde::{Serialize, de::DeserializeOwned};
use tagcache_core::Raw;
use thiserror::Error;

mod bincode;
mod json;

pub use bincode::BincodeFormat;
pub use json::JsonFormat;

/// Error raised while encoding or decoding a cached payload.
#[derive(Error, Debug)]
pub enum FormatError {
    /// The payload could not be encoded.
    #[error(transparent)]
    Serialize(Box<dyn std::error::Error + Send + Sync>),

    /// The stored bytes could not be decoded into the payload type.
    #[error(transparent)]
    Deserialize(Box<dyn std::error::Error + Send + Sync>),
}

/// Encoding used for cached payloads.
pub trait Format: std::fmt::Debug + Send + Sync {
    /// Encodes a payload.
    fn serialize<T>(&self, value: &T) -> Result<Raw, FormatError>
    where
        T: Serialize;

    /// Decodes a payload previously produced by [`Format::serialize`].
    fn deserialize<T>(&self, data: &[u8]) -> Result<T, FormatError>
    where
        T: DeserializeOwned;

    /// Short name of the format, used in log fields.
    fn name(&self) -> &'static str;
}
