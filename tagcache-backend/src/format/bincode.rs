use bytes::Bytes;
use serde::{Serialize, de::DeserializeOwned};
use tagcache_core::Raw;

use super::{Format, FormatError};

/// Compact binary format backed by bincode's serde bridge.
///
/// Bincode is not self-describing: payload types must not rely on
/// `deserialize_any` (untagged enums, flattened maps).
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeFormat;

impl Format for BincodeFormat {
    fn serialize<T>(&self, value: &T) -> Result<Raw, FormatError>
    where
        T: Serialize,
    {
        ::bincode::serde::encode_to_vec(value, ::bincode::config::standard())
            .map(Bytes::from)
            .map_err(|err| FormatError::Serialize(Box::new(err)))
    }

    fn deserialize<T>(&self, data: &[u8]) -> Result<T, FormatError>
    where
        T: DeserializeOwned,
    {
        ::bincode::serde::decode_from_slice(data, ::bincode::config::standard())
            .map(|(value, _read)| value)
            .map_err(|err| FormatError::Deserialize(Box::new(err)))
    }

    fn name(&self) -> &'static str {
        "bincode"
    }
}
