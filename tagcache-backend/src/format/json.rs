use bytes::Bytes;
use serde::{Serialize, de::DeserializeOwned};
use tagcache_core::Raw;

use super::{Format, FormatError};

/// JSON format (default)
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl Format for JsonFormat {
    fn serialize<T>(&self, value: &T) -> Result<Raw, FormatError>
    where
        T: Serialize,
    {
        serde_json::to_vec(value)
            .map(Bytes::from)
            .map_err(|err| FormatError::Serialize(Box::new(err)))
    }

    fn deserialize<T>(&self, data: &[u8]) -> Result<T, FormatError>
    where
        T: DeserializeOwned,
    {
        serde_json::from_slice(data).map_err(|err| FormatError::Deserialize(Box::new(err)))
    }

    fn name(&self) -> &'static str {
        "json"
    }
}
