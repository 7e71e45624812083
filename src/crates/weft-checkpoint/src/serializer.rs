//! Serialization protocol for checkpoint records

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Protocol for encoding and decoding checkpoint data
///
/// Backends that persist bytes (files, databases, object stores) encode
/// through this trait so the wire format can be swapped without touching
/// storage logic.
pub trait SerializerProtocol: Send + Sync {
    /// Serialize a value to bytes
    fn dumps<T: Serialize>(&self, value: &T) -> Result<Vec<u8>>;

    /// Deserialize a value from bytes
    fn loads<T: for<'de> Deserialize<'de>>(&self, data: &[u8]) -> Result<T>;
}

/// JSON-based serializer (default)
///
/// Produces one self-describing JSON document per record, which keeps on-disk
/// logs line-oriented and inspectable with standard tooling.
#[derive(Debug, Clone, Default)]
pub struct JsonSerializer;

impl JsonSerializer {
    pub fn new() -> Self {
        Self
    }
}

impl SerializerProtocol for JsonSerializer {
    fn dumps<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    fn loads<T: for<'de> Deserialize<'de>>(&self, data: &[u8]) -> Result<T> {
        Ok(serde_json::from_slice(data)?)
    }
}

/// Compact binary serializer using bincode
#[derive(Debug, Clone, Default)]
pub struct BincodeSerializer;

impl BincodeSerializer {
    pub fn new() -> Self {
        Self
    }
}

impl SerializerProtocol for BincodeSerializer {
    fn dumps<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        Ok(bincode::serialize(value)?)
    }

    fn loads<T: for<'de> Deserialize<'de>>(&self, data: &[u8]) -> Result<T> {
        Ok(bincode::deserialize(data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Record {
        thread_id: String,
        step: u64,
    }

    fn sample() -> Record {
        Record {
            thread_id: "thread-1".to_string(),
            step: 4,
        }
    }

    #[test]
    fn test_json_roundtrip() {
        let serializer = JsonSerializer::new();
        let bytes = serializer.dumps(&sample()).unwrap();
        let restored: Record = serializer.loads(&bytes).unwrap();
        assert_eq!(restored, sample());
    }

    #[test]
    fn test_bincode_roundtrip() {
        let serializer = BincodeSerializer::new();
        let bytes = serializer.dumps(&sample()).unwrap();
        let restored: Record = serializer.loads(&bytes).unwrap();
        assert_eq!(restored, sample());
    }
}
