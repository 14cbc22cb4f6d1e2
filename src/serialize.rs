//! Serializer capability for the object layer.
//!
//! Values are stored as human-readable text rather than a binary encoding
//! so blobs stay inspectable through any generic store browser.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

/// Encodes and decodes stored objects as text.
pub trait Serializer: Send + Sync {
    fn marshal<T: Serialize>(&self, value: &T) -> Result<String>;
    fn unmarshal<T: DeserializeOwned>(&self, text: &str) -> Result<T>;
}

/// Default serializer: JSON via `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn marshal<T: Serialize>(&self, value: &T) -> Result<String> {
        serde_json::to_string(value).map_err(|err| Error::Serialization(err.to_string()))
    }

    fn unmarshal<T: DeserializeOwned>(&self, text: &str) -> Result<T> {
        serde_json::from_str(text).map_err(|err| Error::Deserialization(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn round_trips_json() {
        let serializer = JsonSerializer;
        let text = serializer.marshal(&vec![1u32, 2, 3]).unwrap();
        let back: Vec<u32> = serializer.unmarshal(&text).unwrap();
        assert_eq!(back, vec![1, 2, 3]);
    }

    #[test]
    fn marshal_failure_is_serialization_error() {
        // JSON object keys must be strings; tuple keys cannot encode.
        let mut bad = HashMap::new();
        bad.insert((1u8, 2u8), "x");
        let err = JsonSerializer.marshal(&bad).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn unmarshal_failure_is_deserialization_error() {
        let err = JsonSerializer.unmarshal::<Vec<u32>>("{not json").unwrap_err();
        assert!(matches!(err, Error::Deserialization(_)));
    }
}
