//! Decoder implementations

use super::types::RecordDecoder;
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;

// ============================================================================
// JSON Decoder
// ============================================================================

/// Decodes a JSON array page into `T`, in server order.
///
/// Most Canvas collections return a bare array. A few wrap it in an
/// object (`{"enrollment_terms": [...]}`); set a record path for those.
pub struct JsonDecoder<T> {
    /// Dot-separated path to the array inside the body
    record_path: Option<String>,
    _item: PhantomData<fn() -> T>,
}

impl<T> JsonDecoder<T> {
    /// Decoder for a bare JSON array
    pub fn new() -> Self {
        Self {
            record_path: None,
            _item: PhantomData,
        }
    }

    /// Decoder for an array nested under `path`
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            record_path: Some(path.into()),
            _item: PhantomData,
        }
    }

    /// The configured record path
    pub fn record_path(&self) -> Option<&str> {
        self.record_path.as_deref()
    }
}

impl<T> Default for JsonDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for JsonDecoder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonDecoder")
            .field("record_path", &self.record_path)
            .finish()
    }
}

impl<T: DeserializeOwned> RecordDecoder<T> for JsonDecoder<T> {
    fn decode(&self, page: usize, body: &[u8]) -> Result<Vec<T>> {
        let Some(path) = &self.record_path else {
            return serde_json::from_slice(body)
                .map_err(|e| Error::decode(page, format!("expected a JSON array: {e}")));
        };

        let value: Value = serde_json::from_slice(body)
            .map_err(|e| Error::decode(page, format!("invalid JSON: {e}")))?;

        match extract_simple_path(&value, path) {
            Some(Value::Array(records)) => records
                .iter()
                .map(|record| serde_json::from_value(record.clone()))
                .collect::<std::result::Result<Vec<T>, _>>()
                .map_err(|e| Error::decode(page, format!("bad record under '{path}': {e}"))),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(_) => Err(Error::decode(
                page,
                format!("value at '{path}' is not an array"),
            )),
        }
    }
}

/// Follow a dot-separated path (optionally prefixed with `$.`)
fn extract_simple_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    if path.is_empty() || path == "$" {
        return Some(value);
    }

    let mut current = value;
    for part in path.split('.') {
        current = match current {
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            other => other.get(part)?,
        };
    }
    Some(current)
}
