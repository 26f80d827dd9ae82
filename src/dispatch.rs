//! Response dispatcher
//!
//! Turns a raw response body into a typed value: parse once into a generic
//! JSON document, then hand the document to a pure extraction function.
//! Endpoints that answer "nothing here" with a fixed-size payload can skip
//! parsing entirely by declaring that payload's byte length.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Parse `body` and apply `extract`.
///
/// A body that is not valid JSON fails with `Parse` and `extract` is never
/// called.
pub fn dispatch<T, F>(body: &[u8], extract: F) -> Result<T>
where
    F: FnOnce(Value) -> Result<T>,
{
    let document: Value = serde_json::from_slice(body)
        .map_err(|e| Error::parse(format!("Invalid JSON body ({} bytes): {e}", body.len())))?;
    extract(document)
}

/// Like [`dispatch`], but a body of exactly `expected_empty_len` bytes yields
/// `empty` without being parsed. A length of 0 disables the check.
pub fn dispatch_or_empty<T, F>(
    body: &[u8],
    expected_empty_len: usize,
    empty: T,
    extract: F,
) -> Result<T>
where
    F: FnOnce(Value) -> Result<T>,
{
    if expected_empty_len > 0 && body.len() == expected_empty_len {
        return Ok(empty);
    }
    dispatch(body, extract)
}

/// Extraction function that deserializes the whole document into `T`
pub fn deserialize<T: DeserializeOwned>(document: Value) -> Result<T> {
    serde_json::from_value(document).map_err(|e| Error::parse(e.to_string()))
}
