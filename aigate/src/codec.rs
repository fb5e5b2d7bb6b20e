//! Base64 helpers for moving binary payloads through JSON.

use base64::{Engine as _, engine::general_purpose};

use crate::errors::Result;

/// Encode bytes with the standard, padded alphabet.
pub fn to_base64(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

/// Decode standard base64, ignoring surrounding whitespace.
pub fn from_base64(text: &str) -> Result<Vec<u8>> {
    Ok(general_purpose::STANDARD.decode(text.trim())?)
}
