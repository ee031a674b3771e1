//! Base64 payload encoding used by the Gmail API
//!
//! Gmail exchanges message bodies and raw messages as standard Base64 with
//! `+` replaced by `-` and `/` replaced by `_`. The substitution is applied
//! after encoding and undone before decoding, so the output is bit-for-bit
//! what the service expects.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::{DecodeError, Engine};

/// Errors from decoding a payload
#[derive(Debug, thiserror::Error)]
pub enum MimeError {
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] DecodeError),
    #[error("payload is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Encode bytes in the service's URL-safe alphabet (padded)
pub fn encode(data: &[u8]) -> String {
    STANDARD.encode(data).replace('+', "-").replace('/', "_")
}

/// Decode a URL-safe payload back into bytes.
///
/// Padding is optional; some parts arrive without it.
pub fn decode(data: &str) -> Result<Vec<u8>, MimeError> {
    let standard = data.trim().replace('-', "+").replace('_', "/");
    match STANDARD.decode(&standard) {
        Ok(bytes) => Ok(bytes),
        Err(_) => Ok(STANDARD_NO_PAD.decode(standard.trim_end_matches('='))?),
    }
}

/// Decode a payload that is expected to hold UTF-8 text
pub fn decode_to_string(data: &str) -> Result<String, MimeError> {
    Ok(String::from_utf8(decode(data)?)?)
}
