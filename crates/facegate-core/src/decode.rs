//! Image payload decoding.
//!
//! Enrollment and verification requests carry the captured frame as a
//! base64 string, optionally wrapped in a `data:image/...;base64,` header
//! as produced by browser canvas captures. The decoder strips the header,
//! reverses the base64 transport encoding, and parses the contained
//! PNG/JPEG/... bytes into an 8-bit RGB pixel grid.
//!
//! Channel order is RGB throughout. The descriptor downstream is
//! channel-order-sensitive, so enrollment and verification must (and do)
//! run through this same decoder.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::RgbImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("image payload is empty")]
    EmptyPayload,
    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("bytes are not a decodable image: {0}")]
    UnreadableImage(#[from] image::ImageError),
}

/// Decode a base64 image payload, stripping an optional data-URI header.
///
/// Anything up to and including the first `,` is treated as the header
/// (`data:image/png;base64,...`) and discarded.
pub fn decode_payload(payload: &str) -> Result<RgbImage, DecodeError> {
    let trimmed = payload.trim();
    if trimmed.is_empty() {
        return Err(DecodeError::EmptyPayload);
    }

    let encoded = match trimmed.split_once(',') {
        Some((_header, rest)) => rest,
        None => trimmed,
    };

    let bytes = STANDARD.decode(encoded)?;
    decode_bytes(&bytes)
}

/// Decode raw encoded image bytes (PNG, JPEG, ...) into an RGB grid.
pub fn decode_bytes(bytes: &[u8]) -> Result<RgbImage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::EmptyPayload);
    }
    let img = image::load_from_memory(bytes)?;
    Ok(img.to_rgb8())
}
