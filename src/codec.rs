//! Conversion between the transport-safe text encoding (standard base64, optionally wrapped in
//! a `data:` URL) and raw bytes.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;

use crate::core::Result;

/// Standard alphabet, padding optional on input, always emitted on output.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decoded bytes together with the media type they should be served as.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    pub bytes: Vec<u8>,
    pub media_type: String,
}

/// Decodes `encoded` into raw bytes.
///
/// A `<meta>,<payload>` prefix (as in `data:image/png;base64,iVBO...`) is stripped first.
/// ASCII whitespace inside the payload is ignored.
pub fn decode(encoded: &str) -> Result<Vec<u8>> {
    let (_, payload) = split_data_url(encoded);
    let compact: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    Ok(LENIENT.decode(compact)?)
}

/// Decodes `encoded` into a [`Payload`].
///
/// The media type declared in a `data:` prefix wins over `media_type`.
pub fn decode_payload(encoded: &str, media_type: &str) -> Result<Payload> {
    let declared = split_data_url(encoded)
        .0
        .and_then(declared_media_type)
        .unwrap_or(media_type);
    Ok(Payload {
        media_type: declared.to_string(),
        bytes: decode(encoded)?,
    })
}

pub fn encode(bytes: &[u8]) -> String {
    LENIENT.encode(bytes)
}

fn split_data_url(encoded: &str) -> (Option<&str>, &str) {
    match encoded.split_once(',') {
        Some((meta, payload)) => (Some(meta), payload),
        None => (None, encoded),
    }
}

// "data:image/png;base64" -> "image/png"
fn declared_media_type(meta: &str) -> Option<&str> {
    let meta = meta.trim().strip_prefix("data:")?;
    let media_type = meta.split(';').next()?.trim();
    (!media_type.is_empty()).then_some(media_type)
}
