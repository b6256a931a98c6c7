//! Content-Transfer-Encoding decoders (RFC 2045).
//!
//! Both decoders fail open: content that cannot be decoded is returned
//! unchanged so a bad part never aborts its message.

use base64::Engine;
use tracing::warn;

/// Decode body content according to its `Content-Transfer-Encoding`.
///
/// `quoted-printable` and `base64` are decoded; every other value (`7bit`,
/// `8bit`, `binary`, missing, unknown) is the identity.
pub fn decode_body(content: &str, encoding: &str) -> String {
    match encoding.trim().to_lowercase().as_str() {
        "base64" => decode_base64(content),
        "quoted-printable" => decode_quoted_printable(content),
        _ => content.to_string(),
    }
}

/// Decode base64 content, tolerating embedded line breaks and whitespace.
///
/// On decode failure the original content is returned unchanged.
pub fn decode_base64(content: &str) -> String {
    let cleaned: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    match base64::engine::general_purpose::STANDARD.decode(cleaned.as_bytes()) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(err) => {
            warn!(%err, "Failed to decode base64 content, passing through");
            content.to_string()
        }
    }
}

/// Decode quoted-printable content: soft line breaks (`=` at end of line)
/// are removed, then every `=XX` hex escape becomes the corresponding byte.
///
/// Invalid escapes are kept literally. The decoded bytes are read as UTF-8
/// (lossy), matching the crate-wide no-charset policy.
pub fn decode_quoted_printable(content: &str) -> String {
    let unfolded = content.replace("=\r\n", "").replace("=\n", "");

    let bytes = unfolded.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'=' && i + 3 <= bytes.len() {
            if let Some(byte) = hex_pair(bytes[i + 1], bytes[i + 2]) {
                result.push(byte);
                i += 3;
                continue;
            }
        }
        result.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&result).into_owned()
}

/// Parse two ASCII hex digits into a byte.
pub(crate) fn hex_pair(hi: u8, lo: u8) -> Option<u8> {
    let hi = (hi as char).to_digit(16)?;
    let lo = (lo as char).to_digit(16)?;
    Some((hi * 16 + lo) as u8)
}
