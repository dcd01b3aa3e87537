//! SASL PLAIN authentication helpers.
//!
//! The client authenticates during capability negotiation: after the
//! server acknowledges `sasl`, it sends `AUTHENTICATE PLAIN`, waits for
//! the `AUTHENTICATE +` continuation and answers with the encoded
//! credentials.
//!
//! # Reference
//! - IRCv3 SASL: <https://ircv3.net/specs/extensions/sasl-3.2>
//! - RFC 4616 (PLAIN): <https://tools.ietf.org/html/rfc4616>
//!
//! # Example
//!
//! ```
//! use slirc_client::sasl::{encode_plain, response_chunks};
//!
//! let encoded = encode_plain("bot", "bot", "hunter2");
//! assert_eq!(encoded, "Ym90AGJvdABodW50ZXIy");
//! assert_eq!(response_chunks(&encoded), vec!["Ym90AGJvdABodW50ZXIy"]);
//! ```

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

/// Maximum length of a single SASL message chunk (400 bytes).
///
/// SASL responses that exceed this length must be split into multiple
/// AUTHENTICATE commands.
pub const SASL_CHUNK_SIZE: usize = 400;

/// Mechanism name sent in the first `AUTHENTICATE`.
pub const PLAIN: &str = "PLAIN";

/// Encode credentials for the PLAIN mechanism.
///
/// * `authzid` - The authorization identity (who to act as, the nickname)
/// * `authcid` - The authentication identity (the account)
/// * `password` - The password
pub fn encode_plain(authzid: &str, authcid: &str, password: &str) -> String {
    let payload = format!("{}\0{}\0{}", authzid, authcid, password);
    BASE64.encode(payload.as_bytes())
}

/// Split an encoded SASL response into the arguments of successive
/// `AUTHENTICATE` lines.
///
/// When the response length is an exact multiple of the chunk size
/// (including zero), a final `+` tells the server nothing more follows.
pub fn response_chunks(encoded: &str) -> Vec<&str> {
    let mut chunks: Vec<&str> = encoded
        .as_bytes()
        .chunks(SASL_CHUNK_SIZE)
        .filter_map(|chunk| std::str::from_utf8(chunk).ok())
        .collect();

    if encoded.len() % SASL_CHUNK_SIZE == 0 {
        chunks.push("+");
    }
    chunks
}

/// Decode a base64-encoded SASL payload. `+` decodes to nothing.
pub fn decode_base64(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    if encoded == "+" {
        return Ok(Vec::new());
    }
    BASE64.decode(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_payload_layout() {
        let encoded = encode_plain("nick", "account", "secret");
        let decoded = decode_base64(&encoded).unwrap();
        assert_eq!(decoded, b"nick\0account\0secret");
    }

    #[test]
    fn test_short_response_single_chunk() {
        let encoded = encode_plain("a", "a", "b");
        assert_eq!(response_chunks(&encoded), vec![encoded.as_str()]);
    }

    #[test]
    fn test_long_response_is_chunked() {
        let encoded = "A".repeat(SASL_CHUNK_SIZE + 10);
        let chunks = response_chunks(&encoded);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), SASL_CHUNK_SIZE);
        assert_eq!(chunks[1].len(), 10);
    }

    #[test]
    fn test_exact_multiple_ends_with_plus() {
        let encoded = "A".repeat(SASL_CHUNK_SIZE * 2);
        let chunks = response_chunks(&encoded);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2], "+");
        assert_eq!(response_chunks(""), vec!["+"]);
    }
}
