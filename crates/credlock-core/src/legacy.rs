//! The Rails encrypted-credentials envelope.
//!
//! Text format `base64(ciphertext)--base64(nonce)--base64(tag)`, exactly
//! three segments. Read-only: this system consumes the format for migration
//! and never produces it.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::{Error, Result};

const SEGMENT_DELIMITER: &str = "--";

/// A split legacy envelope. The producer stores ciphertext and tag as
/// separate fields rather than one trailing block.
#[derive(Debug)]
pub struct LegacyEnvelope {
    pub ciphertext: Vec<u8>,
    pub nonce: Vec<u8>,
    pub tag: Vec<u8>,
}

impl LegacyEnvelope {
    /// Ciphertext followed by tag: the single buffer the AEAD open expects.
    pub fn recombine(&self) -> Vec<u8> {
        let mut combined = Vec::with_capacity(self.ciphertext.len() + self.tag.len());
        combined.extend_from_slice(&self.ciphertext);
        combined.extend_from_slice(&self.tag);
        combined
    }
}

/// Split a legacy envelope into its three decoded segments.
///
/// # Errors
///
/// [`Error::EnvelopeFormat`] on anything other than exactly three
/// `--`-delimited segments, or when any segment is not valid base64.
pub fn split(text: &str) -> Result<LegacyEnvelope> {
    let segments: Vec<&str> = text.trim().split(SEGMENT_DELIMITER).collect();
    if segments.len() != 3 {
        return Err(Error::EnvelopeFormat(format!(
            "expected 3 '--'-delimited segments, got {}",
            segments.len()
        )));
    }

    Ok(LegacyEnvelope {
        ciphertext: decode_segment(segments[0], "ciphertext")?,
        nonce: decode_segment(segments[1], "nonce")?,
        tag: decode_segment(segments[2], "auth tag")?,
    })
}

fn decode_segment(segment: &str, what: &str) -> Result<Vec<u8>> {
    STANDARD.decode(segment).map_err(|e| {
        Error::EnvelopeFormat(format!("{} segment is not valid base64: {}", what, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope_text(ciphertext: &[u8], nonce: &[u8], tag: &[u8]) -> String {
        format!(
            "{}--{}--{}",
            STANDARD.encode(ciphertext),
            STANDARD.encode(nonce),
            STANDARD.encode(tag)
        )
    }

    #[test]
    fn split_recovers_all_three_segments() {
        let text = envelope_text(b"cipher", b"twelve_bytes", b"sixteen_tag_byte");
        let envelope = split(&text).unwrap();
        assert_eq!(envelope.ciphertext, b"cipher");
        assert_eq!(envelope.nonce, b"twelve_bytes");
        assert_eq!(envelope.tag, b"sixteen_tag_byte");
    }

    #[test]
    fn split_tolerates_trailing_newline() {
        let text = format!("{}\n", envelope_text(b"c", b"n", b"t"));
        assert!(split(&text).is_ok());
    }

    #[test]
    fn recombine_is_ciphertext_then_tag() {
        let envelope = LegacyEnvelope {
            ciphertext: b"abc".to_vec(),
            nonce: b"n".to_vec(),
            tag: b"XYZ".to_vec(),
        };
        assert_eq!(envelope.recombine(), b"abcXYZ");
    }

    #[test]
    fn two_segments_rejected() {
        let text = format!("{}--{}", STANDARD.encode(b"a"), STANDARD.encode(b"b"));
        let err = split(&text).unwrap_err();
        assert!(matches!(err, Error::EnvelopeFormat(_)));
    }

    #[test]
    fn four_segments_rejected() {
        let part = STANDARD.encode(b"x");
        let text = format!("{0}--{0}--{0}--{0}", part);
        let err = split(&text).unwrap_err();
        assert!(matches!(err, Error::EnvelopeFormat(_)));
    }

    #[test]
    fn bad_base64_in_any_segment_rejected() {
        let good = STANDARD.encode(b"ok");
        for text in [
            format!("!!!--{0}--{0}", good),
            format!("{0}--!!!--{0}", good),
            format!("{0}--{0}--!!!", good),
        ] {
            let err = split(&text).unwrap_err();
            assert!(matches!(err, Error::EnvelopeFormat(_)));
        }
    }
}
