//! Extracts the single string from a Ruby Marshal 4.8 blob.
//!
//! The legacy producer seals `Marshal.dump` of the YAML text rather than the
//! text itself, so a decrypted legacy payload carries a Marshal wrapper.
//! Only the subset needed for one ASCII-8BIT string is understood here:
//! version header, string type tag, length, payload. Everything else is
//! rejected with a typed error; truncated input never reads out of bounds.

use crate::error::{Error, Result};

/// Marshal 4.8 version header.
const HEADER: [u8; 2] = [0x04, 0x08];

/// Type tag for a raw (ASCII-8BIT) string: `"`.
const TYPE_BINARY_STRING: u8 = 0x22;

// Length-indicator sentinels. 0x02/0x03/0x04 select a trailing little-endian
// length field of 2, 3, or 4 bytes; 0x01 and the negative markers 0xfc-0xff
// are rejected. Any other value encodes `payload_length + 5` inline.
const LEN_U16: u8 = 0x02;
const LEN_U24: u8 = 0x03;
const LEN_U32: u8 = 0x04;
const LEN_REJECTED: [u8; 5] = [0x01, 0xfc, 0xfd, 0xfe, 0xff];

/// Smallest inline indicator: `0 + 5`, the empty string.
const INLINE_BASE: u8 = 5;

/// Unwrap a Marshal blob down to its string payload.
pub fn decode(buf: &[u8]) -> Result<Vec<u8>> {
    if buf.len() < 4 {
        return Err(Error::ObjectFormat(format!(
            "payload too short for header: {} bytes",
            buf.len()
        )));
    }
    if buf[..2] != HEADER {
        return Err(Error::ObjectFormat(format!(
            "bad version header 0x{:02x}{:02x}",
            buf[0], buf[1]
        )));
    }
    if buf[2] != TYPE_BINARY_STRING {
        return Err(Error::UnsupportedObject(buf[2]));
    }

    let indicator = buf[3];
    match indicator {
        // All three fixed-width branches honor only the low 16 bits of the
        // length field; the payload offset still accounts for the declared
        // field width. Existing stores decode against exactly this reading,
        // so it is pinned here and in the tests below.
        LEN_U16 => extract(buf, 6),
        LEN_U24 => extract(buf, 7),
        LEN_U32 => extract(buf, 8),
        _ if LEN_REJECTED.contains(&indicator) => {
            Err(Error::UnsupportedLengthEncoding(indicator))
        }
        _ if indicator < INLINE_BASE => Err(Error::ObjectFormat(format!(
            "invalid inline length indicator 0x{:02x}",
            indicator
        ))),
        // Inline: the indicator itself is `payload_length + 5`, with the
        // payload bytes starting immediately at offset 4.
        _ => {
            let end = indicator as usize - 1;
            if buf.len() < end {
                return Err(Error::ObjectFormat(format!(
                    "inline length runs past the payload: need {} bytes, have {}",
                    end,
                    buf.len()
                )));
            }
            Ok(buf[4..end].to_vec())
        }
    }
}

/// Read a little-endian u16 length at offset 4 and take `length` payload
/// bytes starting at `payload_start`.
fn extract(buf: &[u8], payload_start: usize) -> Result<Vec<u8>> {
    if buf.len() < 6 {
        return Err(Error::ObjectFormat(
            "payload truncated inside the length field".to_string(),
        ));
    }
    let length = u16::from_le_bytes([buf[4], buf[5]]) as usize;

    let end = payload_start + length;
    if buf.len() < end {
        return Err(Error::ObjectFormat(format!(
            "declared length {} runs past the payload: need {} bytes, have {}",
            length,
            end,
            buf.len()
        )));
    }
    Ok(buf[payload_start..end].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Header + string tag, ready for a length indicator and payload.
    fn prefix() -> Vec<u8> {
        vec![0x04, 0x08, TYPE_BINARY_STRING]
    }

    #[test]
    fn inline_length_extracts_payload() {
        let payload = b"token: abc123\n";
        let mut buf = prefix();
        buf.push(payload.len() as u8 + 5);
        buf.extend_from_slice(payload);

        assert_eq!(decode(&buf).unwrap(), payload);
    }

    #[test]
    fn inline_empty_string() {
        let mut buf = prefix();
        buf.push(INLINE_BASE);
        assert_eq!(decode(&buf).unwrap(), b"");
    }

    #[test]
    fn u16_length_extracts_payload() {
        let payload = vec![0xabu8; 300];
        let mut buf = prefix();
        buf.push(LEN_U16);
        buf.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        buf.extend_from_slice(&payload);

        assert_eq!(decode(&buf).unwrap(), payload);
    }

    #[test]
    fn three_byte_length_field_payload_starts_at_offset_7() {
        let payload = b"database:\n  password: hunter2\n";
        let mut buf = prefix();
        buf.push(LEN_U24);
        buf.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        buf.push(0x00); // high length byte, part of the skipped field
        buf.extend_from_slice(payload);

        assert_eq!(decode(&buf).unwrap(), payload);
    }

    #[test]
    fn four_byte_length_field_payload_starts_at_offset_8() {
        let payload = b"api:\n  token: t0ps3cret\n";
        let mut buf = prefix();
        buf.push(LEN_U32);
        buf.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        buf.extend_from_slice(&[0x00, 0x00]);
        buf.extend_from_slice(payload);

        assert_eq!(decode(&buf).unwrap(), payload);
    }

    #[test]
    fn length_field_reads_low_16_bits() {
        // Garbage in the high byte of a 3-byte length field must not change
        // the decoded length: only buf[4..6] counts.
        let payload = b"short";
        let mut buf = prefix();
        buf.push(LEN_U24);
        buf.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        buf.push(0x7f);
        buf.extend_from_slice(payload);

        assert_eq!(decode(&buf).unwrap(), payload);
    }

    #[test]
    fn wrong_header_rejected() {
        let buf = [0x05, 0x08, TYPE_BINARY_STRING, 0x06, b'x'];
        let err = decode(&buf).unwrap_err();
        assert!(matches!(err, Error::ObjectFormat(_)));
    }

    #[test]
    fn wrong_type_tag_rejected() {
        // 0x49 is the instance-variable marker, which real stores put in
        // front of UTF-8 strings; only the bare binary string is supported.
        let buf = [0x04, 0x08, 0x49, 0x06, b'x'];
        let err = decode(&buf).unwrap_err();
        assert!(matches!(err, Error::UnsupportedObject(0x49)));
    }

    #[test]
    fn each_rejected_length_sentinel() {
        for sentinel in LEN_REJECTED {
            let mut buf = prefix();
            buf.push(sentinel);
            buf.extend_from_slice(&[0u8; 8]);
            let err = decode(&buf).unwrap_err();
            assert!(
                matches!(err, Error::UnsupportedLengthEncoding(s) if s == sentinel),
                "sentinel 0x{:02x}",
                sentinel
            );
        }
    }

    #[test]
    fn truncated_header_rejected() {
        for len in 0..4 {
            let buf = vec![0x04u8; len];
            let err = decode(&buf).unwrap_err();
            assert!(matches!(err, Error::ObjectFormat(_)), "length {}", len);
        }
    }

    #[test]
    fn truncated_length_field_rejected() {
        let mut buf = prefix();
        buf.push(LEN_U16);
        buf.push(0x05); // only one of the two length bytes
        let err = decode(&buf).unwrap_err();
        assert!(matches!(err, Error::ObjectFormat(_)));
    }

    #[test]
    fn declared_length_past_end_rejected() {
        let mut buf = prefix();
        buf.push(LEN_U16);
        buf.extend_from_slice(&100u16.to_le_bytes());
        buf.extend_from_slice(b"only a few bytes");
        let err = decode(&buf).unwrap_err();
        assert!(matches!(err, Error::ObjectFormat(_)));
    }

    #[test]
    fn inline_length_past_end_rejected() {
        let mut buf = prefix();
        buf.push(50); // claims 45 payload bytes
        buf.extend_from_slice(b"ten bytes!");
        let err = decode(&buf).unwrap_err();
        assert!(matches!(err, Error::ObjectFormat(_)));
    }

    #[test]
    fn zero_indicator_rejected_not_panicking() {
        let mut buf = prefix();
        buf.push(0x00);
        let err = decode(&buf).unwrap_err();
        assert!(matches!(err, Error::ObjectFormat(_)));
    }
}
