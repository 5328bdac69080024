use thiserror::Error;

/// Errors returned when decoding hexadecimal text.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum DecodeError {
    /// The hexadecimal text does not split into 2-character groups.
    #[error("hex payload length must be even, got {len} characters")]
    OddLength { len: usize },
    /// A character outside `[0-9a-fA-F]` appeared in the payload.
    #[error("hex payload contains invalid character `{character}` at offset {offset}")]
    InvalidCharacter { character: char, offset: usize },
}

/// Errors returned when a value does not fit its encoded width.
#[derive(Debug, Error, Clone, Copy, Eq, PartialEq)]
pub enum RangeError {
    /// The value needs more bytes than the requested width.
    #[error("value {value:#x} does not fit in {width} big-endian bytes")]
    DoesNotFit { value: u64, width: usize },
}

/// Decodes hexadecimal text into bytes.
///
/// Input is interpreted as consecutive 2-character groups, case-insensitive.
///
/// # Errors
///
/// Returns an error when the text has odd length or contains a non-hex
/// character.
///
/// ```
/// use blegate::decode_hex;
///
/// let bytes = decode_hex("adBAcd02")?;
/// assert_eq!(vec![0xAD, 0xBA, 0xCD, 0x02], bytes);
/// # Ok::<(), blegate::DecodeError>(())
/// ```
pub fn decode_hex(text: &str) -> Result<Vec<u8>, DecodeError> {
    hex::decode(text).map_err(|error| match error {
        hex::FromHexError::InvalidHexCharacter { c, index } => DecodeError::InvalidCharacter {
            character: c,
            offset: index,
        },
        hex::FromHexError::OddLength | hex::FromHexError::InvalidStringLength => {
            DecodeError::OddLength { len: text.len() }
        }
    })
}

/// Encodes bytes as lowercase hexadecimal text.
///
/// Round-trips with [`decode_hex`].
///
/// ```
/// use blegate::encode_hex;
///
/// assert_eq!("adbacd02", encode_hex(&[0xAD, 0xBA, 0xCD, 0x02]));
/// ```
#[must_use]
pub fn encode_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Removes one leading `0x`/`0X` marker, if present.
///
/// Text without a marker is returned unchanged; this is never an error.
///
/// ```
/// use blegate::strip_hex_marker;
///
/// assert_eq!("aabb", strip_hex_marker("0xaabb"));
/// assert_eq!("aabb", strip_hex_marker("aabb"));
/// ```
#[must_use]
pub fn strip_hex_marker(text: &str) -> &str {
    text.strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text)
}

/// Encodes a non-negative integer as big-endian bytes of a fixed width.
///
/// Widths larger than 8 bytes are zero-padded on the left.
///
/// # Errors
///
/// Returns an error when `value` needs more than `width` bytes.
///
/// ```
/// use blegate::encode_big_endian;
///
/// assert_eq!(vec![0x06, 0x01], encode_big_endian(0x0601, 2)?);
/// # Ok::<(), blegate::RangeError>(())
/// ```
pub fn encode_big_endian(value: u64, width: usize) -> Result<Vec<u8>, RangeError> {
    if width < 8 && value >> (8 * width) != 0 {
        return Err(RangeError::DoesNotFit { value, width });
    }

    let raw = value.to_be_bytes();
    if width <= raw.len() {
        return Ok(raw[raw.len() - width..].to_vec());
    }

    let mut encoded = vec![0u8; width - raw.len()];
    encoded.extend_from_slice(&raw);
    Ok(encoded)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(vec![])]
    #[case(vec![0x00])]
    #[case(vec![0xAD, 0xBA, 0xCD, 0x02, 0xC0, 0x01, 0x06, 0x01])]
    #[case((0u16..=255).map(|value| value as u8).collect())]
    fn decode_inverts_encode(#[case] bytes: Vec<u8>) {
        let round_tripped = decode_hex(&encode_hex(&bytes)).expect("encoded hex should decode");
        assert_eq!(bytes, round_tripped);
    }

    #[test]
    fn decode_is_case_insensitive() {
        assert_eq!(
            decode_hex("aabbcc").expect("lowercase should decode"),
            decode_hex("AABBCC").expect("uppercase should decode"),
        );
    }

    #[rstest]
    #[case("a", 1)]
    #[case("aabbc", 5)]
    fn decode_rejects_odd_length(#[case] text: &str, #[case] expected_len: usize) {
        let result = decode_hex(text);
        assert_matches!(result, Err(DecodeError::OddLength { len }) if len == expected_len);
    }

    #[rstest]
    #[case("zz", 'z', 0)]
    #[case("aag1", 'g', 2)]
    fn decode_rejects_non_hex_characters(
        #[case] text: &str,
        #[case] expected_character: char,
        #[case] expected_offset: usize,
    ) {
        let result = decode_hex(text);
        assert_matches!(
            result,
            Err(DecodeError::InvalidCharacter { character, offset })
            if character == expected_character && offset == expected_offset
        );
    }

    #[rstest]
    #[case("0xAABB", "AABB")]
    #[case("0XAABB", "AABB")]
    #[case("AABB", "AABB")]
    #[case("", "")]
    fn strip_hex_marker_removes_at_most_one_marker(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(expected, strip_hex_marker(text));
    }

    #[rstest]
    #[case(0x00, 1, vec![0x00])]
    #[case(0x0601, 2, vec![0x06, 0x01])]
    #[case(0x084E20, 3, vec![0x08, 0x4E, 0x20])]
    #[case(0x01, 10, vec![0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01])]
    fn encode_big_endian_produces_fixed_width(
        #[case] value: u64,
        #[case] width: usize,
        #[case] expected: Vec<u8>,
    ) {
        let encoded = encode_big_endian(value, width).expect("value should fit requested width");
        assert_eq!(expected, encoded);
    }

    #[rstest]
    #[case(0x100, 1)]
    #[case(0x01_0000, 2)]
    #[case(0x01, 0)]
    fn encode_big_endian_rejects_oversized_values(#[case] value: u64, #[case] width: usize) {
        let result = encode_big_endian(value, width);
        assert_matches!(
            result,
            Err(RangeError::DoesNotFit { value: rejected, width: rejected_width })
            if rejected == value && rejected_width == width
        );
    }
}
