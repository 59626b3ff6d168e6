//! The hex pair token encoding shared by object streams and device streams.

/// Encodes a byte as a two digit uppercase hex token.
pub fn encode_byte(byte: u8) -> String {
    format!("{:02X}", byte)
}

/// Decodes a two digit hex token. Returns `None` for anything else.
pub fn decode_token(token: &str) -> Option<u8> {
    if token.len() != 2 || !token.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    u8::from_str_radix(token, 16).ok()
}

/// Encodes bytes as a token stream, each token followed by a space delimiter.
pub fn encode_stream(bytes: &[u8]) -> String {
    bytes.iter()
        .map(|byte| format!("{} ", encode_byte(*byte)))
        .collect()
}

/// Sum of the bytes modulo 256.
pub fn checksum<'a, I>(bytes: I) -> u8
    where I: IntoIterator<Item = &'a u8>
{
    bytes.into_iter().fold(0u8, |sum, byte| sum.wrapping_add(*byte))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens() {
        assert_eq!(encode_byte(0x0A), "0A");
        assert_eq!(decode_token("0a"), Some(0x0A));
        assert_eq!(decode_token("FF"), Some(0xFF));
        assert_eq!(decode_token("F"), None);
        assert_eq!(decode_token("FFF"), None);
        assert_eq!(decode_token("+1"), None);
    }

    #[test]
    fn test_encode_stream() {
        assert_eq!(encode_stream(&[0x00, 0x1F, 0xC0]), "00 1F C0 ");
        assert_eq!(encode_stream(&[]), "");
    }

    #[test]
    fn test_checksum_wraps() {
        assert_eq!(checksum(&[0x80, 0x80, 0x05]), 0x05);
        assert_eq!(checksum(&[]), 0x00);
    }
}
