use std::result::Result as StdResult;

use nom::{
    IResult,
    bytes::complete::take_while_m_n,
    character::complete::multispace0,
    combinator::{all_consuming, map, map_res, not},
    multi::count,
    sequence::{preceded, terminated, tuple},
    error::context,
};

use super::program::{ObjectFile, Program};

pub use crate::error::ParseError;

type Result<'a, T> = IResult<&'a str, T, ParseError>;

fn is_hex_digit(c: char) -> bool {
    c.is_ascii_hexdigit()
}

/// A two digit hex token and the whitespace delimiting it from the next one.
fn hex_pair(input: &str) -> Result<u8> {
    terminated(
        map_res(
            take_while_m_n(2, 2, is_hex_digit),
            |digits| u8::from_str_radix(digits, 16),
        ),
        terminated(not(take_while_m_n(1, 1, is_hex_digit)), multispace0),
    )(input)
}

fn address(input: &str) -> Result<u16> {
    map(
        tuple((hex_pair, hex_pair)),
        |(high, low)| u16::from_be_bytes([high, low]),
    )(input)
}

fn object_file(input: &str) -> Result<ObjectFile> {
    let (input, start) = context("start address", preceded(multispace0, address))(input)?;
    let (input, length) = context("length", hex_pair)(input)?;
    let (input, payload) = context("payload", count(hex_pair, length as usize))(input)?;
    let (input, checksum) = context("checksum", hex_pair)(input)?;

    Ok((input, ObjectFile {
        program: Program { start, payload },
        checksum,
    }))
}

pub(crate) fn parse_object_file(input: &str) -> StdResult<ObjectFile, ParseError> {
    match all_consuming(object_file)(input) {
        Ok((_, object)) => Ok(object),
        Err(nom::Err::Error(err)) | Err(nom::Err::Failure(err)) => Err(err),
        Err(nom::Err::Incomplete(_)) => Err(ParseError::incomplete()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_object_file() {
        let object = parse_object_file("01 00 04 05 81 00 B0 3B \n").unwrap();

        assert_eq!(object.program.start, 0x100);
        assert_eq!(object.program.payload, vec![0x05, 0x81, 0x00, 0xB0]);
        assert_eq!(object.checksum, 0x3B);
        assert!(object.is_valid());
    }

    #[test]
    fn test_parse_lowercase_and_newlines() {
        let object = parse_object_file("0f\nc0 01\n ff 42").unwrap();

        assert_eq!(object.program.start, 0xFC0);
        assert_eq!(object.program.payload, vec![0xFF]);
        assert_eq!(object.checksum, 0x42);
        assert!(!object.is_valid());
    }

    #[test]
    fn test_parse_empty_payload() {
        let object = parse_object_file("00 10 00 10 ").unwrap();

        assert!(object.program.payload.is_empty());
        assert!(object.is_valid());
    }

    #[test]
    fn test_parse_truncated() {
        let input = "00 00 03 01 02 ";
        let err = parse_object_file(input).unwrap_err();

        assert_eq!(err.token_index(input), 5);
        assert!(err.to_string().contains("payload"), "{}", err);
    }

    #[test]
    fn test_parse_rejects_long_tokens() {
        assert!(parse_object_file("000 00 00 00").is_err());
    }

    #[test]
    fn test_parse_rejects_trailing_tokens() {
        assert!(parse_object_file("00 00 00 00 00").is_err());
    }
}
