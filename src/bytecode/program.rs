use std::fmt;
use std::path::Path;

use super::codec::{checksum, encode_stream};
use super::parser::{parse_object_file, ParseError};
use crate::error::ArtifactError;

/// Largest payload the one byte length field of an object stream can describe.
pub const MAX_PAYLOAD: usize = 0xFF;

/// A loadable program: a block of bytes and the address it is loaded at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    /// The address of the first payload byte.
    pub start: u16,

    /// Instructions and data, at most [MAX_PAYLOAD] bytes.
    pub payload: Vec<u8>,
}

impl Program {
    pub fn new(start: u16, payload: Vec<u8>) -> Program {
        Program { start, payload }
    }

    /// The start address, payload length and payload, i.e. every byte covered by the checksum.
    ///
    /// The payload must be at most [MAX_PAYLOAD] bytes long.
    pub fn to_bytes_unchecked(&self) -> Vec<u8> {
        debug_assert!(
            self.payload.len() <= MAX_PAYLOAD,
            "payload of {} bytes does not fit the length field",
            self.payload.len(),
        );

        let [high, low] = self.start.to_be_bytes();

        let mut bytes = Vec::with_capacity(self.payload.len() + 4);
        bytes.push(high);
        bytes.push(low);
        bytes.push(self.payload.len() as u8);
        bytes.extend_from_slice(&self.payload);

        bytes
    }

    /// The checksum of the program's object stream.
    pub fn checksum(&self) -> u8 {
        checksum(&self.to_bytes_unchecked())
    }

    /// Encodes the program as the bytes of an object stream, checksum included.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.to_bytes_unchecked();
        let checksum = checksum(&bytes);
        bytes.push(checksum);

        bytes
    }

    /// Encodes the program as object stream text.
    pub fn to_object(&self) -> String {
        encode_stream(&self.to_bytes())
    }

    /// Parses object stream text.
    pub fn parse(input: &str) -> Result<ObjectFile, ParseError> {
        parse_object_file(input)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_object())
    }
}

/// What the loader does when the stored checksum of an object stream does not match its
/// contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumPolicy {
    /// Report the mismatch and load the program anyway. This matches the behaviour of the
    /// conventional loader program, whose checksum check is unreliable.
    Advisory,

    /// Refuse to load the program.
    Strict,
}

impl Default for ChecksumPolicy {
    fn default() -> ChecksumPolicy {
        ChecksumPolicy::Advisory
    }
}

/// A parsed object stream together with the checksum it was stored with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectFile {
    pub program: Program,
    pub checksum: u8,
}

impl ObjectFile {
    /// Reads and parses an object file.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<ObjectFile, ArtifactError> {
        let text = std::fs::read_to_string(path)?;
        Ok(Program::parse(&text)?)
    }

    /// True if the stored checksum matches the contents.
    pub fn is_valid(&self) -> bool {
        self.program.checksum() == self.checksum
    }

    /// Checks the stored checksum.
    ///
    /// # Errors
    /// Returns [ArtifactError::Checksum] on a mismatch under [ChecksumPolicy::Strict].
    /// A mismatch is not an error under [ChecksumPolicy::Advisory].
    pub fn verify(&self, policy: ChecksumPolicy) -> Result<(), ArtifactError> {
        match policy {
            ChecksumPolicy::Strict if !self.is_valid() => Err(ArtifactError::Checksum {
                expected: self.program.checksum(),
                actual: self.checksum,
            }),
            _ => Ok(()),
        }
    }
}

impl From<Program> for ObjectFile {
    fn from(program: Program) -> ObjectFile {
        ObjectFile {
            checksum: program.checksum(),
            program,
        }
    }
}
