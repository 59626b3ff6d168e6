//! Error types shared by the assembler, the object stream codec and the file entry points.

use std::fmt::{self, Display};
use std::io;

use itertools::Itertools;
use nom::error::ErrorKind;

#[derive(Debug, Clone)]
enum InnerError {
    Incomplete,
    Context(&'static str),
    Nom(ErrorKind),
}

impl fmt::Display for InnerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InnerError::Context(ctx) => write!(f, "invalid {}", ctx),
            InnerError::Nom(_err) => write!(f, "unexpected input"),
            InnerError::Incomplete => write!(f, "expected more input"),
        }
    }
}

/// Error produced while parsing an object stream.
///
/// Holds the reason of the error and the length of the unconsumed input, from which
/// [ParseError::offset] recovers the location.
#[derive(Clone, Debug)]
pub struct ParseError {
    stack: Vec<(usize, String, InnerError)>,
}

fn snippet(input: &str) -> String {
    input
        .chars()
        .take_while(|c| *c != '\n')
        .take(20)
        .collect()
}

impl ParseError {
    pub(crate) fn incomplete() -> ParseError {
        ParseError {
            stack: vec![(0, String::new(), InnerError::Incomplete)],
        }
    }

    /// Calculates the byte offset of the error in the original input buffer.
    ///
    /// # Parameters
    /// - `input`: The original input buffer or an exact copy of it.
    pub fn offset(&self, input: &str) -> usize {
        let rest = self.stack.first().map(|(rest, _, _)| *rest).unwrap_or(0);
        input.len().saturating_sub(rest)
    }

    /// Calculates the index of the two digit token at which the error occurred.
    pub fn token_index(&self, input: &str) -> usize {
        input[..self.offset(input)].split_whitespace().count()
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let contexts = self.stack.iter()
            .filter_map(|(_, _, kind)| match kind {
                InnerError::Context(ctx) => Some(*ctx),
                _ => None,
            })
            .rev()
            .join(": ");

        let (_, rest, kind) = match self.stack.first() {
            Some(entry) => entry,
            None => return write!(f, "unknown error"),
        };

        if contexts.is_empty() {
            write!(f, "{} at '{}'", kind, rest)
        } else {
            write!(f, "{}: {} at '{}'", contexts, kind, rest)
        }
    }
}

impl std::error::Error for ParseError {}

impl nom::error::ParseError<&str> for ParseError {
    fn from_error_kind(input: &str, kind: ErrorKind) -> Self {
        ParseError {
            stack: vec![(input.len(), snippet(input), InnerError::Nom(kind))],
        }
    }

    fn append(input: &str, kind: ErrorKind, mut other: Self) -> Self {
        other.stack.push((input.len(), snippet(input), InnerError::Nom(kind)));
        other
    }

    fn add_context(input: &str, ctx: &'static str, mut other: Self) -> Self {
        other.stack.push((input.len(), snippet(input), InnerError::Context(ctx)));
        other
    }
}

/// Reason for rejecting an assembly source.
#[derive(Clone, Debug, PartialEq)]
pub enum AssemblyErrorKind {
    /// A label uses the name of an instruction or a pseudo-instruction.
    ReservedName(String),

    /// A label was declared twice.
    DuplicateSymbol(String),

    /// A label declaration is followed by something other than the constant pseudo-instruction.
    InvalidDirective(String),

    /// The mnemonic is not in the instruction catalog.
    UnknownMnemonic {
        mnemonic: String,
        suggestion: Option<&'static str>,
    },

    /// An instruction or origin declaration has no operand.
    MissingOperand,

    /// A line has more tokens than its statement takes.
    UnexpectedToken(String),

    /// A character that cannot start any token.
    InvalidCharacter(String),

    /// An origin address is not a hex number.
    InvalidAddress(String),

    /// A constant value is not a hex byte.
    InvalidConstant(String),

    /// A constant label has no value.
    MissingConstantValue(String),

    /// The first statement of the program is not an origin declaration.
    MissingOrigin,

    /// An operand is neither a declared label nor a hex number.
    UnresolvedOperand(String),

    /// The program emits more bytes than the length field of an object stream can count.
    ProgramTooLarge(usize),
}

impl Display for AssemblyErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AssemblyErrorKind::ReservedName(name) =>
                write!(f, "cannot declare a symbol with the name of an instruction or pseudo-instruction: {}", name),
            AssemblyErrorKind::DuplicateSymbol(name) =>
                write!(f, "symbol {} is already declared", name),
            AssemblyErrorKind::InvalidDirective(token) =>
                write!(f, "invalid pseudo-instruction after label: {}", token),
            AssemblyErrorKind::UnknownMnemonic { mnemonic, suggestion: Some(suggestion) } =>
                write!(f, "invalid instruction {} (did you mean {}?)", mnemonic, suggestion),
            AssemblyErrorKind::UnknownMnemonic { mnemonic, suggestion: None } =>
                write!(f, "invalid instruction {}", mnemonic),
            AssemblyErrorKind::MissingOperand =>
                write!(f, "missing operand"),
            AssemblyErrorKind::UnexpectedToken(token) =>
                write!(f, "unexpected token {}", token),
            AssemblyErrorKind::InvalidCharacter(text) =>
                write!(f, "invalid character in {}", text),
            AssemblyErrorKind::InvalidAddress(text) =>
                write!(f, "invalid address {}", text),
            AssemblyErrorKind::InvalidConstant(text) =>
                write!(f, "invalid constant value {}", text),
            AssemblyErrorKind::MissingConstantValue(name) =>
                write!(f, "constant {} has no value", name),
            AssemblyErrorKind::MissingOrigin =>
                write!(f, "program must begin with an origin declaration"),
            AssemblyErrorKind::UnresolvedOperand(operand) =>
                write!(f, "operand {} is neither a symbol nor a hex number", operand),
            AssemblyErrorKind::ProgramTooLarge(size) =>
                write!(f, "program is {} bytes long, an object stream holds at most 255", size),
        }
    }
}

/// Error that aborts an assembly. No object stream is produced.
#[derive(Clone, Debug, PartialEq)]
pub struct AssemblyError {
    /// The 1-based source line number of the offending statement.
    pub line: usize,
    pub kind: AssemblyErrorKind,
}

impl AssemblyError {
    pub(crate) fn new(line: usize, kind: AssemblyErrorKind) -> AssemblyError {
        AssemblyError { line, kind }
    }
}

impl Display for AssemblyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.kind)
    }
}

impl std::error::Error for AssemblyError {}

/// Failure of an operation on a source, object or device artifact.
#[derive(Debug)]
pub enum ArtifactError {
    Io(io::Error),
    Assembly(AssemblyError),
    Parse(ParseError),

    /// The checksum of an incoming object stream does not match its contents.
    Checksum {
        /// The checksum computed from the header and payload.
        expected: u8,
        /// The checksum stored in the object stream.
        actual: u8,
    },
}

impl Display for ArtifactError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ArtifactError::Io(err) => write!(f, "IO error: {}", err),
            ArtifactError::Assembly(err) => write!(f, "assembly failed: {}", err),
            ArtifactError::Parse(err) => write!(f, "invalid object stream: {}", err),
            ArtifactError::Checksum { expected, actual } =>
                write!(f, "checksum mismatch: computed {:02X}, stored {:02X}", expected, actual),
        }
    }
}

impl std::error::Error for ArtifactError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ArtifactError::Io(err) => Some(err),
            ArtifactError::Assembly(err) => Some(err),
            ArtifactError::Parse(err) => Some(err),
            ArtifactError::Checksum { .. } => None,
        }
    }
}

impl From<io::Error> for ArtifactError {
    fn from(err: io::Error) -> ArtifactError {
        ArtifactError::Io(err)
    }
}

impl From<AssemblyError> for ArtifactError {
    fn from(err: AssemblyError) -> ArtifactError {
        ArtifactError::Assembly(err)
    }
}

impl From<ParseError> for ArtifactError {
    fn from(err: ParseError) -> ArtifactError {
        ArtifactError::Parse(err)
    }
}
