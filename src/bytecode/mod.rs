//! Reading and writing object streams.
//!
//! An object stream is the exchange format for loadable programs:
//!
//! ```text
//! AA AA LL D0 D1 ... D(LL-1) CC
//! ```
//!
//! Every byte is written as two uppercase hex digits followed by a space. `AA AA` is the
//! big-endian start address, `LL` the payload length, `D*` the payload and `CC` the checksum,
//! which is the sum of the address, length and payload bytes modulo 256.

pub mod codec;
mod parser;
mod program;

pub use self::parser::ParseError;
pub use self::program::{
    ChecksumPolicy,
    ObjectFile,
    Program,
    MAX_PAYLOAD,
};
