//! A crate for assembling and running programs of a small hypothetical computer with a 12-bit
//! address space and a single signed 8-bit accumulator.
//!
//! Currently this crate provides the functionality to:
//! - Read and write object streams (`AA AA LL D.. CC` hex pair text).
//! - Assemble object streams from symbolic assembly with a two-pass assembler.
//! - Execute programs, with device input and output as hex pair token streams.
//!
//! # Example
//! ```
//! use hvm::{
//!     compiler::assemble,
//!     emulator::{Emulator, TestIo},
//! };
//!
//! // Reads a number, doubles it and writes the result.
//! let source = "
//! @ 100
//!     IO 0
//!     MM N
//!     ADD N
//!     IO 1
//!     CN 0
//! N K 00
//! ##
//! ";
//!
//! let program = assemble(source).expect("could not assemble the program");
//!
//! let mut emulator = Emulator::new();
//! emulator.load_program(&program);
//!
//! let mut io = TestIo::with_input(vec![0x15]);
//! emulator.run(program.start, &mut io)
//!     .expect("an error occured while emulating the program");
//!
//! assert_eq!(io.output(), &[0x2A]);
//! ```
//!
//! # Executables
//!
//! ## `hvmasm`
//!
//! Assembles a source file into an object file. Enabled by the `hvmasm` feature.
//!
//! ```text
//! $ hvmasm double.asm -o double.obj
//! ```
//!
//! ## `hvmrun`
//!
//! Loads object files into one machine and runs it from an address. Enabled by the `hvmrun`
//! feature.
//!
//! ```text
//! $ hvmrun double.obj -s 100 -i input.txt -o output.txt --dump 100:10F
//! ```
pub mod symbol_table;
pub mod emulator;
pub mod instruction;
pub mod memory;
pub mod bytecode;
pub mod symbolic;
pub mod compiler;
pub mod error;
pub mod event;
