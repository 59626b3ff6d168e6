//! Parsing assembly source into statements.

pub mod token;
pub mod program;

pub use self::program::{Line, Program, Statement};
