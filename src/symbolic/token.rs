//! Tokens and a tokenizer for a single line of assembly source.

use logos::{Lexer, Logos};

use std::fmt;

/// Enumeration of all tokens of the assembly language.
#[derive(Logos, Debug, PartialEq, Clone)]
pub enum Token<'a> {
    /// Errorneous token that could not be interpreted as any of the other variants.
    #[error]
    #[regex(r"[ \t\r\f]+", logos::skip)]
    #[regex(r";[^\n]*", logos::skip)]
    Error,

    /// The origin pseudo-instruction (`@`).
    #[token("@")]
    Origin,

    /// The end pseudo-instruction (`#`).
    #[token("#")]
    End,

    /// One of the arithmetic mnemonic aliases `+`, `-`, `*` and `/`.
    #[regex(r"[+\-*/]", Lexer::slice)]
    Operator(&'a str),

    /// A label, a mnemonic, the constant pseudo-instruction `K` or a hex literal.
    #[regex("[A-Za-z0-9_]+", Lexer::slice)]
    Word(&'a str),
}

impl<'t> fmt::Display for Token<'t> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Token::Error => write!(f, "<error>"),
            Token::Origin => write!(f, "@"),
            Token::End => write!(f, "#"),
            Token::Operator(op) => write!(f, "{}", op),
            Token::Word(word) => write!(f, "{}", word),
        }
    }
}
