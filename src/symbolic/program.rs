use logos::Logos;

use super::token::Token;
use crate::error::{AssemblyError, AssemblyErrorKind};
use crate::instruction::OpCode;

/// Mnemonic of the constant pseudo-instruction.
pub const CONSTANT: &str = "K";

/// A classified source line.
///
/// Operands, addresses and constant values are kept as text. Their validation belongs to the
/// assembler pass that consumes them.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// A code label (`NAME` without indentation) bound to the current address.
    Label(String),

    /// A constant label (`NAME K VALUE` without indentation) reserving one byte.
    Constant {
        name: String,
        value: Option<String>,
    },

    /// The origin pseudo-instruction (`@ ADDRESS`), which moves the address cursor.
    Origin(String),

    /// The end pseudo-instruction (`#`). Lines after it are not part of the program.
    End,

    /// A machine instruction (indented `MNEMONIC OPERAND`).
    Instruction {
        opcode: OpCode,
        operand: String,
    },
}

/// A statement and the physical line it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// The 1-based line number.
    pub number: usize,
    pub statement: Statement,
}

/// An assembly program as a list of statements. Blank and comment-only lines are dropped.
#[derive(Debug, Default, Clone)]
pub struct Program {
    pub lines: Vec<Line>,
}

fn tokenize(text: &str, number: usize) -> Result<Vec<Token>, AssemblyError> {
    let mut lexer = Token::lexer(text);
    let mut tokens = Vec::new();

    while let Some(token) = lexer.next() {
        if token == Token::Error {
            let kind = AssemblyErrorKind::InvalidCharacter(lexer.slice().to_string());
            return Err(AssemblyError::new(number, kind));
        }

        tokens.push(token);
    }

    Ok(tokens)
}

fn unexpected(number: usize, token: &Token) -> AssemblyError {
    AssemblyError::new(number, AssemblyErrorKind::UnexpectedToken(token.to_string()))
}

/// Classifies a line that is not indented.
fn label_statement(number: usize, tokens: &[Token]) -> Result<Statement, AssemblyError> {
    let name = match tokens[0] {
        Token::Word(name) if name != CONSTANT && !OpCode::is_mnemonic(name) => name.to_string(),
        ref reserved => {
            let kind = AssemblyErrorKind::ReservedName(reserved.to_string());
            return Err(AssemblyError::new(number, kind));
        },
    };

    match &tokens[1..] {
        [] => Ok(Statement::Label(name)),
        [Token::Word(CONSTANT)] => Ok(Statement::Constant { name, value: None }),
        [Token::Word(CONSTANT), value] => Ok(Statement::Constant {
            name,
            value: Some(value.to_string()),
        }),
        [Token::Word(CONSTANT), _, extra, ..] => Err(unexpected(number, extra)),
        [directive, ..] => {
            let kind = AssemblyErrorKind::InvalidDirective(directive.to_string());
            Err(AssemblyError::new(number, kind))
        },
    }
}

/// Classifies an indented line.
fn instruction_statement(number: usize, tokens: &[Token]) -> Result<Statement, AssemblyError> {
    let mnemonic = tokens[0].to_string();

    let opcode = match tokens[0] {
        Token::Word(word) | Token::Operator(word) => OpCode::from_mnemonic(word),
        _ => None,
    };

    let opcode = opcode.ok_or_else(|| {
        let kind = AssemblyErrorKind::UnknownMnemonic {
            suggestion: OpCode::suggest(&mnemonic),
            mnemonic,
        };

        AssemblyError::new(number, kind)
    })?;

    match &tokens[1..] {
        [] => Err(AssemblyError::new(number, AssemblyErrorKind::MissingOperand)),
        [operand] => Ok(Statement::Instruction {
            opcode,
            operand: operand.to_string(),
        }),
        [_, extra, ..] => Err(unexpected(number, extra)),
    }
}

/// Classifies a source line. Returns `None` for lines without tokens.
fn parse_line(number: usize, text: &str) -> Result<Option<Statement>, AssemblyError> {
    let text = text.to_uppercase();
    let tokens = tokenize(&text, number)?;

    let first = match tokens.first() {
        Some(token) => token,
        None => return Ok(None),
    };

    let statement = match first {
        Token::Origin => match &tokens[1..] {
            [] => return Err(AssemblyError::new(number, AssemblyErrorKind::MissingOperand)),
            [address] => Statement::Origin(address.to_string()),
            [_, extra, ..] => return Err(unexpected(number, extra)),
        },
        Token::End => match &tokens[1..] {
            [] | [_] => Statement::End,
            [_, extra, ..] => return Err(unexpected(number, extra)),
        },
        _ if text.starts_with(char::is_whitespace) => instruction_statement(number, &tokens)?,
        _ => label_statement(number, &tokens)?,
    };

    Ok(Some(statement))
}

impl Program {
    /// Parses assembly source.
    ///
    /// The source is case-insensitive. Lines that do not begin with whitespace declare labels,
    /// indented lines hold instructions. The `@` and `#` pseudo-instructions are recognized
    /// with or without indentation. Parsing stops after the first `#` line.
    ///
    /// # Errors
    /// Returns the first line that cannot be classified.
    pub fn parse(source: &str) -> Result<Program, AssemblyError> {
        let mut lines = Vec::new();

        for (index, text) in source.lines().enumerate() {
            let number = index + 1;

            let statement = match parse_line(number, text)? {
                Some(statement) => statement,
                None => continue,
            };

            let end = statement == Statement::End;

            lines.push(Line { number, statement });

            if end {
                break;
            }
        }

        Ok(Program { lines })
    }
}
