//! Two-pass assembly from source text to an object stream.
//!
//! The first pass walks the statements with an address cursor and builds the [SymbolTable].
//! The second pass emits the object stream header and payload, resolving operands through the
//! symbol table. All state lives in the functions of a single assembly, so consecutive
//! assemblies never share labels, counters or checksums.

use std::fs;
use std::path::{Path, PathBuf};

use slog::{debug, o, trace, Discard, Logger};

use crate::bytecode::{Program, MAX_PAYLOAD};
use crate::error::{ArtifactError, AssemblyError, AssemblyErrorKind};
use crate::instruction::{Instruction, ADDRESS_MASK};
use crate::symbol_table::{Symbol, SymbolKind, SymbolTable};
use crate::symbolic::{self, Line, Statement};

/// The result of a successful assembly.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub program: Program,

    /// The labels declared by the source and their addresses.
    pub symbol_table: SymbolTable,
}

/// Assembles source text into a program.
///
/// # Example
/// ```
/// let program = hvm::compiler::assemble("@ 100\n  LD 120\n  OS 0\n#\n").unwrap();
///
/// assert_eq!(program.start, 0x100);
/// assert_eq!(program.payload, vec![0x81, 0x20, 0xB0]);
/// ```
pub fn assemble(source: &str) -> Result<Program, AssemblyError> {
    assemble_with_logger(source, None).map(|assembly| assembly.program)
}

/// Assembles source text into a program, logging the passes to `logger`.
///
/// # Errors
/// Returns the first error found. No program is produced in that case.
pub fn assemble_with_logger<L>(source: &str, logger: L) -> Result<Assembly, AssemblyError>
where
    L: Into<Option<Logger>>,
{
    let logger = logger
        .into()
        .unwrap_or_else(|| Logger::root(Discard, o!()))
        .new(o!("stage" => "assembly"));

    let statements = symbolic::Program::parse(source)?;

    let symbol_table = first_pass(&statements.lines, &logger)?;
    let program = second_pass(&statements.lines, &symbol_table, &logger)?;

    Ok(Assembly {
        program,
        symbol_table,
    })
}

/// Assembles the source file at `source` and writes the object stream to `destination`.
///
/// The object stream is written to a temporary file next to `destination` and renamed into
/// place, so `destination` is either left untouched or replaced by a complete object stream.
pub fn assemble_file<P, Q, L>(source: P, destination: Q, logger: L) -> Result<Program, ArtifactError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    L: Into<Option<Logger>>,
{
    let text = fs::read_to_string(source)?;
    let assembly = assemble_with_logger(&text, logger)?;

    let destination = destination.as_ref();
    let temporary = temporary_path(destination);

    let written = fs::write(&temporary, assembly.program.to_object())
        .and_then(|_| fs::rename(&temporary, destination));

    if let Err(err) = written {
        let _ = fs::remove_file(&temporary);
        return Err(err.into());
    }

    Ok(assembly.program)
}

fn temporary_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn parse_origin(line: usize, text: &str) -> Result<u16, AssemblyError> {
    match u16::from_str_radix(text, 16) {
        Ok(address) if address <= ADDRESS_MASK => Ok(address),
        _ => Err(AssemblyError::new(line, AssemblyErrorKind::InvalidAddress(text.to_string()))),
    }
}

fn define(table: &mut SymbolTable, line: usize, name: &str, symbol: Symbol) -> Result<(), AssemblyError> {
    table
        .define_symbol(name.to_string(), symbol)
        .map_err(|_| AssemblyError::new(line, AssemblyErrorKind::DuplicateSymbol(name.to_string())))
}

/// Binds every label to its address and checks that the payload fits an object stream.
fn first_pass(lines: &[Line], logger: &Logger) -> Result<SymbolTable, AssemblyError> {
    let mut table = SymbolTable::new();
    let mut cursor: u16 = 0;
    let mut byte_count: usize = 0;

    for line in lines {
        let size = match &line.statement {
            Statement::Origin(address) => {
                cursor = parse_origin(line.number, address)?;
                0
            },
            Statement::End => 0,
            Statement::Label(name) => {
                let symbol = Symbol { address: cursor, line: line.number, kind: SymbolKind::Code };
                define(&mut table, line.number, name, symbol)?;
                0
            },
            Statement::Constant { name, .. } => {
                let symbol = Symbol { address: cursor, line: line.number, kind: SymbolKind::Constant };
                define(&mut table, line.number, name, symbol)?;
                1
            },
            Statement::Instruction { opcode, .. } => opcode.size(),
        };

        cursor = cursor.wrapping_add(u16::from(size)) & ADDRESS_MASK;
        byte_count += usize::from(size);

        if byte_count > MAX_PAYLOAD {
            let kind = AssemblyErrorKind::ProgramTooLarge(byte_count);
            return Err(AssemblyError::new(line.number, kind));
        }
    }

    debug!(logger, "first pass complete"; "symbols" => table.len(), "bytes" => byte_count);

    Ok(table)
}

fn resolve_operand(table: &SymbolTable, line: usize, operand: &str) -> Result<u16, AssemblyError> {
    if let Some(address) = table.address(operand) {
        return Ok(address);
    }

    u16::from_str_radix(operand, 16)
        .map(|value| value & ADDRESS_MASK)
        .map_err(|_| AssemblyError::new(line, AssemblyErrorKind::UnresolvedOperand(operand.to_string())))
}

/// Emits the payload. The first statement has to be the origin declaration that sets the
/// start address of the program.
fn second_pass(lines: &[Line], table: &SymbolTable, logger: &Logger) -> Result<Program, AssemblyError> {
    let (start, rest) = match lines.split_first() {
        Some((Line { number, statement: Statement::Origin(address) }, rest)) =>
            (parse_origin(*number, address)?, rest),
        Some((line, _)) => return Err(AssemblyError::new(line.number, AssemblyErrorKind::MissingOrigin)),
        None => return Err(AssemblyError::new(1, AssemblyErrorKind::MissingOrigin)),
    };

    let mut payload = Vec::new();

    for line in rest {
        let address = start.wrapping_add(payload.len() as u16) & ADDRESS_MASK;

        let bytes = match &line.statement {
            Statement::Constant { name, value: None } => {
                let kind = AssemblyErrorKind::MissingConstantValue(name.clone());
                return Err(AssemblyError::new(line.number, kind));
            },
            Statement::Constant { value: Some(value), .. } => {
                let byte = u8::from_str_radix(value, 16).map_err(|_| {
                    AssemblyError::new(line.number, AssemblyErrorKind::InvalidConstant(value.clone()))
                })?;

                vec![byte]
            },
            Statement::Instruction { opcode, operand } => {
                let operand = resolve_operand(table, line.number, operand)?;
                Instruction::new(*opcode, operand).to_bytes()
            },
            Statement::Label(_) | Statement::Origin(_) | Statement::End => continue,
        };

        trace!(logger, "emit"; "line" => line.number, "address" => format!("{:03X}", address), "bytes" => ?bytes);

        payload.extend(bytes);
    }

    let program = Program::new(start, payload);

    debug!(logger, "second pass complete"; "start" => format!("{:03X}", start), "bytes" => program.payload.len(), "checksum" => program.checksum());

    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error(source: &str) -> AssemblyError {
        assemble(source).expect_err("the source should not assemble")
    }

    #[test]
    fn test_assemble() {
        let source = "@ 000\nN1 K 05\n LD N1\n OS 0\n#\n";
        let program = assemble(source).unwrap();

        assert_eq!(program.start, 0x000);
        assert_eq!(program.payload, vec![0x05, 0x80, 0x00, 0xB0]);
        assert_eq!(program.to_bytes(), vec![0x00, 0x00, 0x04, 0x05, 0x80, 0x00, 0xB0, 0x39]);
    }

    #[test]
    fn test_forward_references() {
        let source = "@ 200\n  JP SKIP\nDATA K 7F\nSKIP\n  LD DATA\n  CN 0\n#\n";
        let assembly = assemble_with_logger(source, None).unwrap();

        assert_eq!(assembly.symbol_table.address("DATA"), Some(0x202));
        assert_eq!(assembly.symbol_table.address("SKIP"), Some(0x203));
        assert_eq!(assembly.program.payload, vec![0x02, 0x03, 0x7F, 0x82, 0x02, 0x30]);
    }

    #[test]
    fn test_literal_operands() {
        let program = assemble("@ 0\n  JP FFFF\n  IO 1\n  CN 12\n#\n").unwrap();

        assert_eq!(program.payload, vec![0x0F, 0xFF, 0xC1, 0x32]);
    }

    #[test]
    fn test_single_constant() {
        let program = assemble("@ 000\nX K 2A\n#\n").unwrap();

        assert_eq!(program.to_bytes(), vec![0x00, 0x00, 0x01, 0x2A, 0x2B]);
    }

    #[test]
    fn test_missing_origin() {
        let err = error("\n; nothing here\n  LD 10\n");
        assert_eq!(err, AssemblyError::new(3, AssemblyErrorKind::MissingOrigin));

        assert_eq!(error("").kind, AssemblyErrorKind::MissingOrigin);
    }

    #[test]
    fn test_invalid_origin() {
        assert_eq!(error("@ 1000\n#\n").kind, AssemblyErrorKind::InvalidAddress("1000".into()));
        assert_eq!(error("@ X\n#\n").kind, AssemblyErrorKind::InvalidAddress("X".into()));
    }

    #[test]
    fn test_unresolved_operand() {
        let err = error("@ 0\n  LD NOWHERE\n#\n");

        assert_eq!(err.line, 2);
        assert_eq!(err.kind, AssemblyErrorKind::UnresolvedOperand("NOWHERE".into()));
    }

    #[test]
    fn test_duplicate_symbol() {
        let err = error("@ 0\nX K 1\nX\n#\n");

        assert_eq!(err, AssemblyError::new(3, AssemblyErrorKind::DuplicateSymbol("X".into())));
    }

    #[test]
    fn test_constant_values() {
        assert_eq!(error("@ 0\nX K\n#\n").kind, AssemblyErrorKind::MissingConstantValue("X".into()));
        assert_eq!(error("@ 0\nX K 100\n#\n").kind, AssemblyErrorKind::InvalidConstant("100".into()));
    }

    #[test]
    fn test_program_too_large() {
        let mut source = String::from("@ 0\n");

        for _ in 0..128 {
            source.push_str("  LD 0\n");
        }

        let err = error(&source);
        assert_eq!(err.line, 129);
        assert_eq!(err.kind, AssemblyErrorKind::ProgramTooLarge(256));
    }

    #[test]
    fn test_assemble_file() {
        let dir = std::env::temp_dir().join(format!("hvm-assemble-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let source = dir.join("prog.asm");
        let destination = dir.join("prog.obj");

        fs::write(&source, "@ 100\n  OS 0\n#\n").unwrap();
        let program = assemble_file(&source, &destination, None).unwrap();

        assert_eq!(fs::read_to_string(&destination).unwrap(), program.to_object());
        assert_eq!(fs::read_to_string(&destination).unwrap(), "01 00 01 B0 B2 ");

        fs::write(&source, "  OS 0\n").unwrap();
        assert!(assemble_file(&source, &destination, None).is_err());
        assert_eq!(fs::read_to_string(&destination).unwrap(), "01 00 01 B0 B2 ");
        assert!(!temporary_path(&destination).exists());

        fs::remove_dir_all(&dir).unwrap();
    }
}
