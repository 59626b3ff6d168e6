//! The instruction catalog and types for representing decoded instructions.

use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;

/// Mask applied to every address of the machine.
pub const ADDRESS_MASK: u16 = 0x0FFF;

/// Instruction classes of the machine. Each class is identified by the high nibble of the
/// first byte of the instruction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OpCode {
    /// Unconditional jump. (`JP`)
    Jump,

    /// Jump if the accumulator is zero. (`JZ`)
    JumpZero,

    /// Jump if the accumulator is negative. (`JN`)
    JumpNegative,

    /// Halts the machine, or arms the pointer latch for the next address resolution. (`CN`)
    Control,

    /// Adds a memory cell to the accumulator. (`ADD` or `+`)
    Add,

    /// Subtracts a memory cell from the accumulator. (`SUB` or `-`)
    Subtract,

    /// Multiplies the accumulator by a memory cell. (`MULT` or `*`)
    Multiply,

    /// Divides the accumulator by a memory cell. (`DIV` or `/`)
    Divide,

    /// Copies a memory cell into the accumulator. (`LD`)
    Load,

    /// Copies the accumulator into a memory cell. (`MM`)
    Store,

    /// Pushes the current program counter and jumps to a subroutine. (`SC`)
    SubroutineCall,

    /// Returns from a subroutine, or raises an error. (`OS`)
    OsCall,

    /// Reads or writes a token on the device streams. (`IO`)
    Io,
}

lazy_static! {
    static ref MNEMONICS: HashMap<&'static str, OpCode> = {
        let mut map: HashMap<_, _> = OpCode::ALL
            .iter()
            .map(|opcode| (opcode.mnemonic(), *opcode))
            .collect();

        map.insert("+", OpCode::Add);
        map.insert("-", OpCode::Subtract);
        map.insert("*", OpCode::Multiply);
        map.insert("/", OpCode::Divide);

        map
    };
}

impl OpCode {
    /// Every instruction class, ordered by opcode nibble.
    pub const ALL: [OpCode; 13] = [
        OpCode::Jump,
        OpCode::JumpZero,
        OpCode::JumpNegative,
        OpCode::Control,
        OpCode::Add,
        OpCode::Subtract,
        OpCode::Multiply,
        OpCode::Divide,
        OpCode::Load,
        OpCode::Store,
        OpCode::SubroutineCall,
        OpCode::OsCall,
        OpCode::Io,
    ];

    pub fn nibble(&self) -> u8 {
        match self {
            OpCode::Jump => 0x0,
            OpCode::JumpZero => 0x1,
            OpCode::JumpNegative => 0x2,
            OpCode::Control => 0x3,
            OpCode::Add => 0x4,
            OpCode::Subtract => 0x5,
            OpCode::Multiply => 0x6,
            OpCode::Divide => 0x7,
            OpCode::Load => 0x8,
            OpCode::Store => 0x9,
            OpCode::SubroutineCall => 0xA,
            OpCode::OsCall => 0xB,
            OpCode::Io => 0xC,
        }
    }

    /// Looks up the instruction class of an opcode nibble.
    /// Returns `None` for the unassigned nibbles `0xD`-`0xF`.
    pub fn from_nibble(nibble: u8) -> Option<OpCode> {
        let opcode = match nibble & 0x0F {
            0x0 => OpCode::Jump,
            0x1 => OpCode::JumpZero,
            0x2 => OpCode::JumpNegative,
            0x3 => OpCode::Control,
            0x4 => OpCode::Add,
            0x5 => OpCode::Subtract,
            0x6 => OpCode::Multiply,
            0x7 => OpCode::Divide,
            0x8 => OpCode::Load,
            0x9 => OpCode::Store,
            0xA => OpCode::SubroutineCall,
            0xB => OpCode::OsCall,
            0xC => OpCode::Io,
            _ => return None,
        };

        Some(opcode)
    }

    /// Decodes the instruction class from the first byte of an instruction.
    pub fn from_byte(byte: u8) -> Option<OpCode> {
        OpCode::from_nibble(byte >> 4)
    }

    /// Size of the encoded instruction in bytes.
    ///
    /// Two byte instructions carry a 12-bit address, one byte instructions carry a 4-bit
    /// sub-operand in the low nibble.
    pub fn size(&self) -> u8 {
        match self {
            OpCode::Control | OpCode::OsCall | OpCode::Io => 1,
            _ => 2,
        }
    }

    /// Mask for the operand bits of this instruction class.
    pub fn operand_mask(&self) -> u16 {
        match self.size() {
            1 => 0x000F,
            _ => ADDRESS_MASK,
        }
    }

    /// The canonical mnemonic of the instruction class.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            OpCode::Jump => "JP",
            OpCode::JumpZero => "JZ",
            OpCode::JumpNegative => "JN",
            OpCode::Control => "CN",
            OpCode::Add => "ADD",
            OpCode::Subtract => "SUB",
            OpCode::Multiply => "MULT",
            OpCode::Divide => "DIV",
            OpCode::Load => "LD",
            OpCode::Store => "MM",
            OpCode::SubroutineCall => "SC",
            OpCode::OsCall => "OS",
            OpCode::Io => "IO",
        }
    }

    /// Looks up an instruction class by mnemonic. The lookup is case-insensitive and accepts the
    /// arithmetic aliases `+`, `-`, `*` and `/`.
    pub fn from_mnemonic(mnemonic: &str) -> Option<OpCode> {
        MNEMONICS.get(mnemonic.to_uppercase().as_str()).copied()
    }

    /// Returns true if `name` is a mnemonic or one of its aliases.
    pub fn is_mnemonic(name: &str) -> bool {
        OpCode::from_mnemonic(name).is_some()
    }

    /// Finds the canonical mnemonic closest to a misspelled one.
    pub fn suggest(mnemonic: &str) -> Option<&'static str> {
        let mnemonic = mnemonic.to_uppercase();

        OpCode::ALL
            .iter()
            .map(|opcode| opcode.mnemonic())
            .map(|name| (edit_distance::edit_distance(&mnemonic, name), name))
            .filter(|(distance, _)| *distance <= 1)
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, name)| name)
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

/// A decoded instruction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: OpCode,

    /// The 12-bit address of a two byte instruction or the 4-bit sub-operand of a one byte
    /// instruction.
    pub operand: u16,
}

impl Instruction {
    /// Creates an instruction, truncating the operand to the width the instruction class
    /// can encode.
    pub fn new(opcode: OpCode, operand: u16) -> Instruction {
        Instruction {
            opcode,
            operand: operand & opcode.operand_mask(),
        }
    }

    /// Decodes an instruction from its first byte and the byte that follows it in memory.
    /// The second byte is ignored by one byte instructions.
    pub fn decode(first: u8, second: u8) -> Option<Instruction> {
        let opcode = OpCode::from_byte(first)?;

        let operand = match opcode.size() {
            1 => u16::from(first & 0x0F),
            _ => u16::from_be_bytes([first & 0x0F, second]),
        };

        Some(Instruction::new(opcode, operand))
    }

    pub fn size(&self) -> u8 {
        self.opcode.size()
    }

    /// Encodes the instruction into one or two bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let nibble = self.opcode.nibble();

        match self.size() {
            1 => vec![(nibble << 4) | (self.operand as u8 & 0x0F)],
            _ => {
                let word = (u16::from(nibble) << 12) | (self.operand & ADDRESS_MASK);
                word.to_be_bytes().to_vec()
            },
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.size() {
            1 => write!(f, "{} {:X}", self.opcode, self.operand),
            _ => write!(f, "{} {:03X}", self.opcode, self.operand),
        }
    }
}
