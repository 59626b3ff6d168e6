//! The flat byte-addressed memory of the machine.

use std::fmt;
use std::ops::{Index, IndexMut};

use crate::instruction::ADDRESS_MASK;

/// Number of addressable cells.
pub const MEMORY_SIZE: usize = 0x1000;

/// Value of every cell that has not been written since the machine was created.
/// Non-zero so that reads of uninitialized data stand out.
pub const SENTINEL: u8 = 0xFF;

/// 4096 byte cells.
///
/// Indexing does not mask the address. Every caller masks addresses to 12 bits before indexing
/// and an out-of-range index panics.
#[derive(Clone)]
pub struct Memory {
    cells: Box<[u8; MEMORY_SIZE]>,
}

impl Default for Memory {
    fn default() -> Memory {
        Memory::new()
    }
}

impl Memory {
    pub fn new() -> Memory {
        Memory {
            cells: Box::new([SENTINEL; MEMORY_SIZE]),
        }
    }

    /// Reads the 12-bit big-endian pointer stored in the cell pair starting at `address`.
    pub fn pointer(&self, address: u16) -> u16 {
        let high = self[address & ADDRESS_MASK];
        let low = self[address.wrapping_add(1) & ADDRESS_MASK];

        u16::from_be_bytes([high, low]) & ADDRESS_MASK
    }

    /// Borrows a range of memory for display as a hex table.
    ///
    /// # Parameters
    /// - `first`: The first address to show. Rows start at the 16 byte boundary below it.
    /// - `last`: The last address to show. Rows end at the 16 byte boundary above it.
    pub fn view(&self, first: u16, last: u16) -> MemoryView {
        MemoryView {
            memory: self,
            first: first & ADDRESS_MASK,
            last: last & ADDRESS_MASK,
        }
    }
}

impl Index<u16> for Memory {
    type Output = u8;

    fn index(&self, address: u16) -> &u8 {
        &self.cells[address as usize]
    }
}

impl IndexMut<u16> for Memory {
    fn index_mut(&mut self, address: u16) -> &mut u8 {
        &mut self.cells[address as usize]
    }
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let used = self.cells.iter().filter(|cell| **cell != SENTINEL).count();

        f.debug_struct("Memory")
            .field("size", &MEMORY_SIZE)
            .field("written", &used)
            .finish()
    }
}

/// A 16 column hex table of a memory range, as produced by [Memory::view].
pub struct MemoryView<'m> {
    memory: &'m Memory,
    first: u16,
    last: u16,
}

impl<'m> fmt::Display for MemoryView<'m> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Memory at {:04X}", self.first)?;
        write!(f, "   ")?;

        for column in 0..0x10 {
            write!(f, " {:2X}", column)?;
        }

        writeln!(f)?;

        let mut row = self.first & 0xFF0;

        while row <= (self.last & 0xFF0) {
            write!(f, "{:02X} ", row >> 4)?;

            for column in 0..0x10 {
                write!(f, " {:02X}", self.memory[row | column])?;
            }

            writeln!(f)?;
            row += 0x10;
        }

        Ok(())
    }
}
