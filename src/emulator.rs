//! [Emulator] for executing programs loaded from [object streams](crate::bytecode::ObjectFile).

use std::collections::VecDeque;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use slog::{debug, o, trace, warn, Discard, Logger};

use crate::bytecode::codec::{decode_token, encode_byte};
use crate::bytecode::{ChecksumPolicy, ObjectFile, Program};
use crate::error::ArtifactError;
use crate::event::{Event, EventDispatcher, EventListener};
use crate::instruction::{Instruction, OpCode, ADDRESS_MASK};
use crate::memory::Memory;

/// Address the bootstrap loader program is conventionally loaded at.
pub const LOADER_ADDRESS: u16 = 0x000;

/// Address the memory dump program is conventionally loaded at.
pub const DUMPER_ADDRESS: u16 = 0xFC0;

/// Contains the execution environment of the processor.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// The address of the next instruction to be executed.
    pub pc: u16,

    pub accumulator: i8,

    /// Addresses of the pending subroutine call instructions, innermost last.
    pub call_stack: Vec<u16>,

    /// The pointer latch. When set, the next address resolution reads its address from the
    /// memory cell pair at the operand and clears the latch.
    pub pointer: bool,
}

/// Execution state of the [Emulator].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Nothing has been run yet.
    Idle,
    Running,
    Halted {
        /// True if the program was aborted by a [Fault].
        error: bool,
    },
}

/// A fatal condition that aborts the running program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// A `DIV` instruction read a zero divisor.
    DivisionByZero {
        /// The address of the division instruction.
        address: u16,
    },

    /// An `IO` read found the input device exhausted.
    InputExhausted,

    /// The program executed `OS` with a nonzero code.
    ErrorCall { code: u8 },

    /// The high nibble of the fetched byte does not name an instruction class.
    IllegalOpcode { address: u16, byte: u8 },

    /// The device streams failed or the input held a malformed token.
    Device { message: String },
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Fault::DivisionByZero { address } => write!(f, "division by zero at {:03X}", address),
            Fault::InputExhausted => write!(f, "input device exhausted"),
            Fault::ErrorCall { code } => write!(f, "program exited with error code {}", code),
            Fault::IllegalOpcode { address, byte } =>
                write!(f, "illegal instruction {:02X} at {:03X}", byte, address),
            Fault::Device { message } => write!(f, "device error: {}", message),
        }
    }
}

impl std::error::Error for Fault {}

impl From<io::Error> for Fault {
    fn from(err: io::Error) -> Fault {
        Fault::Device { message: err.to_string() }
    }
}

/// Interface to the input and output devices.
pub trait InputOutput {
    /// Called when an `IO` instruction reads.
    ///
    /// # Returns
    /// The next byte of the input device, or `None` if the device is exhausted.
    fn input(&mut self) -> io::Result<Option<u8>>;

    /// Called when an `IO` instruction writes.
    ///
    /// # Parameters
    /// - `data`: The value of the accumulator as an unsigned byte.
    fn output(&mut self, data: u8) -> io::Result<()>;

    /// Called once when a run ends, whether it halted or faulted.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<T> InputOutput for &mut T where T: InputOutput + ?Sized {
    fn input(&mut self) -> io::Result<Option<u8>> {
        (**self).input()
    }

    fn output(&mut self, data: u8) -> io::Result<()> {
        (**self).output(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

/// An IO handler for testing purposes.
///
/// Reads input values from a pre-determined input buffer and
/// appends printed values to an output buffer.
#[derive(Debug, Default, Clone)]
pub struct TestIo {
    input_buffer: VecDeque<u8>,
    output_buffer: Vec<u8>,
}

impl TestIo {
    pub fn new() -> TestIo {
        TestIo::default()
    }

    pub fn with_input<I: IntoIterator<Item = u8>>(input: I) -> TestIo {
        TestIo {
            input_buffer: input.into_iter().collect(),
            output_buffer: Vec::new(),
        }
    }

    pub fn input(&mut self, value: u8) {
        self.input_buffer.push_back(value);
    }

    pub fn output(&self) -> &[u8] {
        &self.output_buffer[..]
    }

    pub fn into_output(self) -> Vec<u8> {
        self.output_buffer
    }
}

impl InputOutput for TestIo {
    fn input(&mut self) -> io::Result<Option<u8>> {
        Ok(self.input_buffer.pop_front())
    }

    fn output(&mut self, data: u8) -> io::Result<()> {
        self.output_buffer.push(data);
        Ok(())
    }
}

/// An IO handler for device streams of whitespace separated two digit hex tokens.
///
/// Every written byte is followed by a single space.
pub struct StreamIo<R, W> {
    reader: R,
    writer: W,
    pending: VecDeque<String>,
}

impl<R: BufRead, W: Write> StreamIo<R, W> {
    pub fn new(reader: R, writer: W) -> StreamIo<R, W> {
        StreamIo {
            reader,
            writer,
            pending: VecDeque::new(),
        }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

impl StreamIo<BufReader<File>, BufWriter<File>> {
    /// Opens the input device file for reading and creates or truncates the output device file.
    pub fn files<P, Q>(input: P, output: Q) -> io::Result<Self>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let reader = BufReader::new(File::open(input)?);
        let writer = BufWriter::new(File::create(output)?);

        Ok(StreamIo::new(reader, writer))
    }
}

impl<R: BufRead, W: Write> InputOutput for StreamIo<R, W> {
    fn input(&mut self) -> io::Result<Option<u8>> {
        while self.pending.is_empty() {
            let mut line = String::new();

            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }

            self.pending.extend(line.split_whitespace().map(String::from));
        }

        let token = match self.pending.pop_front() {
            Some(token) => token,
            None => return Ok(None),
        };

        decode_token(&token).map(Some).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidData, format!("invalid input token '{}'", token))
        })
    }

    fn output(&mut self, data: u8) -> io::Result<()> {
        write!(self.writer, "{} ", encode_byte(data))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Utility struct for implementing methods in the context of emulating a single instruction.
struct InstructionEmulationContext<'e, 'i> {
    /// The emulator in whose context the instruction is being emulated.
    emulator: &'e mut Emulator,

    /// The instruction that we are currently emulating.
    instruction: &'i Instruction,
}

impl<'e, 'i> InstructionEmulationContext<'e, 'i> {
    /// Resolves the address operand, consuming the pointer latch.
    fn resolve(&mut self) -> u16 {
        let operand = self.instruction.operand & ADDRESS_MASK;
        let context = &mut self.emulator.context;

        if context.pointer {
            context.pointer = false;
            self.emulator.memory.pointer(operand)
        } else {
            operand
        }
    }

    /// Resolves the address operand and returns the signed value stored there.
    fn operand_value(&mut self) -> i8 {
        let address = self.resolve();
        self.emulator.memory[address] as i8
    }

    fn set_accumulator(&mut self, data: i8) {
        self.emulator.context.accumulator = data;
        self.emulator.events.dispatch(Event::AccumulatorChange { data });
    }

    fn advance(&mut self) {
        let pc = self.emulator.context.pc;
        self.emulator.context.pc = pc.wrapping_add(u16::from(self.instruction.size())) & ADDRESS_MASK;
    }

    fn jump(&mut self, target: u16, taken: bool) {
        if taken {
            self.emulator.context.pc = target;
        } else {
            self.advance();
        }
    }

    /// Jumps to the resolved operand when `taken`. An untaken jump leaves the pointer latch
    /// armed.
    fn jump_if(&mut self, taken: bool) {
        if taken {
            let target = self.resolve();
            self.jump(target, true);
        } else {
            self.advance();
        }
    }

    fn halt(&mut self) {
        let address = self.emulator.context.pc;

        self.emulator.context.pointer = false;
        self.emulator.state = State::Halted { error: false };
        self.emulator.events.dispatch(Event::Halt { address });

        debug!(self.emulator.logger, "halted"; "pc" => format!("{:03X}", address));
    }

    /// Execute the instruction.
    ///
    /// # Errors
    /// Returns the fault raised by the instruction. The caller is responsible for aborting the
    /// run.
    fn emulate<IO: InputOutput>(&mut self, io: &mut IO) -> Result<(), Fault> {
        let address = self.emulator.context.pc;
        let accumulator = self.emulator.context.accumulator;

        match self.instruction.opcode {
            OpCode::Jump => {
                let target = self.resolve();
                self.jump(target, true);
            },
            OpCode::JumpZero => self.jump_if(accumulator == 0),
            OpCode::JumpNegative => self.jump_if(accumulator < 0),

            OpCode::Control => {
                if self.instruction.operand == 0 {
                    self.halt();
                } else {
                    self.emulator.context.pointer = true;
                    self.advance();
                }
            },

            OpCode::Load => {
                let value = self.operand_value();
                self.set_accumulator(value);
                self.advance();
            },
            OpCode::Store => {
                let target = self.resolve();
                let data = accumulator as u8;

                self.emulator.memory[target] = data;
                self.emulator.events.dispatch(Event::MemoryChange { address: target, data });
                self.advance();
            },

            OpCode::SubroutineCall => {
                self.emulator.context.pointer = false;
                let target = self.instruction.operand & ADDRESS_MASK;

                self.emulator.context.call_stack.push(address);
                self.emulator.events.dispatch(Event::Call { address, target });
                self.emulator.context.pc = target;
            },

            OpCode::OsCall => {
                self.emulator.context.pointer = false;

                if self.instruction.operand != 0 {
                    return Err(Fault::ErrorCall { code: self.instruction.operand as u8 });
                }

                match self.emulator.context.call_stack.pop() {
                    Some(call) => {
                        let resume = call.wrapping_add(2) & ADDRESS_MASK;

                        self.emulator.context.pc = resume;
                        self.emulator.events.dispatch(Event::Return { address: resume });
                    },
                    None => self.halt(),
                }
            },

            OpCode::Io => {
                if self.instruction.operand & 1 == 0 {
                    let data = io.input()?.ok_or(Fault::InputExhausted)?;

                    self.emulator.events.dispatch(Event::Input { data });
                    self.set_accumulator(data as i8);
                } else {
                    let data = accumulator as u8;

                    io.output(data)?;
                    self.emulator.events.dispatch(Event::Output { data });
                }

                self.advance();
            },

            arithmetic_instruction => {
                let value = self.operand_value();

                let result = match arithmetic_instruction {
                    OpCode::Add => accumulator.wrapping_add(value),
                    OpCode::Subtract => accumulator.wrapping_sub(value),
                    OpCode::Multiply => accumulator.wrapping_mul(value),
                    _ if value == 0 => return Err(Fault::DivisionByZero { address }),
                    _ => accumulator.wrapping_div(value),
                };

                self.set_accumulator(result);
                self.advance();
            },
        }

        Ok(())
    }
}

/// The emulator contains the memory and processor state of the machine.
///
/// Memory persists across runs and loads, so programs loaded one after another share it.
#[derive(Debug)]
pub struct Emulator {
    /// The memory of the emulated machine.
    pub memory: Memory,

    /// The execution context, which includes the registers of the CPU.
    pub context: Context,

    state: State,
    logger: Logger,
    events: EventDispatcher,
}

impl Default for Emulator {
    fn default() -> Emulator {
        Emulator::new()
    }
}

impl Emulator {
    /// Create a new emulator with sentinel filled memory.
    pub fn new() -> Emulator {
        Emulator::with_logger(None)
    }

    pub fn with_logger<L: Into<Option<Logger>>>(logger: L) -> Emulator {
        let mut emulator = Emulator {
            memory: Memory::new(),
            context: Context::default(),
            state: State::Idle,
            logger: Logger::root(Discard, o!()),
            events: EventDispatcher::new(),
        };

        emulator.set_logger(logger);
        emulator
    }

    pub fn set_logger<L: Into<Option<Logger>>>(&mut self, logger: L) {
        self.logger = logger
            .into()
            .unwrap_or_else(|| Logger::root(Discard, o!()))
            .new(o!("stage" => "emulation"));
    }

    /// Registers a listener that is notified of every [Event] from now on.
    pub fn add_listener<L: EventListener + 'static>(&mut self, listener: L) {
        self.events.add_listener(listener);
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// True if the last run ended with a fault.
    pub fn error(&self) -> bool {
        self.state == State::Halted { error: true }
    }

    /// Copies an object stream into memory at its start address.
    ///
    /// # Errors
    /// Under [ChecksumPolicy::Strict] a checksum mismatch is an error and memory is left
    /// untouched. Under [ChecksumPolicy::Advisory] the mismatch is logged and the program is
    /// loaded anyway.
    pub fn load(&mut self, object: &ObjectFile, policy: ChecksumPolicy) -> Result<(), ArtifactError> {
        if !object.is_valid() {
            warn!(self.logger, "checksum mismatch, the program may be corrupt";
                "start" => format!("{:03X}", object.program.start),
                "computed" => format!("{:02X}", object.program.checksum()),
                "stored" => format!("{:02X}", object.checksum));
        }

        object.verify(policy)?;
        self.load_program(&object.program);

        Ok(())
    }

    /// Copies the payload of a program into memory at its start address.
    pub fn load_program(&mut self, program: &Program) {
        for (offset, byte) in program.payload.iter().enumerate() {
            let address = program.start.wrapping_add(offset as u16) & ADDRESS_MASK;
            self.memory[address] = *byte;
        }

        debug!(self.logger, "loaded program";
            "start" => format!("{:03X}", program.start & ADDRESS_MASK),
            "bytes" => program.payload.len());
    }

    /// Aborts the run: clears the call stack, resets the program counter and flags the error.
    fn fault(&mut self, fault: Fault) -> Fault {
        warn!(self.logger, "fault"; "pc" => format!("{:03X}", self.context.pc), "reason" => %fault);

        self.context.call_stack.clear();
        self.context.pc = 0;
        self.context.pointer = false;
        self.state = State::Halted { error: true };
        self.events.dispatch(Event::Fault { fault: fault.clone() });

        fault
    }

    /// Fetches, decodes and executes the instruction at the program counter.
    ///
    /// Does nothing if the machine has halted.
    ///
    /// # Errors
    /// Returns the fault that aborted the program. The machine is halted with the error flag
    /// set.
    pub fn step<IO: InputOutput>(&mut self, io: &mut IO) -> Result<(), Fault> {
        match self.state {
            State::Halted { .. } => return Ok(()),
            State::Idle => self.state = State::Running,
            State::Running => (),
        }

        let pc = self.context.pc & ADDRESS_MASK;
        let first = self.memory[pc];
        let second = self.memory[pc.wrapping_add(1) & ADDRESS_MASK];

        let instruction = match Instruction::decode(first, second) {
            Some(instruction) => instruction,
            None => return Err(self.fault(Fault::IllegalOpcode { address: pc, byte: first })),
        };

        trace!(self.logger, "execute";
            "pc" => format!("{:03X}", pc),
            "instruction" => %instruction,
            "accumulator" => self.context.accumulator,
            "pointer" => self.context.pointer);

        let result = InstructionEmulationContext {
            emulator: self,
            instruction: &instruction,
        }.emulate(io);

        result.map_err(|fault| self.fault(fault))
    }

    /// Executes from `start` until the program halts or faults.
    ///
    /// There is no limit on the number of executed instructions.
    ///
    /// # Errors
    /// Returns the fault that aborted the program. [Emulator::error] is true afterwards.
    pub fn run<IO: InputOutput>(&mut self, start: u16, mut io: IO) -> Result<(), Fault> {
        self.context.pc = start & ADDRESS_MASK;
        self.state = State::Running;

        debug!(self.logger, "running program"; "start" => format!("{:03X}", self.context.pc));

        let mut result = Ok(());

        while self.state == State::Running {
            if let Err(fault) = self.step(&mut io) {
                result = Err(fault);
                break;
            }
        }

        if let Err(err) = io.flush() {
            if result.is_ok() {
                result = Err(self.fault(err.into()));
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emulator(start: u16, bytes: &[u8]) -> Emulator {
        let mut emulator = Emulator::new();
        emulator.load_program(&Program::new(start, bytes.to_vec()));
        emulator
    }

    #[test]
    fn test_halt() {
        let mut emulator = emulator(0x100, &[0x30]);

        assert_eq!(emulator.state(), State::Idle);
        emulator.run(0x100, TestIo::new()).unwrap();

        assert_eq!(emulator.state(), State::Halted { error: false });
        assert_eq!(emulator.context.pc, 0x100);
    }

    #[test]
    fn test_arithmetic_wraps() {
        // LD 010, ADD 011, CN 0
        let mut emulator = emulator(0x000, &[0x80, 0x10, 0x40, 0x11, 0x30]);
        emulator.memory[0x010] = 0x7F;
        emulator.memory[0x011] = 0x01;

        emulator.run(0x000, TestIo::new()).unwrap();

        assert_eq!(emulator.context.accumulator, -128);
    }

    #[test]
    fn test_division() {
        let cases: &[(i8, i8, i8)] = &[
            (7, 2, 3),
            (-7, 2, -3),
            (7, -2, -3),
            (-7, -2, 3),
            (-128, -1, -128),
        ];

        for (dividend, divisor, quotient) in cases {
            // LD 010, DIV 011, CN 0
            let mut emulator = emulator(0x000, &[0x80, 0x10, 0x70, 0x11, 0x30]);
            emulator.memory[0x010] = *dividend as u8;
            emulator.memory[0x011] = *divisor as u8;

            emulator.run(0x000, TestIo::new()).unwrap();

            assert_eq!(emulator.context.accumulator, *quotient, "{} / {}", dividend, divisor);
        }
    }

    #[test]
    fn test_division_by_zero() {
        // SC 004, CN 0, DIV 010
        let mut emulator = emulator(0x000, &[0xA0, 0x04, 0x30, 0xFF, 0x70, 0x10]);
        emulator.memory[0x010] = 0;

        let fault = emulator.run(0x000, TestIo::new()).unwrap_err();

        assert_eq!(fault, Fault::DivisionByZero { address: 0x004 });
        assert!(emulator.error());
        assert_eq!(emulator.context.pc, 0);
        assert!(emulator.context.call_stack.is_empty());
    }

    #[test]
    fn test_pointer_latch() {
        // CN 1, LD 020, LD 010, CN 0
        let mut emulator = emulator(0x000, &[0x31, 0x80, 0x20, 0x80, 0x10, 0x30]);
        emulator.memory[0x020] = 0x00;
        emulator.memory[0x021] = 0x10;
        emulator.memory[0x010] = 0x30;

        let mut io = TestIo::new();
        emulator.step(&mut io).unwrap();
        assert!(emulator.context.pointer);

        emulator.step(&mut io).unwrap();
        assert!(!emulator.context.pointer);
        assert_eq!(emulator.context.accumulator, 0x30);

        emulator.step(&mut io).unwrap();
        assert_eq!(emulator.context.accumulator, 0x30);
    }

    #[test]
    fn test_pointer_store() {
        // LD 010, CN 1, MM 020, CN 0
        let mut emulator = emulator(0x000, &[0x80, 0x10, 0x31, 0x90, 0x20, 0x30]);
        emulator.memory[0x010] = 0x42;
        emulator.memory[0x020] = 0x05;
        emulator.memory[0x021] = 0x55;

        emulator.run(0x000, TestIo::new()).unwrap();

        assert_eq!(emulator.memory[0x555], 0x42);
        assert_eq!(emulator.memory[0x020], 0x05);
    }

    #[test]
    fn test_untaken_jump_keeps_latch() {
        // LD 010 (1), CN 1, JZ 020, LD 030, CN 0
        let mut emulator = emulator(0x000, &[0x80, 0x10, 0x31, 0x10, 0x20, 0x80, 0x30, 0x30]);
        emulator.memory[0x010] = 0x01;
        emulator.memory[0x030] = 0x00;
        emulator.memory[0x031] = 0x40;
        emulator.memory[0x040] = 0x55;

        let mut io = TestIo::new();
        emulator.step(&mut io).unwrap();
        emulator.step(&mut io).unwrap();
        emulator.step(&mut io).unwrap();
        assert_eq!(emulator.context.pc, 0x005);
        assert!(emulator.context.pointer);

        emulator.run(0x005, io).unwrap();

        assert_eq!(emulator.context.accumulator, 0x55);
        assert!(!emulator.context.pointer);
    }

    #[test]
    fn test_taken_jump_consumes_latch() {
        // CN 1, JZ 020 / 020: pointer to 040 / 040: CN 0
        let mut emulator = emulator(0x000, &[0x31, 0x10, 0x20]);
        emulator.memory[0x020] = 0x00;
        emulator.memory[0x021] = 0x40;
        emulator.memory[0x040] = 0x30;

        let mut io = TestIo::new();
        emulator.step(&mut io).unwrap();
        emulator.step(&mut io).unwrap();

        assert_eq!(emulator.context.pc, 0x040);
        assert!(!emulator.context.pointer);
    }

    #[test]
    fn test_subroutine_call_clears_latch() {
        // CN 1, SC 020 / 020: bytes that would point to 030
        let mut emulator = emulator(0x000, &[0x31, 0xA0, 0x20]);
        emulator.memory[0x020] = 0x00;
        emulator.memory[0x021] = 0x30;

        let mut io = TestIo::new();
        emulator.step(&mut io).unwrap();
        emulator.step(&mut io).unwrap();

        assert_eq!(emulator.context.pc, 0x020);
        assert_eq!(emulator.context.call_stack, vec![0x001]);
        assert!(!emulator.context.pointer);
    }

    #[test]
    fn test_subroutine_linkage() {
        // SC 010, CN 0 / 010: OS 0
        let mut emulator = emulator(0x000, &[0xA0, 0x10, 0x30]);
        emulator.memory[0x010] = 0xB0;

        let mut io = TestIo::new();
        emulator.step(&mut io).unwrap();
        assert_eq!(emulator.context.call_stack, vec![0x000]);
        assert_eq!(emulator.context.pc, 0x010);

        emulator.step(&mut io).unwrap();
        assert_eq!(emulator.context.pc, 0x002);
        assert!(emulator.context.call_stack.is_empty());

        emulator.step(&mut io).unwrap();
        assert_eq!(emulator.state(), State::Halted { error: false });
    }

    #[test]
    fn test_return_without_call_halts() {
        let mut emulator = emulator(0x000, &[0xB0]);

        emulator.run(0x000, TestIo::new()).unwrap();

        assert_eq!(emulator.state(), State::Halted { error: false });
    }

    #[test]
    fn test_error_call() {
        let mut emulator = emulator(0x100, &[0xA1, 0x10]);
        emulator.memory[0x110] = 0xB3;

        let fault = emulator.run(0x100, TestIo::new()).unwrap_err();

        assert_eq!(fault, Fault::ErrorCall { code: 3 });
        assert_eq!(emulator.state(), State::Halted { error: true });
        assert!(emulator.context.call_stack.is_empty());
        assert_eq!(emulator.context.pc, 0);
    }

    #[test]
    fn test_io() {
        // IO 0, IO 1, IO 0
        let mut emulator = emulator(0x000, &[0xC0, 0xC1, 0xC0]);
        let mut io = TestIo::with_input(vec![0xFE]);

        let fault = emulator.run(0x000, &mut io).unwrap_err();

        assert_eq!(fault, Fault::InputExhausted);
        assert_eq!(io.output(), &[0xFE]);
        assert_eq!(emulator.context.accumulator, -2);
    }

    #[test]
    fn test_illegal_opcode() {
        let mut emulator = Emulator::new();

        let fault = emulator.run(0x123, TestIo::new()).unwrap_err();

        assert_eq!(fault, Fault::IllegalOpcode { address: 0x123, byte: 0xFF });
        assert!(emulator.error());
    }

    #[test]
    fn test_stream_io() {
        let input = "0a ff\n\n 7F";
        let mut io = StreamIo::new(input.as_bytes(), Vec::new());

        assert_eq!(io.input().unwrap(), Some(0x0A));
        assert_eq!(io.input().unwrap(), Some(0xFF));
        assert_eq!(io.input().unwrap(), Some(0x7F));
        assert_eq!(io.input().unwrap(), None);

        io.output(0x05).unwrap();
        io.output(0xC0).unwrap();

        let (_, output) = io.into_inner();
        assert_eq!(String::from_utf8(output).unwrap(), "05 C0 ");
    }

    #[test]
    fn test_stream_io_malformed_input() {
        // IO 0
        let mut emulator = emulator(0x000, &[0xC0]);
        let io = StreamIo::new("XYZ".as_bytes(), io::sink());

        match emulator.run(0x000, io) {
            Err(Fault::Device { message }) => assert!(message.contains("XYZ"), "{}", message),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_load_checksum_policy() {
        let program = Program::new(0x200, vec![0x30]);
        let mut object = ObjectFile::from(program);
        object.checksum = object.checksum.wrapping_add(1);

        let mut emulator = Emulator::new();
        assert!(emulator.load(&object, ChecksumPolicy::Strict).is_err());
        assert_eq!(emulator.memory[0x200], 0xFF);

        emulator.load(&object, ChecksumPolicy::Advisory).unwrap();
        assert_eq!(emulator.memory[0x200], 0x30);
    }

    #[test]
    fn test_events() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let events = Rc::new(RefCell::new(Vec::new()));

        // IO 0, MM 010, CN 0
        let mut emulator = emulator(0x000, &[0xC0, 0x90, 0x10, 0x30]);
        let sink = events.clone();
        emulator.add_listener(move |event: &Event| sink.borrow_mut().push(event.clone()));

        emulator.run(0x000, TestIo::with_input(vec![0x11])).unwrap();

        assert_eq!(*events.borrow(), vec![
            Event::Input { data: 0x11 },
            Event::AccumulatorChange { data: 0x11 },
            Event::MemoryChange { address: 0x010, data: 0x11 },
            Event::Halt { address: 0x003 },
        ]);
    }
}
