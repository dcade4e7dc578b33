use std::collections::VecDeque;
use std::mem;

use crate::decode::{Instruction, Mode, Opcode, decode};
use crate::error::VmError;
use crate::memory::Memory;

/// Execution status of a machine.
///
/// `Ready` and `Blocked` are non-terminal; `Halted` is terminal and
/// irreversible for the instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The machine can make progress.
    Ready,
    /// The machine stopped on an input instruction with an empty input
    /// queue. The instruction pointer still points at that instruction, so
    /// the next `run` re-attempts it.
    Blocked,
    /// The machine executed halt, or failed fatally. No further execution is
    /// permitted.
    Halted,
}

/// Read-only view of a machine's memory, registers, and status.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    /// The materialized memory cells.
    pub memory: &'a [i64],
    pub ip: i64,
    pub relative_base: i64,
    pub status: Status,
}

/// Outcome of a single fetch-decode-execute step.
enum Step {
    Continue,
    Blocked,
    Halted,
}

/// The Intcode machine from Advent of Code 2019.
///
/// A program is one flat sequence of integers serving as both code and data.
/// Each instruction word packs an opcode into its low two digits and one
/// addressing-mode digit per operand above them: position (0) treats the
/// operand as an address, immediate (1) as the value itself, relative (2) as
/// an address offset by the relative base register. The write target of an
/// instruction is always its last operand and may not be immediate.
///
/// Execution is resumable: [`Machine::run`] drives the fetch-decode-execute
/// loop until the program halts or needs input that has not been supplied,
/// then hands control back to the caller. Blocking does not advance the
/// instruction pointer, so resumption simply re-attempts the same input
/// instruction. Callers interleave [`Machine::supply_input`] and
/// [`Machine::run`] to converse with a program:
///
/// ```
/// use intcode::machine::Machine;
///
/// // Read one value, echo it back, halt.
/// let mut machine = Machine::from_image("3,0,4,0,99").unwrap();
/// assert!(machine.run().unwrap().is_empty()); // blocked, nothing printed yet
/// machine.supply_input(42).unwrap();
/// assert_eq!(machine.run().unwrap(), vec![42]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Machine {
    memory: Memory,
    ip: i64,
    relative_base: i64,
    input: VecDeque<i64>,
    output: Vec<i64>,
    status: Status,
}

impl Machine {
    /// Build a machine from an already-parsed program image.
    pub fn new(program: Vec<i64>) -> Self {
        Self {
            memory: Memory::new(program),
            ip: 0,
            relative_base: 0,
            input: VecDeque::new(),
            output: Vec::new(),
            status: Status::Ready,
        }
    }

    /// Parse a textual program image (comma-separated signed integers,
    /// surrounding whitespace tolerated) and build a machine from it.
    pub fn from_image(image: &str) -> Result<Self, VmError> {
        let program = image
            .trim()
            .split(',')
            .map(|token| {
                let token = token.trim();
                token
                    .parse()
                    .map_err(|_| VmError::InvalidImage(token.to_string()))
            })
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(Self::new(program))
    }

    /// Current execution status.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Append a value to the input queue.
    ///
    /// Legal at any time before the machine halts. The value takes effect on
    /// the next [`Machine::run`]; supplying input does not itself resume
    /// execution.
    pub fn supply_input(&mut self, value: i64) -> Result<(), VmError> {
        if self.status == Status::Halted {
            return Err(VmError::ProgramTerminated);
        }
        self.input.push_back(value);
        Ok(())
    }

    /// Drive the machine until it halts or blocks on input, then return the
    /// output accumulated since the previous drain.
    ///
    /// Output is observed once: the queue is cleared on return. Calling
    /// `run` again while blocked without supplying input is a no-op that
    /// re-blocks with empty output. Any error poisons the machine; later
    /// calls report `ProgramTerminated`.
    pub fn run(&mut self) -> Result<Vec<i64>, VmError> {
        if self.status == Status::Halted {
            return Err(VmError::ProgramTerminated);
        }
        loop {
            match self.step() {
                Ok(Step::Continue) => {}
                Ok(Step::Blocked) => {
                    self.status = Status::Blocked;
                    return Ok(mem::take(&mut self.output));
                }
                Ok(Step::Halted) => {
                    self.status = Status::Halted;
                    return Ok(mem::take(&mut self.output));
                }
                Err(err) => {
                    self.status = Status::Halted;
                    return Err(err);
                }
            }
        }
    }

    /// Read-only view of the machine for diagnostics. Mutates nothing.
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            memory: self.memory.as_slice(),
            ip: self.ip,
            relative_base: self.relative_base,
            status: self.status,
        }
    }

    /// Execute one instruction.
    ///
    /// Blocking returns before the instruction pointer moves, so the input
    /// instruction runs again on resume. Jumps assign the pointer directly;
    /// every other instruction advances it by `1 + arity`.
    fn step(&mut self) -> Result<Step, VmError> {
        let word = self.memory.read(self.ip)?;
        let instr = decode(word)?;
        match instr.opcode {
            Opcode::Add => {
                let a = self.read_operand(&instr, 0)?;
                let b = self.read_operand(&instr, 1)?;
                let target = self.write_target(word, &instr, 2)?;
                self.memory.write(target, a.wrapping_add(b))?;
            }
            Opcode::Mul => {
                let a = self.read_operand(&instr, 0)?;
                let b = self.read_operand(&instr, 1)?;
                let target = self.write_target(word, &instr, 2)?;
                self.memory.write(target, a.wrapping_mul(b))?;
            }
            Opcode::Input => {
                let Some(value) = self.input.pop_front() else {
                    return Ok(Step::Blocked);
                };
                let target = self.write_target(word, &instr, 0)?;
                self.memory.write(target, value)?;
            }
            Opcode::Output => {
                let value = self.read_operand(&instr, 0)?;
                self.output.push(value);
            }
            Opcode::JumpIfTrue => {
                let condition = self.read_operand(&instr, 0)?;
                let target = self.read_operand(&instr, 1)?;
                if condition != 0 {
                    self.ip = target;
                    return Ok(Step::Continue);
                }
            }
            Opcode::JumpIfFalse => {
                let condition = self.read_operand(&instr, 0)?;
                let target = self.read_operand(&instr, 1)?;
                if condition == 0 {
                    self.ip = target;
                    return Ok(Step::Continue);
                }
            }
            Opcode::LessThan => {
                let a = self.read_operand(&instr, 0)?;
                let b = self.read_operand(&instr, 1)?;
                let target = self.write_target(word, &instr, 2)?;
                self.memory.write(target, (a < b) as i64)?;
            }
            Opcode::Equals => {
                let a = self.read_operand(&instr, 0)?;
                let b = self.read_operand(&instr, 1)?;
                let target = self.write_target(word, &instr, 2)?;
                self.memory.write(target, (a == b) as i64)?;
            }
            Opcode::AdjustBase => {
                let delta = self.read_operand(&instr, 0)?;
                self.relative_base = self.relative_base.wrapping_add(delta);
            }
            Opcode::Halt => return Ok(Step::Halted),
        }
        self.ip += 1 + instr.opcode.arity() as i64;
        Ok(Step::Continue)
    }

    /// Resolve the value of the 0-indexed read operand `k`.
    fn read_operand(&mut self, instr: &Instruction, k: usize) -> Result<i64, VmError> {
        let operand = self.memory.read(self.ip + 1 + k as i64)?;
        match instr.mode(k) {
            Mode::Position => self.memory.read(operand),
            Mode::Immediate => Ok(operand),
            Mode::Relative => self.memory.read(self.relative_base.wrapping_add(operand)),
        }
    }

    /// Resolve the address the 0-indexed write-target operand `k` stores to.
    fn write_target(&mut self, word: i64, instr: &Instruction, k: usize) -> Result<i64, VmError> {
        let operand = self.memory.read(self.ip + 1 + k as i64)?;
        match instr.mode(k) {
            Mode::Position => Ok(operand),
            Mode::Relative => Ok(self.relative_base.wrapping_add(operand)),
            Mode::Immediate => Err(VmError::InvalidWriteMode(word)),
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Step the machine at most `limit` times, stopping early on halt,
    /// block, or error.
    fn step_bounded(machine: &mut Machine, limit: usize) -> usize {
        let mut steps = 0;
        while steps < limit {
            match machine.step() {
                Ok(Step::Continue) => steps += 1,
                _ => break,
            }
        }
        steps
    }

    proptest! {
        #[test]
        fn execution_never_panics(program in prop::collection::vec(-9i64..=9, 1..32)) {
            let mut machine = Machine::new(program);
            step_bounded(&mut machine, 64);
        }

        #[test]
        fn step_limit_respected(
            program in prop::collection::vec(-9i64..=9, 1..32),
            limit in 1usize..64
        ) {
            let mut machine = Machine::new(program);
            prop_assert!(step_bounded(&mut machine, limit) <= limit);
        }

        #[test]
        fn image_parse_round_trips(program in prop::collection::vec(any::<i64>(), 1..64)) {
            let image = program
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(",");
            let machine = Machine::from_image(&image).unwrap();
            prop_assert_eq!(machine.snapshot().memory, &program[..]);
        }
    }
}
