//! The instruction dispatch loop (§4.C): register machine semantics, jump
//! arithmetic, and the reply stream contract.

use std::time::{Duration, Instant};

use mdio_asm::{Arg, ArgMode, Instruction, Opcode, Program};
use tracing::trace;

use crate::bus::{DeviceAddress, MdioBus};
use crate::errno::{EINVAL, ETIMEDOUT};

/// Number of general-purpose registers (§3).
pub const NUM_REGISTERS: usize = 8;

/// Why a program run stopped before falling off the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Abort {
    /// A bus operation failed; carries the bus's negative errno.
    Bus(i32),
    /// A jump target fell below instruction zero.
    NegativePc,
    /// The deadline elapsed before the next instruction could start
    /// (§3 invariant 4: checked at instruction boundaries only).
    Timeout,
    /// `EMIT` could not fit its datum even after one flush-and-retry.
    ReplyTooSmall,
    /// The opcode byte didn't name a known opcode. Should be impossible
    /// after validation; defensive (§4.C), matching
    /// `mdio_nl_eval`'s `default: ret = -EINVAL` arm.
    InvalidOpcode,
}

impl Abort {
    /// The negative errno this abort surfaces to the caller (§7).
    pub fn errno(self) -> i32 {
        match self {
            Abort::Bus(errno) => errno,
            Abort::NegativePc => EINVAL,
            Abort::Timeout => ETIMEDOUT,
            Abort::ReplyTooSmall => crate::errno::EMSGSIZE,
            Abort::InvalidOpcode => EINVAL,
        }
    }
}

/// The result of running a program to completion or abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The program counter ran past the last instruction normally.
    Completed,
    /// Execution stopped early.
    Aborted(Abort),
}

/// Destination for `EMIT`ted data, decoupled from how the caller chunks or
/// transmits it (§4.D layers the actual multi-part framing on top).
///
/// `try_append` returning `false` means "out of room"; the interpreter
/// will ask the sink to `flush` once and retry exactly once before
/// aborting with [`Abort::ReplyTooSmall`] (spec: "retry exactly once").
pub trait ReplySink {
    /// Attempt to append one 32-bit datum. `false` if there's no room.
    fn try_append(&mut self, value: u32) -> bool;

    /// Flush whatever is buffered, freeing room for further appends.
    fn flush(&mut self);
}

/// A `ReplySink` that collects every emitted value, for tests and for
/// callers that don't care about chunking.
#[derive(Debug, Default)]
pub struct VecReplySink {
    /// Values emitted so far, in emission order.
    pub values: Vec<u32>,
}

impl ReplySink for VecReplySink {
    fn try_append(&mut self, value: u32) -> bool {
        self.values.push(value);
        true
    }

    fn flush(&mut self) {}
}

/// Runs a validated [`Program`] against a bus and a reply sink.
///
/// One `Interpreter` corresponds to one program execution: it owns the
/// register file and the deadline, and is dropped at the end of
/// [`eval`]. The bus lock itself is the caller's responsibility (§4.E);
/// by the time `eval` runs, the lock is already held for the whole call.
pub struct Interpreter<'a, B: MdioBus, S: ReplySink> {
    program: &'a Program,
    bus: &'a mut B,
    sink: &'a mut S,
    registers: [u16; NUM_REGISTERS],
    deadline: Instant,
}

impl<'a, B: MdioBus, S: ReplySink> Interpreter<'a, B, S> {
    /// Build an interpreter for `program`, with a deadline `timeout` from
    /// now (§3: "TIMEOUT attribute... converted to an absolute deadline at
    /// program start").
    pub fn new(program: &'a Program, bus: &'a mut B, sink: &'a mut S, timeout: Duration) -> Self {
        Self {
            program,
            bus,
            sink,
            registers: [0; NUM_REGISTERS],
            deadline: Instant::now() + timeout,
        }
    }

    /// Run the program to completion or abort.
    ///
    /// The deadline is checked once per instruction boundary, never mid-
    /// instruction (§3 invariant 4): a single `READ`/`WRITE` that blocks
    /// past the deadline is allowed to finish, and only the *next*
    /// instruction observes the expired clock.
    pub fn run(mut self) -> RunOutcome {
        let mut pc: i64 = 0;
        let len = self.program.instructions().len() as i64;

        while pc < len {
            if Instant::now() >= self.deadline {
                return RunOutcome::Aborted(Abort::Timeout);
            }

            let insn = &self.program.instructions()[pc as usize];
            trace!(pc, %insn, "executing instruction");

            match self.step(insn, pc) {
                Ok(Some(next_pc)) => pc = next_pc,
                Ok(None) => pc += 1,
                Err(abort) => return RunOutcome::Aborted(abort),
            }
        }

        RunOutcome::Completed
    }

    /// Execute one instruction. `Ok(Some(pc))` means control transferred
    /// to an explicit target; `Ok(None)` means fall through to `pc + 1`.
    fn step(&mut self, insn: &Instruction, pc: i64) -> Result<Option<i64>, Abort> {
        // Every instruction that reaches the interpreter has already
        // passed validation, so this should never miss — but a caller
        // that bypasses validation gets a run-time abort here instead of
        // a panic unwinding through the held bus lock.
        let opcode = insn.opcode().map_err(|_| Abort::InvalidOpcode)?;

        match opcode {
            Opcode::Read => {
                let device = DeviceAddress::from_raw(self.resolve(insn.arg0()));
                let register = self.resolve(insn.arg1());
                let value = self.bus.read(device, register).map_err(Abort::Bus)?;
                self.write_reg(insn.arg2(), value);
                Ok(None)
            }
            Opcode::Write => {
                let device = DeviceAddress::from_raw(self.resolve(insn.arg0()));
                let register = self.resolve(insn.arg1());
                let value = self.resolve(insn.arg2());
                self.bus.write(device, register, value).map_err(Abort::Bus)?;
                Ok(None)
            }
            Opcode::And => {
                let value = self.resolve(insn.arg0()) & self.resolve(insn.arg1());
                self.write_reg(insn.arg2(), value);
                Ok(None)
            }
            Opcode::Or => {
                let value = self.resolve(insn.arg0()) | self.resolve(insn.arg1());
                self.write_reg(insn.arg2(), value);
                Ok(None)
            }
            Opcode::Add => {
                let value = self.resolve(insn.arg0()).wrapping_add(self.resolve(insn.arg1()));
                self.write_reg(insn.arg2(), value);
                Ok(None)
            }
            Opcode::Jeq => self.branch(insn, pc, self.resolve(insn.arg0()) == self.resolve(insn.arg1())),
            Opcode::Jne => self.branch(insn, pc, self.resolve(insn.arg0()) != self.resolve(insn.arg1())),
            Opcode::Emit => {
                let value = self.resolve(insn.arg0()) as u32;
                if !self.sink.try_append(value) {
                    self.sink.flush();
                    if !self.sink.try_append(value) {
                        return Err(Abort::ReplyTooSmall);
                    }
                }
                Ok(None)
            }
        }
    }

    /// Evaluate a conditional jump's displacement (§9: "relative
    /// displacement computed from the instruction *following* the jump").
    fn branch(&mut self, insn: &Instruction, pc: i64, taken: bool) -> Result<Option<i64>, Abort> {
        if !taken {
            return Ok(None);
        }
        let displacement = insn.arg2().as_displacement() as i64;
        let target = pc + 1 + displacement;
        if target < 0 {
            return Err(Abort::NegativePc);
        }
        Ok(Some(target))
    }

    /// Resolve an argument to its 16-bit value: a register's contents for
    /// `Reg`, or the literal value for `Imm`/anything else.
    fn resolve(&self, arg: Arg) -> u16 {
        match arg.mode() {
            ArgMode::Reg => self.registers[arg.reg_index()],
            _ => arg.value(),
        }
    }

    fn write_reg(&mut self, arg: Arg, value: u16) {
        self.registers[arg.reg_index()] = value;
    }
}
