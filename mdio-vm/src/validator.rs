//! Program validator (§4.B): reject malformed or out-of-policy programs
//! before they ever touch the bus.

use mdio_asm::{Arg, ArgModeSet, Instruction, Program, MAX_PROGRAM_LEN};

/// Why a program was rejected. `Display` renders the exact diagnostic text
/// the original kernel module attaches via `NL_SET_ERR_MSG_ATTR`, so tests
/// (and log lines) can match on the message the same way a caller
/// inspecting the real `ERROR` attribute would.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// §6: `PROG` attribute exceeds the 4096-byte policy maximum.
    #[error("Program too long: {len} bytes exceeds the 4096-byte limit")]
    TooLong {
        /// The offending byte length.
        len: usize,
    },
    /// §4.B.1: length is zero or not a multiple of the instruction size.
    #[error("Unaligned instruction")]
    Unaligned {
        /// The offending byte length.
        len: usize,
    },
    /// §4.B.2: `op` does not name a known opcode.
    #[error("Illegal instruction")]
    IllegalInstruction {
        /// Zero-based index of the offending instruction.
        index: usize,
        /// The raw opcode byte.
        opcode: u8,
    },
    /// §4.B.2: an argument's mode bit is outside the opcode's allowed set.
    #[error("Argument {slot} invalid")]
    InvalidArgument {
        /// Zero-based index of the offending instruction.
        index: usize,
        /// Which argument (0, 1 or 2) was invalid.
        slot: u8,
    },
}

/// Validate a raw program attribute end to end: length policy, alignment,
/// then per-instruction opcode and argument-mode checks, in that order.
///
/// Failure is total (§4.B): the first bad instruction rejects the whole
/// program, and validation never executes anything.
pub fn validate(raw: &[u8]) -> Result<Program, ValidationError> {
    if raw.len() > MAX_PROGRAM_LEN {
        return Err(ValidationError::TooLong { len: raw.len() });
    }

    let program = Program::decode(raw).map_err(|_| ValidationError::Unaligned { len: raw.len() })?;

    for (index, insn) in program.instructions().iter().enumerate() {
        validate_instruction(index, insn)?;
    }

    Ok(program)
}

fn validate_instruction(index: usize, insn: &Instruction) -> Result<(), ValidationError> {
    let opcode = insn
        .opcode()
        .map_err(|opcode| ValidationError::IllegalInstruction { index, opcode })?;

    let (m0, m1, m2) = opcode.allowed_modes();
    validate_arg(index, 0, m0, insn.arg0())?;
    validate_arg(index, 1, m1, insn.arg1())?;
    validate_arg(index, 2, m2, insn.arg2())?;
    Ok(())
}

fn validate_arg(index: usize, slot: u8, allowed: ArgModeSet, arg: Arg) -> Result<(), ValidationError> {
    if allowed.allows(arg.mode()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidArgument { index, slot })
    }
}
