//! The fixed opcode set the interpreter understands.

use core::fmt;

use crate::args::ArgModeSet;

/// Interpreter opcode.
///
/// Each variant documents its argument contract and semantics; see
/// [`Opcode::allowed_modes`] for the machine-checkable version of the same
/// table, which is what the validator (mdio-vm's `validator` module)
/// actually enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Opcode {
    /// Read register `arg1` of device `arg0` into register `arg2`.
    ///
    /// | Operation | `regs[arg2] = bus.read(arg0, arg1)` |
    /// | Encoding  | `0x01 arg0:R/I arg1:R/I arg2:R`      |
    Read = 1,
    /// Write `arg2` to register `arg1` of device `arg0`.
    ///
    /// | Operation | `bus.write(arg0, arg1, arg2)`        |
    /// | Encoding  | `0x02 arg0:R/I arg1:R/I arg2:R/I`     |
    Write = 2,
    /// Bitwise AND of two 16-bit values.
    ///
    /// | Operation | `regs[arg2] = arg0 & arg1` |
    /// | Encoding  | `0x03 arg0:R/I arg1:R/I arg2:R` |
    And = 3,
    /// Bitwise OR of two 16-bit values.
    ///
    /// | Operation | `regs[arg2] = arg0 \| arg1` |
    /// | Encoding  | `0x04 arg0:R/I arg1:R/I arg2:R` |
    Or = 4,
    /// 16-bit wrapping addition.
    ///
    /// | Operation | `regs[arg2] = arg0 + arg1` (wrapping) |
    /// | Encoding  | `0x05 arg0:R/I arg1:R/I arg2:R` |
    Add = 5,
    /// Relative jump if `arg0 == arg1`.
    ///
    /// | Operation | `if arg0 == arg1 { pc += sext16(arg2) }` |
    /// | Encoding  | `0x06 arg0:R/I arg1:R/I arg2:I` |
    Jeq = 6,
    /// Relative jump if `arg0 != arg1`.
    ///
    /// | Operation | `if arg0 != arg1 { pc += sext16(arg2) }` |
    /// | Encoding  | `0x07 arg0:R/I arg1:R/I arg2:I` |
    Jne = 7,
    /// Append `arg0`, zero-extended to 32 bits, to the reply stream.
    ///
    /// | Operation | `reply.push(zext32(arg0))` |
    /// | Encoding  | `0x08 arg0:R/I arg1:- arg2:-` |
    Emit = 8,
}

impl Opcode {
    /// All opcodes, in ascending numeric order.
    pub const ALL: [Opcode; 8] = [
        Opcode::Read,
        Opcode::Write,
        Opcode::And,
        Opcode::Or,
        Opcode::Add,
        Opcode::Jeq,
        Opcode::Jne,
        Opcode::Emit,
    ];

    /// The allowed argument modes for `arg0`, `arg1` and `arg2`, in that
    /// order. This is the exhaustive table Design Note §9 calls for: every
    /// defined opcode has an entry, and no entry is looser than the
    /// contract in spec §3.
    pub const fn allowed_modes(self) -> (ArgModeSet, ArgModeSet, ArgModeSet) {
        use ArgModeSet as M;
        match self {
            Opcode::Read => (M::REG_OR_IMM, M::REG_OR_IMM, M::REG),
            Opcode::Write => (M::REG_OR_IMM, M::REG_OR_IMM, M::REG_OR_IMM),
            Opcode::And => (M::REG_OR_IMM, M::REG_OR_IMM, M::REG),
            Opcode::Or => (M::REG_OR_IMM, M::REG_OR_IMM, M::REG),
            Opcode::Add => (M::REG_OR_IMM, M::REG_OR_IMM, M::REG),
            Opcode::Jeq => (M::REG_OR_IMM, M::REG_OR_IMM, M::IMM),
            Opcode::Jne => (M::REG_OR_IMM, M::REG_OR_IMM, M::IMM),
            Opcode::Emit => (M::REG_OR_IMM, M::NONE, M::NONE),
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Opcode::Read => "read",
            Opcode::Write => "write",
            Opcode::And => "and",
            Opcode::Or => "or",
            Opcode::Add => "add",
            Opcode::Jeq => "jeq",
            Opcode::Jne => "jne",
            Opcode::Emit => "emit",
        };
        f.write_str(s)
    }
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    /// Decode a raw opcode byte. The error carries the offending byte back
    /// to the caller, which the validator turns into an "Illegal
    /// instruction" diagnostic.
    fn try_from(byte: u8) -> Result<Self, u8> {
        match byte {
            1 => Ok(Opcode::Read),
            2 => Ok(Opcode::Write),
            3 => Ok(Opcode::And),
            4 => Ok(Opcode::Or),
            5 => Ok(Opcode::Add),
            6 => Ok(Opcode::Jeq),
            7 => Ok(Opcode::Jne),
            8 => Ok(Opcode::Emit),
            other => Err(other),
        }
    }
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> u8 {
        op as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_opcode_round_trips_through_its_byte() {
        for op in Opcode::ALL {
            assert_eq!(Opcode::try_from(u8::from(op)), Ok(op));
        }
    }

    #[test]
    fn unknown_opcode_byte_is_rejected() {
        assert_eq!(Opcode::try_from(0), Err(0));
        assert_eq!(Opcode::try_from(9), Err(9));
        assert_eq!(Opcode::try_from(255), Err(255));
    }

    #[test]
    fn allowed_modes_table_is_exhaustive_and_reg_only_destinations_match_spec() {
        use crate::args::ArgMode;
        for op in Opcode::ALL {
            let (a0, a1, a2) = op.allowed_modes();
            assert!(!a0.is_empty(), "{op} must accept some mode for arg0");
            match op {
                Opcode::Read | Opcode::And | Opcode::Or | Opcode::Add => {
                    assert!(a2.allows(ArgMode::Reg));
                    assert!(!a2.allows(ArgMode::Imm));
                }
                Opcode::Emit => {
                    assert_eq!(a1, ArgModeSet::NONE);
                    assert_eq!(a2, ArgModeSet::NONE);
                }
                _ => {}
            }
        }
    }
}
