//! The packed 64-bit instruction word and its wire encoding.

use core::fmt;

use crate::args::Arg;
use crate::opcode::Opcode;

/// Size of a single instruction on the wire, in bytes.
pub const INSTRUCTION_LEN: usize = 8;

/// Maximum program length in bytes (§3: "capped at 4096 bytes").
pub const MAX_PROGRAM_LEN: usize = 4096;

/// Maximum number of instructions in a program (`MAX_PROGRAM_LEN / INSTRUCTION_LEN`).
pub const MAX_PROGRAM_INSNS: usize = MAX_PROGRAM_LEN / INSTRUCTION_LEN;

/// A decoded instruction: an opcode byte (not yet validated against the
/// opcode table) and three 18-bit arguments.
///
/// `Instruction` only knows how to pack and unpack itself against the wire
/// layout in spec §6; it does not know which opcodes exist or which
/// argument modes they allow — that's the validator's job, one layer up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Instruction {
    op: u8,
    reserved: u8,
    arg0: Arg,
    arg1: Arg,
    arg2: Arg,
}

impl Instruction {
    /// Build an instruction from a typed opcode and three arguments. The
    /// `reserved` field is always zero for an instruction built this way;
    /// only [`Instruction::from_bytes`] can produce a non-zero one.
    pub const fn new(op: Opcode, arg0: Arg, arg1: Arg, arg2: Arg) -> Self {
        Self {
            op: op as u8,
            reserved: 0,
            arg0,
            arg1,
            arg2,
        }
    }

    /// The raw opcode byte, before validation against the known opcode set.
    pub const fn raw_opcode(&self) -> u8 {
        self.op
    }

    /// Decode the opcode byte, if it names a known opcode.
    pub fn opcode(&self) -> Result<Opcode, u8> {
        Opcode::try_from(self.op)
    }

    /// First argument.
    pub const fn arg0(&self) -> Arg {
        self.arg0
    }

    /// Second argument.
    pub const fn arg1(&self) -> Arg {
        self.arg1
    }

    /// Third argument.
    pub const fn arg2(&self) -> Arg {
        self.arg2
    }

    /// Pack into the 8-byte little-endian wire form.
    ///
    /// Layout (spec §6): byte 0 is `op`; the remaining 7 bytes (56 bits)
    /// pack `reserved:2 | arg0:18 | arg1:18 | arg2:18`, least-significant
    /// bit first — i.e. exactly the little-endian bytes of a `u64` built as
    /// `op | reserved << 8 | arg0 << 10 | arg1 << 28 | arg2 << 46`.
    pub fn to_bytes(self) -> [u8; INSTRUCTION_LEN] {
        let word: u64 = (self.op as u64)
            | ((self.reserved as u64) << 8)
            | ((self.arg0.to_field() as u64) << 10)
            | ((self.arg1.to_field() as u64) << 28)
            | ((self.arg2.to_field() as u64) << 46);
        word.to_le_bytes()
    }

    /// Unpack from the 8-byte little-endian wire form.
    ///
    /// The `reserved` bits are captured, not discarded: invariant 1
    /// (they must be zero) is a validator concern, not a decoding
    /// concern, so a non-zero `reserved` field still decodes to a
    /// concrete instruction the validator can inspect via
    /// [`Instruction::reserved_bits`] and reject with a diagnostic.
    pub fn from_bytes(bytes: [u8; INSTRUCTION_LEN]) -> Self {
        let word = u64::from_le_bytes(bytes);
        let op = (word & 0xff) as u8;
        let reserved = ((word >> 8) & 0b11) as u8;
        let arg0 = Arg::from_field(((word >> 10) & 0x3ffff) as u32);
        let arg1 = Arg::from_field(((word >> 28) & 0x3ffff) as u32);
        let arg2 = Arg::from_field(((word >> 46) & 0x3ffff) as u32);
        Self {
            op,
            reserved,
            arg0,
            arg1,
            arg2,
        }
    }

    /// The `reserved` bits as decoded from the wire. Must be zero
    /// (invariant 1); non-zero here means this instruction came from
    /// [`Instruction::from_bytes`] with bits 8-9 set.
    pub const fn reserved_bits(self) -> u8 {
        self.reserved
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.opcode() {
            Ok(op) => write!(f, "{op} {}, {}, {}", self.arg0, self.arg1, self.arg2),
            Err(byte) => write!(f, "<unknown opcode {byte:#04x}>"),
        }
    }
}

/// A parsed, length-aligned sequence of instructions, decoded from a raw
/// binary program attribute but not yet validated (§4.B is a separate
/// pass, owned by `mdio-vm`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    insns: Vec<Instruction>,
}

/// A program's raw byte length was not a positive multiple of
/// [`INSTRUCTION_LEN`] (spec §4.B.1, "Unaligned instruction").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnalignedProgram {
    /// The offending byte length.
    pub len: usize,
}

impl fmt::Display for UnalignedProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unaligned instruction: program length {} is not a positive multiple of {}",
            self.len, INSTRUCTION_LEN
        )
    }
}

impl std::error::Error for UnalignedProgram {}

impl Program {
    /// Decode a raw byte slice into instructions, checking only the
    /// length-alignment rule (§4.B.1). Per-instruction legality is the
    /// validator's job.
    pub fn decode(bytes: &[u8]) -> Result<Self, UnalignedProgram> {
        if bytes.is_empty() || bytes.len() % INSTRUCTION_LEN != 0 {
            return Err(UnalignedProgram { len: bytes.len() });
        }

        let insns = bytes
            .chunks_exact(INSTRUCTION_LEN)
            .map(|chunk| {
                let mut buf = [0u8; INSTRUCTION_LEN];
                buf.copy_from_slice(chunk);
                Instruction::from_bytes(buf)
            })
            .collect();

        Ok(Self { insns })
    }

    /// Encode back to the raw wire form.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.insns.len() * INSTRUCTION_LEN);
        for insn in &self.insns {
            out.extend_from_slice(&insn.to_bytes());
        }
        out
    }

    /// Build a program directly from its instructions (used by the
    /// userspace program builder, which never round-trips through bytes).
    pub fn from_instructions(insns: Vec<Instruction>) -> Self {
        Self { insns }
    }

    /// The decoded instructions, in program order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.insns
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.insns.len()
    }

    /// Whether the program has no instructions.
    pub fn is_empty(&self) -> bool {
        self.insns.is_empty()
    }
}
