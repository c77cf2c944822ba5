//! Packed instruction encoding for the MDIO transfer protocol.
//!
//! This crate is the shared wire format between the kernel-side
//! interpreter (`mdio-vm`) and the userspace library (`mdio-client`),
//! the same role `include/linux/mdio-netlink.h` plays in the original
//! C implementation. It contains no interpretation logic: packing,
//! unpacking, and the static opcode/argument-mode tables only.

pub mod args;
pub mod attr;
pub mod instruction;
mod opcode;

pub use args::{Arg, ArgMode, ArgModeSet};
pub use instruction::{
    Instruction, Program, UnalignedProgram, INSTRUCTION_LEN, MAX_PROGRAM_INSNS, MAX_PROGRAM_LEN,
};
pub use opcode::Opcode;
