//! Argument (mode, value) pairs carried in an instruction's 18-bit slots.

use core::fmt;

/// How an 18-bit argument slot should be interpreted.
///
/// Encoded in the top 2 bits of the slot; the low 16 bits hold the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ArgMode {
    /// Slot is unused; value bits are ignored.
    None = 0,
    /// Value selects one of the 8 interpreter registers (low 3 bits).
    Reg = 1,
    /// Value is a 16-bit immediate.
    Imm = 2,
    /// Not a legal mode for any opcode; always rejected by the validator.
    Reserved = 3,
}

impl ArgMode {
    /// Decode the 2-bit mode tag. Never fails: all 4 bit patterns are valid
    /// `ArgMode` values, `Reserved` included.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => ArgMode::None,
            1 => ArgMode::Reg,
            2 => ArgMode::Imm,
            _ => ArgMode::Reserved,
        }
    }

    /// The 2-bit tag for this mode.
    pub const fn bits(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for ArgMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArgMode::None => "none",
            ArgMode::Reg => "reg",
            ArgMode::Imm => "imm",
            ArgMode::Reserved => "reserved",
        };
        f.write_str(s)
    }
}

bitflags::bitflags! {
    /// The set of `ArgMode`s an opcode's argument slot will accept.
    ///
    /// The validator (§4.B) rejects any instruction whose argument mode is
    /// outside the set allowed for its position, so this is the single
    /// source of truth for "is this instruction well-formed".
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct ArgModeSet: u8 {
        const NONE = 1 << (ArgMode::None as u8);
        const REG = 1 << (ArgMode::Reg as u8);
        const IMM = 1 << (ArgMode::Imm as u8);
        const RESERVED = 1 << (ArgMode::Reserved as u8);

        /// Either a register or an immediate; the common "R/I" contract.
        const REG_OR_IMM = Self::REG.bits | Self::IMM.bits;
    }
}

impl ArgModeSet {
    /// Whether `mode` is one of the modes in this set.
    pub fn allows(self, mode: ArgMode) -> bool {
        self.contains(ArgModeSet::from_bits_truncate(1 << mode.bits()))
    }
}

/// An 18-bit argument slot: a 2-bit mode tag plus a 16-bit value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Arg {
    mode: ArgMode,
    value: u16,
}

impl Arg {
    /// Build an argument from a mode and a raw 16-bit value.
    pub const fn new(mode: ArgMode, value: u16) -> Self {
        Self { mode, value }
    }

    /// The argument's mode.
    pub const fn mode(&self) -> ArgMode {
        self.mode
    }

    /// The argument's raw 16-bit value, regardless of mode.
    pub const fn value(&self) -> u16 {
        self.value
    }

    /// Low 3 bits of the value, the register index for `ArgMode::Reg`.
    ///
    /// Per invariant 3, register index bits beyond bit 2 are ignored: this
    /// is a masking operation, not a range check.
    pub const fn reg_index(&self) -> usize {
        (self.value & 0b111) as usize
    }

    /// The value reinterpreted as a signed 16-bit jump displacement.
    pub const fn as_displacement(&self) -> i16 {
        self.value as i16
    }

    /// Unpack an 18-bit field (as stored in the low 18 bits of a `u32`)
    /// into a mode tag and a 16-bit value.
    pub const fn from_field(field: u32) -> Self {
        let mode = ArgMode::from_bits((field >> 16) as u8);
        let value = (field & 0xffff) as u16;
        Self { mode, value }
    }

    /// Pack back into an 18-bit field (low 18 bits of the returned `u32`).
    pub const fn to_field(self) -> u32 {
        ((self.mode.bits() as u32) << 16) | self.value as u32
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            ArgMode::Reg => write!(f, "r{}", self.reg_index()),
            ArgMode::Imm => write!(f, "#{}", self.value),
            ArgMode::None => write!(f, "-"),
            ArgMode::Reserved => write!(f, "<reserved:{}>", self.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arg_mode_round_trips_through_all_four_bit_patterns() {
        for bits in 0u8..4 {
            let mode = ArgMode::from_bits(bits);
            assert_eq!(mode.bits(), bits);
        }
    }

    #[test]
    fn reg_index_masks_to_three_bits() {
        let arg = Arg::new(ArgMode::Reg, 0xfff9);
        assert_eq!(arg.reg_index(), 0b001);
    }

    #[test]
    fn arg_mode_set_allows_only_listed_modes() {
        let set = ArgModeSet::REG_OR_IMM;
        assert!(set.allows(ArgMode::Reg));
        assert!(set.allows(ArgMode::Imm));
        assert!(!set.allows(ArgMode::None));
        assert!(!set.allows(ArgMode::Reserved));
    }

    #[quickcheck_macros::quickcheck]
    fn field_round_trip(mode_bits: u8, value: u16) -> bool {
        let arg = Arg::new(ArgMode::from_bits(mode_bits), value);
        Arg::from_field(arg.to_field()) == arg
    }
}
