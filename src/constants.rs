//! Hardware constants for the FV-1: capacities, accumulator bounds and the
//! fixed register layout. Mirrors the role of `vcpu::constants` in the
//! original processor core, scaled to the chip this crate models.

/// Number of 32-bit instruction words in one program image.
pub const PROGRAM_CAPACITY: usize = 128;

/// Size of the circular delay-RAM, in samples.
pub const DELAY_CAPACITY: usize = 32_768;

/// Number of addressable 32-bit registers (0x00-0x3F).
pub const REGISTER_COUNT: usize = 64;

/// Lower bound of the accumulator, inclusive.
pub const MIN_ACC: f64 = -1.0;

/// Upper bound of the accumulator, inclusive (`1 - 2^-23`).
pub const MAX_ACC: f64 = 1.0 - 1.0 / 8_388_608.0;

/// NOP encoding emitted to pad a short program to [`PROGRAM_CAPACITY`].
pub const NOP_WORD: u32 = 0x0000_0011;

/// First address of the user-assignable register window (0x20-0x3F).
pub const USER_REGISTER_START: u8 = 0x20;
/// Last address of the user-assignable register window, inclusive.
pub const USER_REGISTER_END: u8 = 0x3F;

pub mod registers {
    //! Fixed register-file slots, named the way SpinASM predefines them.

    pub const SIN0_RATE: u8 = 0x00;
    pub const SIN0_RANGE: u8 = 0x01;
    pub const SIN1_RATE: u8 = 0x02;
    pub const SIN1_RANGE: u8 = 0x03;
    pub const RMP0_RATE: u8 = 0x04;
    pub const RMP0_RANGE: u8 = 0x05;
    pub const RMP1_RATE: u8 = 0x06;
    pub const RMP1_RANGE: u8 = 0x07;

    pub const POT0: u8 = 0x10;
    pub const POT1: u8 = 0x11;
    pub const POT2: u8 = 0x12;
    pub const ADCL: u8 = 0x14;
    pub const ADCR: u8 = 0x15;
    pub const DACL: u8 = 0x16;
    pub const DACR: u8 = 0x17;
    pub const ADDR_PTR: u8 = 0x18;

    /// `REG0..REG31`, the general-purpose register window.
    pub const REG0: u8 = 0x20;

    /// Returns the predefined register names and their indices, in the order
    /// SpinASM installs them before any user symbol.
    pub fn predefined() -> &'static [(&'static str, u8)] {
        &[
            ("SIN0_RATE", SIN0_RATE),
            ("SIN0_RANGE", SIN0_RANGE),
            ("SIN1_RATE", SIN1_RATE),
            ("SIN1_RANGE", SIN1_RANGE),
            ("RMP0_RATE", RMP0_RATE),
            ("RMP0_RANGE", RMP0_RANGE),
            ("RMP1_RATE", RMP1_RATE),
            ("RMP1_RANGE", RMP1_RANGE),
            ("POT0", POT0),
            ("POT1", POT1),
            ("POT2", POT2),
            ("ADCL", ADCL),
            ("ADCR", ADCR),
            ("DACL", DACL),
            ("DACR", DACR),
            ("ADDR_PTR", ADDR_PTR),
        ]
    }

    /// Name of `REG<n>` for `n` in `0..32`, used to seed the general-purpose window.
    pub fn general_purpose_name(n: u8) -> String {
        format!("REG{}", n)
    }
}

/// Skip-flag bits for `SKP`, OR-combined on the flag mask. These are
/// positions *within* the 5-bit flags field (`field(word, 27, 5)`), not
/// within the full instruction word.
pub mod skip_flags {
    pub const RUN: u32 = 0b10000;
    pub const ZRC: u32 = 0b01000;
    pub const ZRO: u32 = 0b00100;
    pub const GEZ: u32 = 0b00010;
    pub const NEG: u32 = 0b00001;
}

/// LFO indices used by `CHO` and by the hidden `REG` latch.
pub mod lfo_index {
    pub const SIN0: u8 = 0;
    pub const SIN1: u8 = 1;
    pub const RMP0: u8 = 2;
    pub const RMP1: u8 = 3;
    pub const COS0: u8 = 8;
    pub const COS1: u8 = 9;

    /// Maps a raw `CHO` LFO selector to a dense `0..6` latch/state index.
    pub fn slot(selector: u8) -> Option<usize> {
        match selector {
            SIN0 => Some(0),
            SIN1 => Some(1),
            RMP0 => Some(2),
            RMP1 => Some(3),
            COS0 => Some(4),
            COS1 => Some(5),
            _ => None,
        }
    }
}

