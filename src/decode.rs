//! Field extraction from a 32-bit instruction word, grouped by opcode. The
//! interpreter (`execute.rs`) matches on [`Decoded`] rather than re-deriving
//! bit positions itself, mirroring how `vcpu`'s `processor::logic::tick`
//! extracts all candidate fields once up front.

use crate::fixed;
use crate::opcode::{cho_bits, Opcode};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Decoded {
    Rda { c: f64, addr: u32 },
    Rmpa { c: f64 },
    Wra { c: f64, addr: u32 },
    Wrap { c: f64, addr: u32 },
    Rdax { c: f64, reg: u8 },
    Rdfx { c: f64, reg: u8 },
    Wrlx { c: f64, reg: u8 },
    Wrhx { c: f64, reg: u8 },
    Wrax { c: f64, reg: u8 },
    Maxx { c: f64, reg: u8 },
    Mulx { reg: u8 },
    Log { c: f64, d: f64 },
    Exp { c: f64, d: f64 },
    Sof { c: f64, d: f64 },
    And { mask: u32 },
    Or { mask: u32 },
    Xor { mask: u32 },
    Skp { flags: u32, n: u32 },
    Wlds { n: u8, f: i32, a: u32 },
    Wldr { n: u8, f: i32, a: u32 },
    Jam { n: u8 },
    ChoRda { n: u8, flags: u8, addr: u32 },
    ChoSof { n: u8, flags: u8, d: f64 },
    ChoRdal { n: u8 },
    /// Unrecognized opcode bits; treated as a `NOP` by the simulator.
    Invalid,
}

fn field(word: u32, shift: u32, bits: u32) -> u32 {
    let mask = if bits >= 32 { u32::MAX } else { (1u32 << bits) - 1 };
    (word >> shift) & mask
}

pub fn decode(word: u32) -> Decoded {
    let opcode = match Opcode::from_word(word) {
        Some(op) => op,
        None => return Decoded::Invalid,
    };

    match opcode {
        Opcode::Rda => Decoded::Rda {
            c: fixed::decode(fixed::S1_9, field(word, 21, 11)),
            addr: field(word, 5, 16),
        },
        Opcode::Rmpa => Decoded::Rmpa {
            c: fixed::decode(fixed::S1_9, field(word, 21, 11)),
        },
        Opcode::Wra => Decoded::Wra {
            c: fixed::decode(fixed::S1_9, field(word, 21, 11)),
            addr: field(word, 5, 16),
        },
        Opcode::Wrap => Decoded::Wrap {
            c: fixed::decode(fixed::S1_9, field(word, 21, 11)),
            addr: field(word, 5, 16),
        },
        Opcode::Rdax => Decoded::Rdax {
            c: fixed::decode(fixed::S1_14, field(word, 16, 16)),
            reg: field(word, 5, 6) as u8,
        },
        Opcode::Rdfx => Decoded::Rdfx {
            c: fixed::decode(fixed::S1_14, field(word, 16, 16)),
            reg: field(word, 5, 6) as u8,
        },
        Opcode::Wrlx => Decoded::Wrlx {
            c: fixed::decode(fixed::S1_14, field(word, 16, 16)),
            reg: field(word, 5, 6) as u8,
        },
        Opcode::Wrhx => Decoded::Wrhx {
            c: fixed::decode(fixed::S1_14, field(word, 16, 16)),
            reg: field(word, 5, 6) as u8,
        },
        Opcode::Wrax => Decoded::Wrax {
            c: fixed::decode(fixed::S1_14, field(word, 16, 16)),
            reg: field(word, 5, 6) as u8,
        },
        Opcode::Maxx => Decoded::Maxx {
            c: fixed::decode(fixed::S1_14, field(word, 16, 16)),
            reg: field(word, 5, 6) as u8,
        },
        Opcode::Mulx => Decoded::Mulx {
            reg: field(word, 5, 6) as u8,
        },
        Opcode::Log => Decoded::Log {
            c: fixed::decode(fixed::S1_14, field(word, 16, 16)),
            d: fixed::decode(fixed::S4_6, field(word, 5, 11)),
        },
        Opcode::Exp => Decoded::Exp {
            c: fixed::decode(fixed::S1_14, field(word, 16, 16)),
            d: fixed::decode(fixed::S_10, field(word, 5, 11)),
        },
        Opcode::Sof => Decoded::Sof {
            c: fixed::decode(fixed::S1_14, field(word, 16, 16)),
            d: fixed::decode(fixed::S_10, field(word, 5, 11)),
        },
        Opcode::And => Decoded::And { mask: field(word, 8, 24) },
        Opcode::Or => Decoded::Or { mask: field(word, 8, 24) },
        Opcode::Xor => Decoded::Xor { mask: field(word, 8, 24) },
        Opcode::Skp => Decoded::Skp {
            flags: field(word, 27, 5),
            n: field(word, 21, 6),
        },
        Opcode::Wlds if word & (1 << 30) == 0 => Decoded::Wlds {
            n: field(word, 29, 1) as u8,
            f: field(word, 20, 9) as i32,
            a: field(word, 5, 15),
        },
        Opcode::Wlds => Decoded::Wldr {
            n: field(word, 29, 1) as u8,
            f: sign_extend(field(word, 13, 16), 16),
            a: decode_wldr_amplitude(field(word, 5, 2) as u8),
        },
        Opcode::Jam => Decoded::Jam { n: field(word, 6, 1) as u8 },
        Opcode::Cho => decode_cho(word),
    }
}

fn decode_cho(word: u32) -> Decoded {
    if word & cho_bits::RDAL_MARKER != 0 {
        let n = ((word & cho_bits::N_MASK_RDAL) >> cho_bits::N_SHIFT_RDAL) as u8;
        Decoded::ChoRdal { n }
    } else if word & cho_bits::SOF_MARKER != 0 {
        Decoded::ChoSof {
            n: ((word & cho_bits::N_MASK_NORMAL) >> cho_bits::N_SHIFT_NORMAL) as u8,
            flags: cho_bits::unspread_flags(word),
            d: fixed::decode(fixed::S_15, (word & cho_bits::ADDR_OR_D_MASK) >> cho_bits::ADDR_OR_D_SHIFT),
        }
    } else {
        Decoded::ChoRda {
            n: ((word & cho_bits::N_MASK_NORMAL) >> cho_bits::N_SHIFT_NORMAL) as u8,
            flags: cho_bits::unspread_flags(word),
            addr: (word & cho_bits::ADDR_OR_D_MASK) >> cho_bits::ADDR_OR_D_SHIFT,
        }
    }
}

fn sign_extend(value: u32, bits: u32) -> i32 {
    let shift = 32 - bits;
    ((value << shift) as i32) >> shift
}

/// The 2-bit `WLDR` amplitude code decodes to one of four hardware
/// amplitudes (spec.md §4.6: `3,2,1,0` encode `512,1024,2048,4096`).
pub fn decode_wldr_amplitude(code: u8) -> u32 {
    match code & 0b11 {
        3 => 512,
        2 => 1024,
        1 => 2048,
        _ => 4096,
    }
}

/// Inverse of [`decode_wldr_amplitude`]; `None` if `amplitude` isn't one of
/// the four valid values.
pub fn encode_wldr_amplitude(amplitude: u32) -> Option<u8> {
    match amplitude {
        512 => Some(3),
        1024 => Some(2),
        2048 => Some(1),
        4096 => Some(0),
        _ => None,
    }
}
