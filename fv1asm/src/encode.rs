//! Pass-3 instruction encoding (spec.md §4.6): maps a mnemonic and its
//! already-evaluated operand values to a 32-bit word. Label-relative `SKP`
//! targets are resolved to a plain offset by the caller before reaching
//! here; this module only knows about bit layout.

use fv1::decode::encode_wldr_amplitude;
use fv1::fixed::{self, EncodeError, Format, S1_14, S1_9, S4_6, S_10};
use fv1::opcode::{cho_bits, Opcode};

#[derive(Clone, Debug, PartialEq)]
pub enum EncodeIssue {
    WrongOperandCount { expected: usize, found: usize },
    UnknownMnemonic(String),
    OutOfRange(EncodeError),
    InvalidChoMode(f64),
    InvalidChoSelector(f64),
    InvalidWldrFrequency(f64),
    InvalidWldrAmplitude(f64),
}

impl std::fmt::Display for EncodeIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodeIssue::WrongOperandCount { expected, found } => {
                write!(f, "expected {} operand(s), found {}", expected, found)
            }
            EncodeIssue::UnknownMnemonic(m) => write!(f, "unknown mnemonic '{}'", m),
            EncodeIssue::OutOfRange(e) => write!(f, "{:?}", e),
            EncodeIssue::InvalidChoMode(v) => write!(f, "invalid CHO mode selector {}", v),
            EncodeIssue::InvalidChoSelector(v) => write!(f, "invalid CHO LFO selector {}", v),
            EncodeIssue::InvalidWldrFrequency(v) => write!(f, "WLDR frequency {} below -16384", v),
            EncodeIssue::InvalidWldrAmplitude(v) => write!(f, "invalid WLDR amplitude {}", v),
        }
    }
}

impl From<EncodeError> for EncodeIssue {
    fn from(e: EncodeError) -> EncodeIssue {
        EncodeIssue::OutOfRange(e)
    }
}

fn expect(operands: &[f64], n: usize) -> Result<(), EncodeIssue> {
    if operands.len() != n {
        Err(EncodeIssue::WrongOperandCount { expected: n, found: operands.len() })
    } else {
        Ok(())
    }
}

fn field(format: Format, value: f64, clamp: bool) -> Result<u32, EncodeIssue> {
    Ok(fixed::encode(format, value, clamp)?)
}

fn reg_field(value: f64) -> u32 {
    (value as i64 as u32) & 0x3F
}

/// Encodes every mnemonic except `SKP`/`JMP` (see [`encode_skp`], which
/// needs the relative offset already computed by the caller) and `CHO`
/// (see [`encode_cho`], whose shape depends on its mode operand).
pub fn encode(mnemonic: &str, operands: &[f64], clamp: bool) -> Result<u32, EncodeIssue> {
    match mnemonic {
        "RDA" | "WRA" | "WRAP" => {
            expect(operands, 2)?;
            let c = field(S1_9, operands[0], clamp)?;
            let addr = (operands[1] as i64 as u32) & 0xFFFF;
            let opcode = match mnemonic {
                "RDA" => Opcode::Rda,
                "WRA" => Opcode::Wra,
                _ => Opcode::Wrap,
            };
            Ok(opcode.value() | (c << 21) | (addr << 5))
        }
        "RMPA" => {
            expect(operands, 1)?;
            let c = field(S1_9, operands[0], clamp)?;
            Ok(Opcode::Rmpa.value() | (c << 21))
        }
        "RDAX" | "RDFX" | "WRLX" | "WRHX" | "WRAX" | "MAXX" => {
            expect(operands, 2)?;
            let reg = reg_field(operands[0]);
            let c = field(S1_14, operands[1], clamp)?;
            let opcode = match mnemonic {
                "RDAX" => Opcode::Rdax,
                "RDFX" => Opcode::Rdfx,
                "WRLX" => Opcode::Wrlx,
                "WRHX" => Opcode::Wrhx,
                "WRAX" => Opcode::Wrax,
                _ => Opcode::Maxx,
            };
            Ok(opcode.value() | (c << 16) | (reg << 5))
        }
        "LDAX" => {
            expect(operands, 1)?;
            let reg = reg_field(operands[0]);
            let c = field(S1_14, 0.0, clamp)?;
            Ok(Opcode::Rdfx.value() | (c << 16) | (reg << 5))
        }
        "MULX" => {
            expect(operands, 1)?;
            Ok(Opcode::Mulx.value() | (reg_field(operands[0]) << 5))
        }
        "LOG" => {
            expect(operands, 2)?;
            let c = field(S1_14, operands[0], clamp)?;
            let d = field(S4_6, operands[1], clamp)?;
            Ok(Opcode::Log.value() | (c << 16) | (d << 5))
        }
        "EXP" | "SOF" => {
            expect(operands, 2)?;
            let c = field(S1_14, operands[0], clamp)?;
            let d = field(S_10, operands[1], clamp)?;
            let opcode = if mnemonic == "EXP" { Opcode::Exp } else { Opcode::Sof };
            Ok(opcode.value() | (c << 16) | (d << 5))
        }
        "AND" | "OR" | "XOR" => {
            expect(operands, 1)?;
            let mask = (operands[0] as i64 as u32) & 0x00FF_FFFF;
            let opcode = match mnemonic {
                "AND" => Opcode::And,
                "OR" => Opcode::Or,
                _ => Opcode::Xor,
            };
            Ok(opcode.value() | (mask << 8))
        }
        "CLR" => {
            expect(operands, 0)?;
            Ok(Opcode::And.value())
        }
        "NOT" => {
            expect(operands, 0)?;
            Ok(Opcode::Xor.value() | (0x00FF_FFFF << 8))
        }
        "ABSA" => {
            expect(operands, 0)?;
            Ok(Opcode::Maxx.value())
        }
        "NOP" => {
            expect(operands, 0)?;
            Ok(fv1::constants::NOP_WORD)
        }
        "WLDS" => {
            expect(operands, 3)?;
            let n = (operands[0] as i64 as u32) & 0x1;
            let f = (operands[1] as i64 as u32) & 0x1FF;
            let a = (operands[2] as i64 as u32) & 0x7FFF;
            Ok(Opcode::Wlds.value() | (n << 29) | (f << 20) | (a << 5))
        }
        "WLDR" => {
            expect(operands, 3)?;
            let n = (operands[0] as i64 as u32) & 0x1;
            let f = operands[1];
            if f < -16384.0 || f > 32767.0 {
                return Err(EncodeIssue::InvalidWldrFrequency(f));
            }
            let f_bits = (f as i64 as u32) & 0xFFFF;
            let amplitude = operands[2] as i64 as u32;
            let a_code = encode_wldr_amplitude(amplitude).ok_or(EncodeIssue::InvalidWldrAmplitude(operands[2]))?;
            Ok(Opcode::Wlds.value() | (1 << 30) | (n << 29) | (f_bits << 13) | ((a_code as u32) << 5))
        }
        "JAM" => {
            expect(operands, 1)?;
            let n = (operands[0] as i64 as u32) & 0x1;
            Ok(Opcode::Jam.value() | (n << 6))
        }
        other => Err(EncodeIssue::UnknownMnemonic(other.to_string())),
    }
}

/// `SKP flags, n` / `JMP n` (an alias with `flags = 0`). `n` is the
/// already-computed relative skip distance, not a label index.
pub fn encode_skp(flags: u32, n: u32) -> u32 {
    Opcode::Skp.value() | (flags & 0xF800_0000) | ((n & 0x3F) << 21)
}

/// `CHO <mode>, ...`, dispatching on the mode operand's resolved value
/// (`RDA=0, SOF=2, RDAL=3`, matching the predefined symbol table).
pub fn encode_cho(operands: &[f64], clamp: bool) -> Result<u32, EncodeIssue> {
    if operands.is_empty() {
        return Err(EncodeIssue::WrongOperandCount { expected: 3, found: 0 });
    }
    let mode = operands[0];
    let rest = &operands[1..];

    if mode == 0.0 {
        expect(rest, 3)?;
        let n = (rest[0] as i64 as u32) & 0b11;
        let flags = (rest[1] as i64 as u32) & 0x1F;
        let addr = (rest[2] as i64 as u32) & 0xFFFF;
        Ok(Opcode::Cho.value()
            | (n << cho_bits::N_SHIFT_NORMAL)
            | cho_bits::spread_flags(flags as u8)
            | (addr << cho_bits::ADDR_OR_D_SHIFT))
    } else if mode == 2.0 {
        expect(rest, 3)?;
        let n = (rest[0] as i64 as u32) & 0b11;
        let flags = (rest[1] as i64 as u32) & 0x1F;
        let d = field(fv1::fixed::S_15, rest[2], clamp)?;
        Ok(Opcode::Cho.value()
            | cho_bits::SOF_MARKER
            | (n << cho_bits::N_SHIFT_NORMAL)
            | cho_bits::spread_flags(flags as u8)
            | (d << cho_bits::ADDR_OR_D_SHIFT))
    } else if mode == 3.0 {
        expect(rest, 1)?;
        let n = rest[0] as i64;
        if !matches!(n, 0 | 1 | 2 | 3 | 8 | 9) {
            return Err(EncodeIssue::InvalidChoSelector(rest[0]));
        }
        Ok(Opcode::Cho.value() | cho_bits::RDAL_MARKER | ((n as u32) << cho_bits::N_SHIFT_RDAL))
    } else {
        Err(EncodeIssue::InvalidChoMode(mode))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rdax_packs_register_and_coefficient() {
        let word = encode("RDAX", &[0x14_i64 as f64, 1.0], false).unwrap();
        assert_eq!(word & 0x1F, Opcode::Rdax.value());
        assert_eq!((word >> 5) & 0x3F, 0x14);
    }

    #[test]
    fn clr_is_and_opcode_alone() {
        assert_eq!(encode("CLR", &[], false).unwrap(), Opcode::And.value());
    }

    #[test]
    fn not_is_xor_with_full_mask() {
        let word = encode("NOT", &[], false).unwrap();
        assert_eq!(word, Opcode::Xor.value() | (0x00FF_FFFF << 8));
    }

    #[test]
    fn cho_rdal_rejects_non_member_selector() {
        assert!(encode_cho(&[3.0, 5.0], false).is_err());
        assert!(encode_cho(&[3.0, 8.0], false).is_ok());
    }

    #[test]
    fn wldr_rejects_frequency_below_floor() {
        assert!(encode("WLDR", &[0.0, -20000.0, 4096.0], false).is_err());
    }
}
