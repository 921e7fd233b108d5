//! Per-instruction semantics (spec.md §4.7). Each function takes the
//! pieces of simulator state it touches directly rather than the whole
//! `Simulator`, so the dispatch table in `simulator.rs` stays a plain match.

use crate::constants::{skip_flags, MAX_ACC, MIN_ACC};
use crate::decode::Decoded;
use crate::delay::DelayLine;
use crate::lfo::LfoBank;
use crate::opcode::cho_flags;
use crate::register::RegisterFile;

pub fn saturate(x: f64) -> f64 {
    x.max(MIN_ACC).min(MAX_ACC)
}

fn acc_to_bits24(acc: f64) -> u32 {
    let raw = (acc * 8_388_608.0).floor() as i64;
    raw.rem_euclid(1 << 24) as u32
}

fn bits24_to_acc(bits: u32) -> f64 {
    let bits = bits & 0x00FF_FFFF;
    let signed = if bits & 0x0080_0000 != 0 {
        (bits as i64) - (1 << 24)
    } else {
        bits as i64
    };
    signed as f64 / 8_388_608.0
}

/// Mutable state an instruction may touch, borrowed apart so the caller can
/// still hold `pc`/`pacc` bookkeeping outside.
pub struct Context<'a> {
    pub acc: &'a mut f64,
    pub pacc: f64,
    pub lr: &'a mut f64,
    pub registers: &'a mut RegisterFile,
    pub delay: &'a mut DelayLine,
    pub lfo: &'a mut LfoBank,
    pub first_run: bool,
}

/// Outcome of executing one instruction: how far to advance `PC` beyond the
/// normal `+1`, and whether this was a `SKP` (which never updates `PACC`).
pub struct Outcome {
    pub extra_pc: u32,
    pub is_skip: bool,
}

fn no_skip() -> Outcome {
    Outcome { extra_pc: 0, is_skip: false }
}

pub fn execute(ctx: &mut Context, instruction: Decoded) -> Outcome {
    match instruction {
        Decoded::Rda { c, addr } => {
            let sample = ctx.delay.read(addr as i64) as f64;
            *ctx.acc = saturate(*ctx.acc + c * sample);
            *ctx.lr = sample;
            no_skip()
        }
        Decoded::Rmpa { c } => {
            let offset = ctx.registers.get(crate::constants::registers::ADDR_PTR) as i64;
            let sample = ctx.delay.read(offset) as f64;
            *ctx.acc = saturate(*ctx.acc + c * sample);
            *ctx.lr = sample;
            no_skip()
        }
        Decoded::Wra { c, addr } => {
            ctx.delay.write(addr as i64, *ctx.acc as f32);
            *ctx.acc = saturate(*ctx.acc * c);
            no_skip()
        }
        Decoded::Wrap { c, addr } => {
            ctx.delay.write(addr as i64, *ctx.acc as f32);
            *ctx.acc = saturate(*ctx.acc * c + *ctx.lr);
            no_skip()
        }
        Decoded::Rdax { c, reg } => {
            *ctx.acc = saturate(*ctx.acc + ctx.registers.get(reg) * c);
            no_skip()
        }
        Decoded::Rdfx { c, reg } => {
            let r = ctx.registers.get(reg);
            *ctx.acc = saturate((*ctx.acc - r) * c + r);
            no_skip()
        }
        Decoded::Wrlx { c, reg } => {
            ctx.registers.set(reg, *ctx.acc);
            *ctx.acc = saturate((ctx.pacc - *ctx.acc) * c + ctx.pacc);
            no_skip()
        }
        Decoded::Wrhx { c, reg } => {
            ctx.registers.set(reg, *ctx.acc);
            *ctx.acc = saturate(ctx.pacc + *ctx.acc * c);
            no_skip()
        }
        Decoded::Wrax { c, reg } => {
            ctx.registers.set(reg, *ctx.acc);
            *ctx.acc = saturate(*ctx.acc * c);
            no_skip()
        }
        Decoded::Maxx { c, reg } => {
            let candidate = (ctx.registers.get(reg) * c).abs();
            *ctx.acc = saturate(ctx.acc.abs().max(candidate));
            no_skip()
        }
        Decoded::Mulx { reg } => {
            *ctx.acc = saturate(*ctx.acc * ctx.registers.get(reg));
            no_skip()
        }
        Decoded::Log { c, d } => {
            let magnitude = ctx.acc.abs().max(2f64.powi(-16));
            *ctx.acc = saturate((magnitude.log2() * c + d) / 16.0);
            no_skip()
        }
        Decoded::Exp { c, d } => {
            *ctx.acc = saturate(2f64.powf(*ctx.acc * 16.0) * c + d);
            no_skip()
        }
        Decoded::Sof { c, d } => {
            *ctx.acc = saturate(*ctx.acc * c + d);
            no_skip()
        }
        Decoded::And { mask } => {
            *ctx.acc = bits24_to_acc(acc_to_bits24(*ctx.acc) & mask);
            no_skip()
        }
        Decoded::Or { mask } => {
            *ctx.acc = bits24_to_acc(acc_to_bits24(*ctx.acc) | mask);
            no_skip()
        }
        Decoded::Xor { mask } => {
            *ctx.acc = bits24_to_acc(acc_to_bits24(*ctx.acc) ^ mask);
            no_skip()
        }
        Decoded::Skp { flags, n } => {
            let taken = skip_condition(flags, *ctx.acc, ctx.pacc, ctx.first_run);
            Outcome {
                extra_pc: if taken { n } else { 0 },
                is_skip: true,
            }
        }
        Decoded::Wlds { n, f, a } => {
            ctx.lfo.wlds(n, f, a);
            no_skip()
        }
        Decoded::Wldr { n, f, a } => {
            ctx.lfo.wldr(n, f, a);
            no_skip()
        }
        Decoded::Jam { n } => {
            ctx.lfo.jam(n);
            no_skip()
        }
        Decoded::ChoRda { n, flags, addr } => {
            let v = cho_value(ctx.lfo, n, flags);
            let range = ctx.lfo.range(n).unwrap_or(0.0);
            let position = range * v;
            let int_offset = position.floor();
            let frac = position - int_offset;
            let base = addr as i64 + int_offset as i64;
            let s1 = ctx.delay.read(base) as f64;
            let s2 = ctx.delay.read(base + 1) as f64;
            *ctx.acc = saturate(*ctx.acc + s1 * (1.0 - frac) + s2 * frac);
            *ctx.lr = s1;
            no_skip()
        }
        Decoded::ChoSof { n, flags, d } => {
            let v = cho_value(ctx.lfo, n, flags);
            *ctx.acc = saturate(v * *ctx.acc + d);
            no_skip()
        }
        Decoded::ChoRdal { n } => {
            *ctx.acc = saturate(ctx.lfo.value(n).unwrap_or(0.0));
            no_skip()
        }
        Decoded::Invalid => no_skip(),
    }
}

fn skip_condition(flags: u32, acc: f64, pacc: f64, first_run: bool) -> bool {
    (flags & skip_flags::RUN != 0 && !first_run)
        || (flags & skip_flags::ZRC != 0 && zero_crossed(acc, pacc))
        || (flags & skip_flags::ZRO != 0 && acc == 0.0)
        || (flags & skip_flags::GEZ != 0 && acc >= 0.0)
        || (flags & skip_flags::NEG != 0 && acc < 0.0)
}

fn zero_crossed(acc: f64, pacc: f64) -> bool {
    acc != 0.0 && pacc != 0.0 && acc.is_sign_negative() != pacc.is_sign_negative()
}

/// Applies a `CHO`'s flag pipeline to the selected LFO's instantaneous (or
/// latched) value. Order is `RPTR2`, `COMPA`, `COMPC`, `NA` — spec.md leaves
/// the combination order open; see DESIGN.md.
fn cho_value(lfo: &mut LfoBank, selector: u8, flags: u8) -> f64 {
    let raw = if flags & cho_flags::REG != 0 {
        lfo.reg_latch(selector)
    } else {
        let v = lfo.value(selector).unwrap_or(0.0);
        lfo.set_reg_latch(selector, v);
        v
    };

    let mut v = raw;
    if flags & cho_flags::RPTR2 != 0 {
        v += 0.5;
        if v >= 1.0 {
            v -= 2.0;
        }
    }
    if flags & cho_flags::COMPA != 0 {
        v = -v;
    }
    if flags & cho_flags::COMPC != 0 {
        v = 1.0 - v;
    }
    if flags & cho_flags::NA != 0 {
        v = (4.0 * v.min(1.0 - v) - 0.5).max(0.0).min(1.0);
    }
    v
}

#[cfg(test)]
mod test {
    use super::*;

    fn fresh() -> (f64, f64, RegisterFile, DelayLine, LfoBank) {
        (0.0, 0.0, RegisterFile::new(), DelayLine::with_capacity(8), LfoBank::new())
    }

    #[test]
    fn sof_saturates_upward() {
        let (mut acc, mut lr, mut regs, mut delay, mut lfo) = fresh();
        acc = 0.8;
        let mut ctx = Context {
            acc: &mut acc,
            pacc: 0.0,
            lr: &mut lr,
            registers: &mut regs,
            delay: &mut delay,
            lfo: &mut lfo,
            first_run: false,
        };
        execute(&mut ctx, Decoded::Sof { c: 2.0, d: 0.0 });
        assert_eq!(acc, MAX_ACC);
    }

    #[test]
    fn and_with_zero_mask_clears_accumulator() {
        let (mut acc, mut lr, mut regs, mut delay, mut lfo) = fresh();
        acc = 0.5;
        let mut ctx = Context {
            acc: &mut acc,
            pacc: 0.0,
            lr: &mut lr,
            registers: &mut regs,
            delay: &mut delay,
            lfo: &mut lfo,
            first_run: false,
        };
        execute(&mut ctx, Decoded::And { mask: 0 });
        assert_eq!(acc, 0.0);
    }

    #[test]
    fn cho_rda_accumulates_rather_than_replaces() {
        let (mut acc, mut lr, mut regs, mut delay, mut lfo) = fresh();
        acc = 0.25;
        delay.write(0, 0.5);
        let mut ctx = Context {
            acc: &mut acc,
            pacc: 0.0,
            lr: &mut lr,
            registers: &mut regs,
            delay: &mut delay,
            lfo: &mut lfo,
            first_run: false,
        };
        // SIN0's default modulation range is zero, so this reads delay[0]
        // verbatim and should land on top of the pre-existing accumulator,
        // the same way two CHO RDA taps sum for a chorus/flanger effect.
        execute(&mut ctx, Decoded::ChoRda { n: crate::constants::lfo_index::SIN0, flags: 0, addr: 0 });
        assert!((acc - 0.75).abs() < 1e-9, "expected 0.25 + 0.5, got {}", acc);
    }

    #[test]
    fn skp_zro_skips_when_accumulator_is_zero() {
        let outcome_taken = {
            let (mut acc, mut lr, mut regs, mut delay, mut lfo) = fresh();
            let mut ctx = Context {
                acc: &mut acc,
                pacc: 0.0,
                lr: &mut lr,
                registers: &mut regs,
                delay: &mut delay,
                lfo: &mut lfo,
                first_run: false,
            };
            execute(&mut ctx, Decoded::Skp { flags: skip_flags::ZRO, n: 3 })
        };
        assert_eq!(outcome_taken.extra_pc, 3);
        assert!(outcome_taken.is_skip);
    }
}
