//! The chip's six LFO scalars (two sine, two ramp) plus the hidden `CHO REG`
//! latch. Deliberately not abstracted into an "LFO object" hierarchy
//! (spec.md §9 Design Notes): one bank, six named fields each.

use crate::constants::lfo_index;

#[derive(Clone, Debug)]
pub struct LfoBank {
    sin0: f64,
    cos0: f64,
    sin1: f64,
    cos1: f64,
    rmp0: f64,
    rmp1: f64,

    sin0_rate: f64,
    sin0_range: f64,
    sin1_rate: f64,
    sin1_range: f64,
    rmp0_rate: f64,
    rmp0_range: f64,
    rmp1_rate: f64,
    rmp1_range: f64,

    /// Hidden per-LFO latch written by `CHO ..., REG, ...` and read back by
    /// a later `CHO` referencing the same LFO with the `REG` flag set.
    reg_latch: [f64; 6],
}

impl LfoBank {
    pub fn new() -> LfoBank {
        LfoBank {
            sin0: 0.0,
            cos0: 1.0,
            sin1: 0.0,
            cos1: 1.0,
            rmp0: 0.0,
            rmp1: 0.0,
            sin0_rate: 0.0,
            sin0_range: 0.0,
            sin1_rate: 0.0,
            sin1_range: 0.0,
            rmp0_rate: 0.0,
            rmp0_range: 0.0,
            rmp1_rate: 0.0,
            rmp1_range: 0.0,
            reg_latch: [0.0; 6],
        }
    }

    /// Advances all four oscillators by one sample (spec.md §4.8), called
    /// once per sample after the program has run.
    pub fn advance(&mut self) {
        let k0 = self.sin0_rate / 256.0;
        self.cos0 += k0 * self.sin0;
        self.sin0 -= k0 * self.cos0;

        let k1 = self.sin1_rate / 256.0;
        self.cos1 += k1 * self.sin1;
        self.sin1 -= k1 * self.cos1;

        self.rmp0 = wrap_ramp(self.rmp0 - self.rmp0_rate / 4096.0);
        self.rmp1 = wrap_ramp(self.rmp1 - self.rmp1_rate / 4096.0);
    }

    /// `WLDS N,F,A` — installs a sine LFO's rate and range. `n` is the
    /// collapsed 1-bit selector (0 = SIN0, 1 = SIN1).
    pub fn wlds(&mut self, n: u8, f: i32, a: u32) {
        let rate = f as f64 / 511.0;
        let range = a as f64 / 32767.0;
        if n & 1 == 0 {
            self.sin0_rate = rate;
            self.sin0_range = range;
        } else {
            self.sin1_rate = rate;
            self.sin1_range = range;
        }
    }

    /// `WLDR N,F,A` — installs a ramp LFO's rate and range. `a` is the
    /// already-decoded amplitude (512/1024/2048/4096), not the 2-bit code.
    pub fn wldr(&mut self, n: u8, f: i32, a: u32) {
        let rate = f as f64 / 16384.0;
        let range = a as f64 / 8192.0;
        if n & 1 == 0 {
            self.rmp0_rate = rate;
            self.rmp0_range = range;
        } else {
            self.rmp1_rate = rate;
            self.rmp1_range = range;
        }
    }

    /// `JAM N` — resets the selected ramp LFO's phase to zero.
    pub fn jam(&mut self, n: u8) {
        if n & 1 == 0 {
            self.rmp0 = 0.0;
        } else {
            self.rmp1 = 0.0;
        }
    }

    /// The LFO's instantaneous value for the given raw `CHO` selector
    /// (0=SIN0, 1=SIN1, 2=RMP0, 3=RMP1, 8=COS0, 9=COS1).
    pub fn value(&self, selector: u8) -> Option<f64> {
        match selector {
            lfo_index::SIN0 => Some(self.sin0),
            lfo_index::SIN1 => Some(self.sin1),
            lfo_index::RMP0 => Some(self.rmp0),
            lfo_index::RMP1 => Some(self.rmp1),
            lfo_index::COS0 => Some(self.cos0),
            lfo_index::COS1 => Some(self.cos1),
            _ => None,
        }
    }

    /// The configured modulation range for the given selector, used by
    /// `CHO RDA`'s address computation.
    pub fn range(&self, selector: u8) -> Option<f64> {
        match selector {
            lfo_index::SIN0 | lfo_index::COS0 => Some(self.sin0_range),
            lfo_index::SIN1 | lfo_index::COS1 => Some(self.sin1_range),
            lfo_index::RMP0 => Some(self.rmp0_range),
            lfo_index::RMP1 => Some(self.rmp1_range),
            _ => None,
        }
    }

    pub fn reg_latch(&self, selector: u8) -> f64 {
        lfo_index::slot(selector).map(|i| self.reg_latch[i]).unwrap_or(0.0)
    }

    pub fn set_reg_latch(&mut self, selector: u8, value: f64) {
        if let Some(i) = lfo_index::slot(selector) {
            self.reg_latch[i] = value;
        }
    }
}

impl Default for LfoBank {
    fn default() -> LfoBank {
        LfoBank::new()
    }
}

fn wrap_ramp(mut v: f64) -> f64 {
    while v < -1.0 {
        v += 2.0;
    }
    while v >= 1.0 {
        v -= 2.0;
    }
    v
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sine_starts_at_zero_cosine_at_one() {
        let lfo = LfoBank::new();
        assert_eq!(lfo.value(lfo_index::SIN0), Some(0.0));
        assert_eq!(lfo.value(lfo_index::COS0), Some(1.0));
    }

    #[test]
    fn ramp_wraps_into_range() {
        let mut lfo = LfoBank::new();
        lfo.wldr(0, 16384, 8192);
        for _ in 0..10 {
            lfo.advance();
            let v = lfo.value(lfo_index::RMP0).unwrap();
            assert!((-1.0..1.0).contains(&v));
        }
    }

    #[test]
    fn jam_resets_ramp_phase() {
        let mut lfo = LfoBank::new();
        lfo.wldr(0, 1000, 4096);
        for _ in 0..5 {
            lfo.advance();
        }
        lfo.jam(0);
        assert_eq!(lfo.value(lfo_index::RMP0), Some(0.0));
    }
}
