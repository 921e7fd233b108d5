//! The cycle-accurate, sample-by-sample interpreter (spec.md §4.7) plus the
//! debug surface (§4.9): breakpoints, state pokes, and a small expression
//! evaluator for inspecting live state.

use std::collections::BTreeSet;

use crate::constants::{registers, PROGRAM_CAPACITY};
use crate::decode::decode;
use crate::delay::DelayLine;
use crate::execute::{self, Context};
use crate::lfo::LfoBank;
use crate::program::ProgramImage;
use crate::register::RegisterFile;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Continued,
    Breakpoint(usize),
}

/// Quantizes a potentiometer input to 10 bits (spec.md §4.7's "Begin" step).
fn quantize_pot(v: f32) -> f64 {
    let clamped = (v as f64).max(0.0).min(1.0 - 1.0 / 1024.0);
    (clamped * 1024.0).floor() / 1024.0
}

pub struct Simulator {
    program: ProgramImage,
    pc: usize,
    acc: f64,
    pacc: f64,
    lr: f64,
    registers: RegisterFile,
    delay: DelayLine,
    lfo: LfoBank,
    first_run: bool,
    breakpoints: BTreeSet<usize>,
}

impl Simulator {
    pub fn new(program: ProgramImage) -> Simulator {
        Simulator {
            program,
            pc: 0,
            acc: 0.0,
            pacc: 0.0,
            lr: 0.0,
            registers: RegisterFile::new(),
            delay: DelayLine::new(),
            lfo: LfoBank::new(),
            first_run: true,
            breakpoints: BTreeSet::new(),
        }
    }

    /// Replaces the running program and resets accumulator/PC/first-run
    /// state, as if the chip had just been loaded. Register file, delay RAM
    /// and LFO phase survive, matching real hardware (only a power cycle
    /// clears those).
    pub fn load(&mut self, program: ProgramImage) {
        self.program = program;
        self.pc = 0;
        self.acc = 0.0;
        self.pacc = 0.0;
        self.lr = 0.0;
        self.first_run = true;
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn acc(&self) -> f64 {
        self.acc
    }

    pub fn pacc(&self) -> f64 {
        self.pacc
    }

    pub fn register(&self, index: u8) -> f64 {
        self.registers.get(index)
    }

    pub fn set_register(&mut self, index: u8, value: f64) {
        self.registers.set(index, value);
    }

    pub fn set_acc(&mut self, value: f64) {
        self.acc = execute::saturate(value);
    }

    pub fn delay_sample(&self, offset: i64) -> f32 {
        self.delay.read(offset)
    }

    pub fn add_breakpoint(&mut self, address: usize) {
        self.breakpoints.insert(address % PROGRAM_CAPACITY);
    }

    pub fn remove_breakpoint(&mut self, address: usize) {
        self.breakpoints.remove(&(address % PROGRAM_CAPACITY));
    }

    pub fn breakpoints(&self) -> impl Iterator<Item = &usize> {
        self.breakpoints.iter()
    }

    /// Executes exactly one instruction, crossing a sample boundary (and
    /// running LFO/delay-pointer housekeeping) when `PC` wraps past the end
    /// of the program. Returns [`StepOutcome::Breakpoint`] if the
    /// instruction about to execute next sits on a breakpoint.
    pub fn step(&mut self) -> StepOutcome {
        self.execute_one();
        if self.breakpoints.contains(&self.pc) {
            StepOutcome::Breakpoint(self.pc)
        } else {
            StepOutcome::Continued
        }
    }

    /// Steps instruction-by-instruction until a breakpoint is hit or
    /// `max_instructions` have executed.
    pub fn run_until_break(&mut self, max_instructions: usize) -> StepOutcome {
        for _ in 0..max_instructions {
            if let hit @ StepOutcome::Breakpoint(_) = self.step() {
                return hit;
            }
        }
        StepOutcome::Continued
    }

    fn execute_one(&mut self) {
        let word = self.program.word(self.pc);
        let decoded = decode(word);
        let pre = self.acc;
        let mut ctx = Context {
            acc: &mut self.acc,
            pacc: self.pacc,
            lr: &mut self.lr,
            registers: &mut self.registers,
            delay: &mut self.delay,
            lfo: &mut self.lfo,
            first_run: self.first_run,
        };
        let outcome = execute::execute(&mut ctx, decoded);
        if !outcome.is_skip {
            self.pacc = pre;
        }
        self.pc += 1 + outcome.extra_pc as usize;
        if self.pc >= PROGRAM_CAPACITY {
            self.end_sample();
        }
    }

    fn end_sample(&mut self) {
        self.lfo.advance();
        self.delay.advance();
        self.first_run = false;
        self.pc = 0;
    }

    /// Runs one complete sample (every instruction from `PC=0` through the
    /// end of the program), ignoring breakpoints. This is the chip's normal
    /// operating mode.
    ///
    /// `pot0`/`pot1`/`pot2` are the three potentiometer inputs, quantized to
    /// 10 bits before being latched into `POT0`/`POT1`/`POT2`.
    pub fn process_sample(&mut self, left_in: f32, right_in: f32, pot0: f32, pot1: f32, pot2: f32) -> (f32, f32) {
        self.acc = 0.0;
        self.pacc = 0.0;
        self.lr = 0.0;
        self.registers.set(registers::ADCL, execute::saturate(left_in as f64));
        self.registers.set(registers::ADCR, execute::saturate(right_in as f64));
        self.registers.set(registers::POT0, quantize_pot(pot0));
        self.registers.set(registers::POT1, quantize_pot(pot1));
        self.registers.set(registers::POT2, quantize_pot(pot2));
        self.pc = 0;
        while self.pc < PROGRAM_CAPACITY {
            self.execute_one();
        }
        (
            self.registers.get(registers::DACL) as f32,
            self.registers.get(registers::DACR) as f32,
        )
    }

    pub fn process_block(
        &mut self,
        left_in: &[f32],
        right_in: &[f32],
        pot0: f32,
        pot1: f32,
        pot2: f32,
    ) -> (Vec<f32>, Vec<f32>) {
        let n = left_in.len().min(right_in.len());
        let mut left_out = Vec::with_capacity(n);
        let mut right_out = Vec::with_capacity(n);
        for i in 0..n {
            let (l, r) = self.process_sample(left_in[i], right_in[i], pot0, pot1, pot2);
            left_out.push(l);
            right_out.push(r);
        }
        (left_out, right_out)
    }

    /// Evaluates a small debug expression (`ACC`, `PACC`, `PC`, `LR`, a
    /// register name or `REG<n>`, numeric literals, `+ - * /` and parens)
    /// against the simulator's current state.
    pub fn evaluate(&self, expression: &str) -> Result<f64, String> {
        eval::evaluate(expression, self)
    }
}

mod eval {
    use super::Simulator;
    use crate::constants::registers;

    pub fn evaluate(source: &str, sim: &Simulator) -> Result<f64, String> {
        let tokens = tokenize(source)?;
        let mut parser = Parser { tokens, pos: 0, sim };
        let value = parser.parse_expr()?;
        if parser.pos != parser.tokens.len() {
            return Err(format!("unexpected trailing input at token {}", parser.pos));
        }
        Ok(value)
    }

    #[derive(Clone, Debug, PartialEq)]
    enum Token {
        Number(f64),
        Ident(String),
        Plus,
        Minus,
        Star,
        Slash,
        LParen,
        RParen,
    }

    fn tokenize(source: &str) -> Result<Vec<Token>, String> {
        let chars: Vec<char> = source.chars().collect();
        let mut tokens = Vec::new();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            if c.is_whitespace() {
                i += 1;
            } else if c == '+' {
                tokens.push(Token::Plus);
                i += 1;
            } else if c == '-' {
                tokens.push(Token::Minus);
                i += 1;
            } else if c == '*' {
                tokens.push(Token::Star);
                i += 1;
            } else if c == '/' {
                tokens.push(Token::Slash);
                i += 1;
            } else if c == '(' {
                tokens.push(Token::LParen);
                i += 1;
            } else if c == ')' {
                tokens.push(Token::RParen);
                i += 1;
            } else if c.is_ascii_digit() || c == '.' {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let value = text
                    .parse::<f64>()
                    .map_err(|_| format!("bad numeric literal '{}'", text))?;
                tokens.push(Token::Number(value));
            } else if c.is_ascii_alphabetic() || c == '_' {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                tokens.push(Token::Ident(text));
            } else {
                return Err(format!("unexpected character '{}'", c));
            }
        }
        Ok(tokens)
    }

    struct Parser<'a> {
        tokens: Vec<Token>,
        pos: usize,
        sim: &'a Simulator,
    }

    impl<'a> Parser<'a> {
        fn peek(&self) -> Option<&Token> {
            self.tokens.get(self.pos)
        }

        fn bump(&mut self) -> Option<Token> {
            let t = self.tokens.get(self.pos).cloned();
            self.pos += 1;
            t
        }

        fn parse_expr(&mut self) -> Result<f64, String> {
            let mut value = self.parse_term()?;
            loop {
                match self.peek() {
                    Some(Token::Plus) => {
                        self.bump();
                        value += self.parse_term()?;
                    }
                    Some(Token::Minus) => {
                        self.bump();
                        value -= self.parse_term()?;
                    }
                    _ => break,
                }
            }
            Ok(value)
        }

        fn parse_term(&mut self) -> Result<f64, String> {
            let mut value = self.parse_unary()?;
            loop {
                match self.peek() {
                    Some(Token::Star) => {
                        self.bump();
                        value *= self.parse_unary()?;
                    }
                    Some(Token::Slash) => {
                        self.bump();
                        let divisor = self.parse_unary()?;
                        value /= divisor;
                    }
                    _ => break,
                }
            }
            Ok(value)
        }

        fn parse_unary(&mut self) -> Result<f64, String> {
            if let Some(Token::Minus) = self.peek() {
                self.bump();
                return Ok(-self.parse_unary()?);
            }
            self.parse_atom()
        }

        fn parse_atom(&mut self) -> Result<f64, String> {
            match self.bump() {
                Some(Token::Number(n)) => Ok(n),
                Some(Token::Ident(name)) => self.resolve(&name),
                Some(Token::LParen) => {
                    let value = self.parse_expr()?;
                    match self.bump() {
                        Some(Token::RParen) => Ok(value),
                        _ => Err("expected ')'".to_string()),
                    }
                }
                other => Err(format!("unexpected token {:?}", other)),
            }
        }

        fn resolve(&self, name: &str) -> Result<f64, String> {
            match name.to_ascii_uppercase().as_str() {
                "ACC" => return Ok(self.sim.acc),
                "PACC" => return Ok(self.sim.pacc),
                "PC" => return Ok(self.sim.pc as f64),
                "LR" => return Ok(self.sim.lr),
                _ => {}
            }
            let upper = name.to_ascii_uppercase();
            if let Some(rest) = upper.strip_prefix("REG") {
                if let Ok(n) = rest.parse::<u8>() {
                    return Ok(self.sim.register(registers::REG0 + n));
                }
            }
            for (predefined_name, index) in registers::predefined() {
                if *predefined_name == upper {
                    return Ok(self.sim.register(*index));
                }
            }
            Err(format!("unknown identifier '{}'", name))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::constants::NOP_WORD;

    #[test]
    fn pad_only_program_passes_input_through_unchanged() {
        let mut sim = Simulator::new(ProgramImage::from_words(&[NOP_WORD]));
        let (l, r) = sim.process_sample(0.25, -0.5, 0.0, 0.0, 0.0);
        assert_eq!((l, r), (0.0, 0.0));
    }

    #[test]
    fn simple_passthrough_copies_adc_to_dac() {
        // RDAX ADCL, 1.0 ; WRAX DACL, 0.0 ; RDAX ADCR, 1.0 ; WRAX DACR, 0.0
        let rdax = |reg: u8| -> u32 {
            let c = crate::fixed::encode(crate::fixed::S1_14, 1.0, false).unwrap();
            0b00100 | ((reg as u32) << 5) | (c << 16)
        };
        let wrax = |reg: u8| -> u32 {
            let c = crate::fixed::encode(crate::fixed::S1_14, 0.0, false).unwrap();
            0b00110 | ((reg as u32) << 5) | (c << 16)
        };
        use crate::constants::registers::{ADCL, ADCR, DACL, DACR};
        let words = [rdax(ADCL), wrax(DACL), rdax(ADCR), wrax(DACR)];
        let mut sim = Simulator::new(ProgramImage::from_words(&words));
        let (l, r) = sim.process_sample(0.5, -0.25, 0.0, 0.0, 0.0);
        assert!((l - 0.5).abs() < 1e-6);
        assert!((r - (-0.25)).abs() < 1e-6);
    }

    #[test]
    fn pot_inputs_are_quantized_to_ten_bits() {
        let words = {
            let rdax = |reg: u8| -> u32 {
                let c = crate::fixed::encode(crate::fixed::S1_14, 1.0, false).unwrap();
                0b00100 | ((reg as u32) << 5) | (c << 16)
            };
            let wrax = |reg: u8| -> u32 {
                let c = crate::fixed::encode(crate::fixed::S1_14, 0.0, false).unwrap();
                0b00110 | ((reg as u32) << 5) | (c << 16)
            };
            use crate::constants::registers::{DACL, POT0};
            [rdax(POT0), wrax(DACL)]
        };
        let mut sim = Simulator::new(ProgramImage::from_words(&words));
        let (l, _r) = sim.process_sample(0.0, 0.0, 0.5004, 0.0, 0.0);
        assert!((l - 0.5).abs() < 1e-6, "expected 0.5004 to quantize down to 0.5, got {}", l);
    }

    #[test]
    fn breakpoint_halts_stepping_at_target_address() {
        let mut sim = Simulator::new(ProgramImage::from_words(&[NOP_WORD, NOP_WORD, NOP_WORD]));
        sim.add_breakpoint(2);
        let outcome = sim.run_until_break(10);
        assert_eq!(outcome, StepOutcome::Breakpoint(2));
        assert_eq!(sim.pc(), 2);
    }

    #[test]
    fn evaluate_reads_live_accumulator() {
        let mut sim = Simulator::new(ProgramImage::default());
        sim.set_acc(0.5);
        assert!((sim.evaluate("ACC * 2").unwrap() - 1.0).abs() < 1e-9);
    }
}
