//! Embedding surface for the FV-1 chip model: a safe [`Session`] combining
//! assembly and execution, plus a C ABI subset over opaque handles (the
//! pattern `vcpu-interop` uses throughout) for hosts that can't link Rust
//! directly.

mod ffi;
mod result;
mod util;

use fv1::{ProgramImage, Simulator, StepOutcome};
use fv1asm::{assemble, AssemblerOptions, Diagnostic};

pub use result::Fv1Result;

/// Ties an [`fv1asm::AssemblerOptions`] configuration to a running
/// [`fv1::Simulator`]: assemble source, load it, then drive samples or
/// single steps against the result.
pub struct Session {
    simulator: Simulator,
    options: AssemblerOptions,
    diagnostics: Vec<Diagnostic>,
}

impl Session {
    pub fn new() -> Session {
        Session {
            simulator: Simulator::new(ProgramImage::default()),
            options: AssemblerOptions::default(),
            diagnostics: Vec::new(),
        }
    }

    pub fn options(&self) -> &AssemblerOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: AssemblerOptions) {
        self.options = options;
    }

    /// Assembles `source` and, if it produced a program, loads it. Returns
    /// whether the load happened; either way [`Session::diagnostics`] holds
    /// the full problem list from the attempt.
    pub fn assemble_and_load(&mut self, source: &str) -> bool {
        let result = assemble(source, &self.options);
        let loaded = !result.program.is_empty();
        if loaded {
            self.simulator.load(ProgramImage::from_words(&result.program));
        }
        self.diagnostics = result.problems;
        loaded
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn process_sample(&mut self, left_in: f32, right_in: f32, pot0: f32, pot1: f32, pot2: f32) -> (f32, f32) {
        self.simulator.process_sample(left_in, right_in, pot0, pot1, pot2)
    }

    pub fn process_block(
        &mut self,
        left_in: &[f32],
        right_in: &[f32],
        pot0: f32,
        pot1: f32,
        pot2: f32,
    ) -> (Vec<f32>, Vec<f32>) {
        self.simulator.process_block(left_in, right_in, pot0, pot1, pot2)
    }

    pub fn step(&mut self) -> StepOutcome {
        self.simulator.step()
    }

    pub fn run_until_break(&mut self, max_instructions: usize) -> StepOutcome {
        self.simulator.run_until_break(max_instructions)
    }

    pub fn add_breakpoint(&mut self, address: usize) {
        self.simulator.add_breakpoint(address);
    }

    pub fn remove_breakpoint(&mut self, address: usize) {
        self.simulator.remove_breakpoint(address);
    }

    pub fn register(&self, index: u8) -> f64 {
        self.simulator.register(index)
    }

    pub fn set_register(&mut self, index: u8, value: f64) {
        self.simulator.set_register(index, value);
    }

    pub fn acc(&self) -> f64 {
        self.simulator.acc()
    }

    pub fn set_acc(&mut self, value: f64) {
        self.simulator.set_acc(value);
    }

    pub fn pc(&self) -> usize {
        self.simulator.pc()
    }

    pub fn evaluate(&self, expression: &str) -> Result<f64, String> {
        self.simulator.evaluate(expression)
    }
}

impl Default for Session {
    fn default() -> Session {
        Session::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn assemble_and_load_runs_a_passthrough_program() {
        let mut session = Session::new();
        let ok = session.assemble_and_load("rdax ADCL, 1.0\nwrax DACL, 0.0\n");
        assert!(ok, "{:?}", session.diagnostics());
        let (left, _right) = session.process_sample(0.5, 0.0, 0.0, 0.0, 0.0);
        assert!((left - 0.5).abs() < 1e-3);
    }

    #[test]
    fn failed_assembly_keeps_the_previous_program_loaded() {
        let mut session = Session::new();
        assert!(session.assemble_and_load("rdax ADCL, 1.0\nwrax DACL, 0.0\n"));
        let ok = session.assemble_and_load("rdax NOPE, 1.0\n");
        assert!(!ok);
        assert!(!session.diagnostics().is_empty());
        let (left, _right) = session.process_sample(0.25, 0.0, 0.0, 0.0, 0.0);
        assert!((left - 0.25).abs() < 1e-3);
    }
}
