//! Chip model for the Spin Semiconductor FV-1: a 128-word program image,
//! the five fixed-point codecs its instruction set uses, and a
//! cycle-accurate, sample-by-sample interpreter with a debug surface.
//!
//! This crate has no knowledge of SpinASM source text; see `fv1asm` for the
//! assembler that produces the [`program::ProgramImage`] this crate runs.

pub mod constants;
pub mod decode;
pub mod delay;
pub mod execute;
pub mod fixed;
pub mod lfo;
pub mod opcode;
pub mod program;
pub mod register;
pub mod simulator;

pub use program::ProgramImage;
pub use simulator::{Simulator, StepOutcome};
