//! Two-pass SpinASM assembler for the [fv1](../fv1/index.html) chip model.
//!
//! The entry point is [`assemble`], which takes SpinASM source text and
//! assembler options and returns an [`AssemblerResult`] carrying the
//! [`ProgramImage`](fv1::ProgramImage) (empty if any diagnostic was fatal),
//! the full diagnostic list, and enough bookkeeping (labels, symbols, `MEM`
//! regions, address-to-line mapping) for a listing or a source map.

mod assembler;
mod diagnostics;
mod encode;
mod expr;
pub mod image_io;
mod lexer;
pub mod listing;
mod memtab;
mod parser;
mod symtab;

pub use assembler::{assemble, AssemblerOptions, AssemblerResult, LabelInfo, ResolvedMemRegion, ResolvedSymbol};
pub use diagnostics::Diagnostic;
