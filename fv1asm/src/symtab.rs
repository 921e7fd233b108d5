//! Symbol table: predefined names, user `EQU`s, and the iterative fixpoint
//! fold spec.md §4.4 requires ("Inter-EQU references are re-resolved after
//! every install..."). Values are kept as parsed [`Expression`] trees rather
//! than the reference implementation's raw strings — evaluating the same
//! fixpoint over an AST (re-substituting identifiers on every install) gets
//! the same bit-identical result without hand-rolled text substitution.

use std::collections::HashMap;

use fv1::constants::{lfo_index, registers};
use fv1::opcode::{cho_flags, ChoMode};

/// `SKP`'s predefined flag symbols, at the word position `encode_skp` masks
/// them in at (bits 27-31) — *not* `fv1::constants::skip_flags`, which holds
/// the same flags shifted down to the decoder's local 5-bit field.
mod source_skip_flags {
    pub const RUN: u32 = 0x8000_0000;
    pub const ZRC: u32 = 0x4000_0000;
    pub const ZRO: u32 = 0x2000_0000;
    pub const GEZ: u32 = 0x1000_0000;
    pub const NEG: u32 = 0x0800_0000;
}

use crate::diagnostics::Diagnostic;
use crate::expr::{self, Expression};

#[derive(Clone, Debug, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub expression: Expression,
    pub source_line: u32,
    pub is_predefined: bool,
}

pub struct SymbolTable {
    order: Vec<String>,
    symbols: HashMap<String, Symbol>,
}

impl SymbolTable {
    /// A fresh table seeded with every name SpinASM installs before user
    /// code runs (spec.md §3 "Predefined symbols").
    pub fn with_predefined() -> SymbolTable {
        let mut table = SymbolTable { order: Vec::new(), symbols: HashMap::new() };

        for &(name, index) in registers::predefined() {
            table.install_predefined(name, index as f64);
        }
        for n in 0..32u8 {
            table.install_predefined(&registers::general_purpose_name(n), (registers::REG0 + n) as f64);
        }

        table.install_predefined("RUN", source_skip_flags::RUN as f64);
        table.install_predefined("ZRC", source_skip_flags::ZRC as f64);
        table.install_predefined("ZRO", source_skip_flags::ZRO as f64);
        table.install_predefined("GEZ", source_skip_flags::GEZ as f64);
        table.install_predefined("NEG", source_skip_flags::NEG as f64);

        table.install_predefined("RDA", ChoMode::Rda as i32 as f64);
        table.install_predefined("SOF", ChoMode::Sof as i32 as f64);
        table.install_predefined("RDAL", ChoMode::Rdal as i32 as f64);

        table.install_predefined("SIN0", lfo_index::SIN0 as f64);
        table.install_predefined("SIN1", lfo_index::SIN1 as f64);
        table.install_predefined("RMP0", lfo_index::RMP0 as f64);
        table.install_predefined("RMP1", lfo_index::RMP1 as f64);
        table.install_predefined("COS0", lfo_index::COS0 as f64);
        table.install_predefined("COS1", lfo_index::COS1 as f64);

        table.install_predefined("COMPC", cho_flags::COMPC as f64);
        table.install_predefined("COMPA", cho_flags::COMPA as f64);
        table.install_predefined("REG", cho_flags::REG as f64);
        table.install_predefined("RPTR2", cho_flags::RPTR2 as f64);
        table.install_predefined("NA", cho_flags::NA as f64);

        table
    }

    fn install_predefined(&mut self, name: &str, value: f64) {
        self.order.push(name.to_string());
        self.symbols.insert(
            name.to_string(),
            Symbol { name: name.to_string(), expression: Expression::Number(value), source_line: 0, is_predefined: true },
        );
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    /// Installs (or replaces) a user `EQU`. Returns a warning diagnostic if
    /// it shadows a previous user definition. The caller is responsible for
    /// rejecting names that collide with a label or `MEM` region first.
    pub fn define(&mut self, name: &str, expression: Expression, line: u32) -> Option<Diagnostic> {
        let warning = if let Some(existing) = self.symbols.get(name) {
            if !existing.is_predefined {
                Some(Diagnostic::warning(line, format!("redefinition of '{}'", name)))
            } else {
                None
            }
        } else {
            None
        };

        if !self.symbols.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.symbols.insert(
            name.to_string(),
            Symbol { name: name.to_string(), expression, source_line: line, is_predefined: false },
        );
        warning
    }

    /// Folds every installed symbol to a concrete number, iterating until a
    /// fixpoint (or a bounded number of passes) so forward references among
    /// `EQU`s resolve the way SpinASM's per-definition substitution does.
    pub fn resolve(&self) -> (HashMap<String, f64>, Vec<Diagnostic>) {
        let mut values: HashMap<String, f64> = HashMap::new();
        let mut diagnostics = Vec::new();

        const MAX_PASSES: usize = 16;
        for _ in 0..MAX_PASSES {
            let mut changed = false;
            for name in &self.order {
                let symbol = &self.symbols[name];
                if let Ok(v) = expr::evaluate(&symbol.expression, &values) {
                    if values.get(name) != Some(&v) {
                        values.insert(name.clone(), v);
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }

        for name in &self.order {
            if !values.contains_key(name) {
                let symbol = &self.symbols[name];
                diagnostics.push(Diagnostic::fatal(
                    symbol.source_line,
                    format!("'{}' could not be resolved to a number", name),
                ));
            }
        }

        (values, diagnostics)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::expr::parse;

    #[test]
    fn predefined_registers_are_present() {
        let table = SymbolTable::with_predefined();
        assert!(table.contains("ADCL"));
        assert!(table.contains("REG0"));
        assert!(table.contains("RUN"));
    }

    #[test]
    fn forward_reference_between_equs_resolves() {
        let mut table = SymbolTable::with_predefined();
        table.define("A", parse("B+1").unwrap(), 1);
        table.define("B", parse("2").unwrap(), 2);
        let (values, diagnostics) = table.resolve();
        assert!(diagnostics.is_empty());
        assert_eq!(values.get("A"), Some(&3.0));
    }

    #[test]
    fn redefinition_of_user_symbol_warns() {
        let mut table = SymbolTable::with_predefined();
        table.define("A", parse("1").unwrap(), 1);
        let warning = table.define("A", parse("2").unwrap(), 2);
        assert!(warning.is_some());
    }
}
