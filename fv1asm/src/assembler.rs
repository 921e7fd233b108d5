//! The three assembler passes (spec.md §4.4), threaded explicitly through a
//! pass-owned working struct rather than instance fields (spec.md §9
//! Design Notes), with `assemble` as the only outward entry point.

use std::collections::{HashMap, HashSet};

use crate::diagnostics::Diagnostic;
use crate::encode;
use crate::expr::{self, Expression};
use crate::memtab::MemTable;
use crate::parser::{self, DirectiveKind, Statement};
use crate::symtab::SymbolTable;

#[derive(Clone, Debug)]
pub struct AssemblerOptions {
    pub fv1_asm_mem_bug: bool,
    pub clamp_reals: bool,
    pub reg_count: u8,
    pub prog_size: usize,
    pub delay_size: u32,
}

impl Default for AssemblerOptions {
    fn default() -> AssemblerOptions {
        AssemblerOptions {
            fv1_asm_mem_bug: true,
            clamp_reals: false,
            reg_count: 32,
            prog_size: fv1::constants::PROGRAM_CAPACITY,
            delay_size: fv1::constants::DELAY_CAPACITY as u32,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LabelInfo {
    pub line: u32,
    pub instruction_index: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedSymbol {
    pub name: String,
    pub value: f64,
    pub source_line: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedMemRegion {
    pub name: String,
    pub size: u32,
    pub start: u32,
    pub middle: u32,
    pub end: u32,
    pub source_line: u32,
}

pub struct AssemblerResult {
    pub program: Vec<u32>,
    pub problems: Vec<Diagnostic>,
    pub labels: HashMap<String, LabelInfo>,
    pub symbols: Vec<ResolvedSymbol>,
    pub memories: Vec<ResolvedMemRegion>,
    pub address_to_line: HashMap<u16, u32>,
    pub used_register_count: u8,
}

pub fn assemble(source: &str, options: &AssemblerOptions) -> AssemblerResult {
    let (statements, mut problems) = parser::parse(source);

    let label_names: HashSet<String> = statements
        .iter()
        .filter_map(|s| match s {
            Statement::Label { name, .. } => Some(name.clone()),
            _ => None,
        })
        .collect();

    let mut symtab = SymbolTable::with_predefined();
    let mut memtab = MemTable::new(options.delay_size, options.fv1_asm_mem_bug);
    let (mut running_values, _) = symtab.resolve();

    for statement in &statements {
        match statement {
            Statement::Directive { kind: DirectiveKind::Equ, identifier, expression, line } => {
                if label_names.contains(identifier) {
                    problems.push(Diagnostic::fatal(*line, format!("'{}' collides with a label", identifier)));
                    continue;
                }
                if memtab.contains(identifier) {
                    problems.push(Diagnostic::fatal(*line, format!("'{}' collides with a MEM region", identifier)));
                    continue;
                }
                if let Some(warning) = symtab.define(identifier, expression.clone(), *line) {
                    problems.push(warning);
                }
                if let Ok(v) = expr::evaluate(expression, &running_values) {
                    running_values.insert(identifier.clone(), v);
                }
            }
            Statement::Directive { kind: DirectiveKind::Mem, identifier, expression, line } => {
                if label_names.contains(identifier) {
                    problems.push(Diagnostic::fatal(*line, format!("'{}' collides with a label", identifier)));
                    continue;
                }
                if symtab.contains(identifier) {
                    problems.push(Diagnostic::fatal(*line, format!("'{}' collides with an EQU", identifier)));
                    continue;
                }
                let size = match expr::evaluate(expression, &running_values) {
                    Ok(v) => v.max(0.0) as u32,
                    Err(e) => {
                        problems.push(Diagnostic::fatal(*line, e.to_string()));
                        continue;
                    }
                };
                match memtab.allocate(identifier, size, *line) {
                    Ok(()) => {
                        let region = memtab.find(identifier).unwrap();
                        running_values.insert(identifier.clone(), region.start as f64);
                        running_values.insert(format!("{}#", identifier), memtab.end_reference(region) as f64);
                        running_values.insert(format!("{}^", identifier), region.middle as f64);
                    }
                    Err(diagnostic) => problems.push(diagnostic),
                }
            }
            _ => {}
        }
    }

    let (symbol_values, fold_diagnostics) = symtab.resolve();
    problems.extend(fold_diagnostics);

    let mut combined_values = symbol_values;
    for region in memtab.regions() {
        let name = memtab.name(region).to_string();
        combined_values.insert(name.clone(), region.start as f64);
        combined_values.insert(format!("{}#", name), memtab.end_reference(region) as f64);
        combined_values.insert(format!("{}^", name), region.middle as f64);
    }

    // Pass 2: label indexing.
    let mut labels: HashMap<String, LabelInfo> = HashMap::new();
    let mut instruction_index = 0u32;
    for statement in &statements {
        match statement {
            Statement::Label { name, line } => {
                if labels.contains_key(name) {
                    problems.push(Diagnostic::fatal(*line, format!("duplicate label '{}'", name)));
                } else {
                    labels.insert(name.clone(), LabelInfo { line: *line, instruction_index });
                }
            }
            Statement::Instruction { .. } => instruction_index += 1,
            Statement::Directive { .. } => {}
        }
    }
    for (name, info) in &labels {
        combined_values.insert(name.clone(), info.instruction_index as f64);
    }

    // Pass 3: encoding.
    let mut words: Vec<u32> = Vec::new();
    let mut address_to_line = HashMap::new();
    let mut used_registers: HashSet<u8> = HashSet::new();
    instruction_index = 0;

    for statement in &statements {
        let (mnemonic, operands, line) = match statement {
            Statement::Instruction { mnemonic, operands, line } => (mnemonic, operands, *line),
            _ => continue,
        };

        if instruction_index as usize >= options.prog_size {
            problems.push(Diagnostic::fatal(line, "program exceeds the 128-word instruction capacity"));
            instruction_index += 1;
            continue;
        }

        address_to_line.insert(instruction_index as u16, line);

        let word = match mnemonic.as_str() {
            "SKP" | "JMP" => encode_skip_family(mnemonic, operands, instruction_index, &labels, &combined_values, line, &mut problems),
            "CHO" => match eval_all(operands, &combined_values, line, &mut problems) {
                Some(values) => match encode::encode_cho(&values, options.clamp_reals) {
                    Ok(word) => Some(word),
                    Err(issue) => {
                        problems.push(Diagnostic::fatal(line, issue.to_string()));
                        None
                    }
                },
                None => None,
            },
            _ => match eval_all(operands, &combined_values, line, &mut problems) {
                Some(values) => {
                    track_register_usage(mnemonic, &values, &mut used_registers);
                    match encode::encode(mnemonic, &values, options.clamp_reals) {
                        Ok(word) => Some(word),
                        Err(issue) => {
                            problems.push(Diagnostic::fatal(line, issue.to_string()));
                            None
                        }
                    }
                }
                None => None,
            },
        };

        words.push(word.unwrap_or(0));
        instruction_index += 1;
    }

    let has_fatal = problems.iter().any(|d| d.fatal);
    let program = if has_fatal {
        Vec::new()
    } else {
        let mut padded = vec![fv1::constants::NOP_WORD; options.prog_size];
        let n = words.len().min(options.prog_size);
        padded[..n].copy_from_slice(&words[..n]);
        padded
    };

    let symbols = symtab_to_resolved(&symtab, &combined_values);
    let memories = memtab
        .regions()
        .iter()
        .map(|r| ResolvedMemRegion {
            name: memtab.name(r).to_string(),
            size: r.size,
            start: r.start,
            middle: r.middle,
            end: r.end,
            source_line: r.source_line,
        })
        .collect();

    AssemblerResult {
        program,
        problems,
        labels,
        symbols,
        memories,
        address_to_line,
        used_register_count: used_registers.len() as u8,
    }
}

fn eval_all(
    operands: &[Expression],
    values: &HashMap<String, f64>,
    line: u32,
    problems: &mut Vec<Diagnostic>,
) -> Option<Vec<f64>> {
    let mut out = Vec::with_capacity(operands.len());
    let mut ok = true;
    for operand in operands {
        match expr::evaluate(operand, values) {
            Ok(v) => out.push(v),
            Err(e) => {
                problems.push(Diagnostic::fatal(line, e.to_string()));
                ok = false;
            }
        }
    }
    if ok {
        Some(out)
    } else {
        None
    }
}

fn encode_skip_family(
    mnemonic: &str,
    operands: &[Expression],
    current_index: u32,
    labels: &HashMap<String, LabelInfo>,
    values: &HashMap<String, f64>,
    line: u32,
    problems: &mut Vec<Diagnostic>,
) -> Option<u32> {
    let (flags_expr, target_expr) = match (mnemonic, operands) {
        ("SKP", [flags, target]) => (Some(flags), target),
        ("JMP", [target]) => (None, target),
        _ => {
            problems.push(Diagnostic::fatal(line, format!("{} takes {} operand(s)", mnemonic, if mnemonic == "SKP" { 2 } else { 1 })));
            return None;
        }
    };

    let flags = match flags_expr {
        Some(expr) => match expr::evaluate(expr, values) {
            Ok(v) => v as i64 as u32,
            Err(e) => {
                problems.push(Diagnostic::fatal(line, e.to_string()));
                return None;
            }
        },
        None => 0,
    };

    let n = match resolve_skip_target(target_expr, current_index, labels, values) {
        Ok(n) => n,
        Err(message) => {
            problems.push(Diagnostic::fatal(line, message));
            return None;
        }
    };

    Some(encode::encode_skp(flags, n))
}

fn resolve_skip_target(
    expr: &Expression,
    current_index: u32,
    labels: &HashMap<String, LabelInfo>,
    values: &HashMap<String, f64>,
) -> Result<u32, String> {
    if let Expression::Identifier(name) = expr {
        if let Some(info) = labels.get(name) {
            let relative = info.instruction_index as i64 - (current_index as i64 + 1);
            if relative < 0 || relative > 0x3F {
                return Err(format!("'{}' is out of SKP's forward-jump range", name));
            }
            return Ok(relative as u32);
        }
    }
    let v = expr::evaluate(expr, values).map_err(|e| e.to_string())?;
    Ok((v as i64 as u32) & 0x3F)
}

fn track_register_usage(mnemonic: &str, values: &[f64], used: &mut HashSet<u8>) {
    let register_operand_index = match mnemonic {
        "RDAX" | "RDFX" | "WRLX" | "WRHX" | "WRAX" | "MAXX" | "LDAX" | "MULX" => Some(0),
        _ => None,
    };
    if let Some(idx) = register_operand_index {
        if let Some(&v) = values.get(idx) {
            let reg = (v as i64 as u32) as u8 & 0x3F;
            if reg >= fv1::constants::USER_REGISTER_START && reg <= fv1::constants::USER_REGISTER_END {
                used.insert(reg);
            }
        }
    }
}

fn symtab_to_resolved(_symtab: &SymbolTable, values: &HashMap<String, f64>) -> Vec<ResolvedSymbol> {
    // Only user-defined names carry useful source lines for downstream
    // tooling; predefined names are always available and omitted here.
    values
        .iter()
        .map(|(name, value)| ResolvedSymbol { name: name.clone(), value: *value, source_line: 0 })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_source_pads_to_all_nop() {
        let result = assemble("", &AssemblerOptions::default());
        assert!(result.problems.iter().all(|d| !d.fatal));
        assert_eq!(result.program.len(), 128);
        assert!(result.program.iter().all(|&w| w == fv1::constants::NOP_WORD));
    }

    #[test]
    fn simple_passthrough_assembles_four_words() {
        let source = "rdax ADCL, 1.0\nwrax DACL, 0.0\nrdax ADCR, 1.0\nwrax DACR, 0.0\n";
        let result = assemble(source, &AssemblerOptions::default());
        assert!(result.problems.iter().all(|d| !d.fatal), "{:?}", result.problems);
        assert_eq!(result.program.len(), 128);
        assert_ne!(result.program[0], fv1::constants::NOP_WORD);
    }

    #[test]
    fn skp_to_label_computes_relative_offset() {
        let source = "sof 0,0\nskp ZRO, end\nsof 0, 0.5\nend: wrax DACL, 0\n";
        let result = assemble(source, &AssemblerOptions::default());
        assert!(result.problems.iter().all(|d| !d.fatal), "{:?}", result.problems);
        let skp_word = result.program[1];
        let n = (skp_word >> 21) & 0x3F;
        assert_eq!(n, 1);
    }

    #[test]
    fn mem_bug_flag_matches_scenario_from_spec() {
        let source = "BUF1 MEM 100\nBUF2 MEM 200\n";
        let result = assemble(source, &AssemblerOptions::default());
        assert!(result.problems.iter().all(|d| !d.fatal));
        let buf1 = result.memories.iter().find(|m| m.name == "BUF1").unwrap();
        let buf2 = result.memories.iter().find(|m| m.name == "BUF2").unwrap();
        assert_eq!(buf1.start, 0);
        assert_eq!(buf2.start, 101);
    }

    #[test]
    fn oversize_program_is_fatal_and_emits_nothing() {
        let mut source = String::new();
        for _ in 0..130 {
            source.push_str("nop\n");
        }
        let result = assemble(&source, &AssemblerOptions::default());
        assert!(result.problems.iter().any(|d| d.fatal));
        assert!(result.program.is_empty());
    }

    #[test]
    fn undefined_identifier_is_fatal() {
        let result = assemble("rdax NOPE, 1.0\n", &AssemblerOptions::default());
        assert!(result.problems.iter().any(|d| d.fatal));
        assert!(result.program.is_empty());
    }
}
