//! Builds the statement list (spec.md §3, §4.3) from source text: one pass
//! over the lines, handing word-splitting to `lexer.rs` and operand text to
//! `expr.rs`.

use crate::diagnostics::Diagnostic;
use crate::expr::{self, Expression};
use crate::lexer::{split_first_word, split_label, strip_comment};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirectiveKind {
    Equ,
    Mem,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    Label { name: String, line: u32 },
    Directive { kind: DirectiveKind, identifier: String, expression: Expression, line: u32 },
    Instruction { mnemonic: String, operands: Vec<Expression>, line: u32 },
}

fn directive_kind(word: &str) -> Option<DirectiveKind> {
    match word.to_ascii_uppercase().as_str() {
        "EQU" => Some(DirectiveKind::Equ),
        "MEM" => Some(DirectiveKind::Mem),
        _ => None,
    }
}

pub fn parse(source: &str) -> (Vec<Statement>, Vec<Diagnostic>) {
    let mut statements = Vec::new();
    let mut diagnostics = Vec::new();

    for (idx, raw_line) in source.lines().enumerate() {
        let line = idx as u32 + 1;
        let code = strip_comment(raw_line).trim();
        if code.is_empty() {
            continue;
        }

        let remainder = match split_label(code) {
            Some((name, rest)) => {
                statements.push(Statement::Label { name: name.to_string(), line });
                rest
            }
            None => code,
        };

        if remainder.is_empty() {
            continue;
        }

        match parse_statement_body(remainder, line) {
            Ok(statement) => statements.push(statement),
            Err(diagnostic) => diagnostics.push(diagnostic),
        }
    }

    (statements, diagnostics)
}

fn parse_statement_body(text: &str, line: u32) -> Result<Statement, Diagnostic> {
    let (word1, rest1) = split_first_word(text);

    if let Some(kind) = directive_kind(word1) {
        let (name, rest2) = split_first_word(rest1);
        let expression = expr::parse(rest2).map_err(|e| Diagnostic::fatal(line, e.to_string()))?;
        return Ok(Statement::Directive { kind, identifier: name.to_string(), expression, line });
    }

    let (word2, rest2) = split_first_word(rest1);
    if let Some(kind) = directive_kind(word2) {
        let expression = expr::parse(rest2).map_err(|e| Diagnostic::fatal(line, e.to_string()))?;
        return Ok(Statement::Directive { kind, identifier: word1.to_string(), expression, line });
    }

    let operands = if rest1.is_empty() {
        Vec::new()
    } else {
        let mut ops = Vec::new();
        for part in rest1.split(',') {
            let part = part.trim();
            ops.push(expr::parse(part).map_err(|e| Diagnostic::fatal(line, e.to_string()))?);
        }
        ops
    };

    Ok(Statement::Instruction { mnemonic: word1.to_ascii_uppercase(), operands, line })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn directive_either_word_order_parses() {
        let (statements, diagnostics) = parse("BUF1 MEM 100\nMEM BUF2 200\n");
        assert!(diagnostics.is_empty());
        assert_eq!(statements.len(), 2);
        assert!(matches!(&statements[0], Statement::Directive { kind: DirectiveKind::Mem, identifier, .. } if identifier == "BUF1"));
        assert!(matches!(&statements[1], Statement::Directive { kind: DirectiveKind::Mem, identifier, .. } if identifier == "BUF2"));
    }

    #[test]
    fn label_and_instruction_on_same_line_are_two_statements() {
        let (statements, diagnostics) = parse("end: wrax DACL, 0\n");
        assert!(diagnostics.is_empty());
        assert_eq!(statements.len(), 2);
        assert!(matches!(&statements[0], Statement::Label { name, .. } if name == "end"));
        assert!(matches!(&statements[1], Statement::Instruction { mnemonic, .. } if mnemonic == "WRAX"));
    }

    #[test]
    fn instruction_operands_are_comma_separated_expressions() {
        let (statements, _) = parse("rdax ADCL, 1.0\n");
        match &statements[0] {
            Statement::Instruction { mnemonic, operands, .. } => {
                assert_eq!(mnemonic, "RDAX");
                assert_eq!(operands.len(), 2);
            }
            other => panic!("expected instruction, got {:?}", other),
        }
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let (statements, _) = parse("; a comment\n\nnop\n");
        assert_eq!(statements.len(), 1);
    }
}
