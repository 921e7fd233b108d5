//! Line-level tokenizing: comment stripping and label detection (spec.md
//! §4.3). Operand/expression tokenizing itself lives in `expr.rs`; this
//! module only knows how to carve a source line into the pieces `parser.rs`
//! assembles into statements.

/// Strips a `;` line comment, returning the code portion of the line.
pub fn strip_comment(line: &str) -> &str {
    match line.find(';') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// Splits `text` at the first run of whitespace, returning the leading word
/// and the (possibly empty) remainder, both trimmed.
pub fn split_first_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(idx) => (&text[..idx], text[idx..].trim_start()),
        None => (text, ""),
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// If `text` begins with `IDENT :`, returns `(label_name, rest_of_line)`.
pub fn split_label(text: &str) -> Option<(&str, &str)> {
    let text = text.trim_start();
    let mut chars = text.char_indices();
    let (_, first) = chars.next()?;
    if !(first.is_ascii_alphabetic() || first == '_') {
        return None;
    }
    let mut end = first.len_utf8();
    for (idx, c) in chars {
        if is_ident_char(c) {
            end = idx + c.len_utf8();
        } else {
            break;
        }
    }
    let name = &text[..end];
    let after_name = text[end..].trim_start();
    let rest = after_name.strip_prefix(':')?;
    Some((name, rest.trim_start()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn comment_is_stripped() {
        assert_eq!(strip_comment("rdax ADCL, 1.0 ; passthrough").trim(), "rdax ADCL, 1.0");
    }

    #[test]
    fn label_with_trailing_instruction_splits_in_two() {
        let (name, rest) = split_label("end: wrax DACL, 0").unwrap();
        assert_eq!(name, "end");
        assert_eq!(rest, "wrax DACL, 0");
    }

    #[test]
    fn bare_label_has_no_remainder() {
        let (name, rest) = split_label("end:").unwrap();
        assert_eq!(name, "end");
        assert_eq!(rest, "");
    }

    #[test]
    fn non_label_line_does_not_split() {
        assert!(split_label("rdax ADCL, 1.0").is_none());
    }
}
