//! Assembly problems as data, never exceptions (spec.md §7): collected
//! during a run and returned alongside whatever code could still be
//! emitted, the way `vasm::SourceMapItem` is plain data rather than a
//! thrown error.

#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub message: String,
    pub fatal: bool,
    pub line: u32,
}

impl Diagnostic {
    pub fn fatal(line: u32, message: impl Into<String>) -> Diagnostic {
        Diagnostic { message: message.into(), fatal: true, line }
    }

    pub fn warning(line: u32, message: impl Into<String>) -> Diagnostic {
        Diagnostic { message: message.into(), fatal: false, line }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}: {}",
            if self.fatal { "error" } else { "warning" },
            self.line,
            self.message
        )
    }
}
