// diag.rs — Diagnostics reported while building and checking a graph
//
// Lowering and verification return `Vec<Diagnostic>`; the pipeline decides
// whether to stop based on `DiagLevel`. Rendering against a file name and
// line/column is left to the binary.
//
// Preconditions: none (types only).
// Postconditions: none (types only).
// Failure modes: none.
// Side effects: none.

use std::fmt;

use crate::ast::Span;

// ── Codes ───────────────────────────────────────────────────────────────────

/// Stable identifier printed in brackets after the severity, e.g. `E0101`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagCode(pub &'static str);

impl fmt::Display for DiagCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

pub mod codes {
    use super::DiagCode;

    // Lowering (E01xx)
    pub const E0100: DiagCode = DiagCode("E0100"); // duplicate value name
    pub const E0101: DiagCode = DiagCode("E0101"); // undefined value
    pub const E0102: DiagCode = DiagCode("E0102"); // duplicate block name

    // Verification (E02xx / W02xx)
    pub const E0200: DiagCode = DiagCode("E0200"); // StringConcat arity
    pub const E0201: DiagCode = DiagCode("E0201"); // StringLength arity
    pub const E0202: DiagCode = DiagCode("E0202"); // leaf op with inputs
    pub const W0200: DiagCode = DiagCode("W0200"); // forward reference outside loop phi
}

// ── Diagnostic ──────────────────────────────────────────────────────────────

/// Errors stop the pipeline after the pass that produced them; warnings don't.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagLevel {
    Error,
    Warning,
}

/// Secondary location, rendered as a `note:` line.
#[derive(Debug, Clone)]
pub struct Note {
    pub span: Span,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: Option<DiagCode>,
    pub level: DiagLevel,
    pub span: Span,
    pub message: String,
    pub hint: Option<String>,
    pub related_spans: Vec<Note>,
}

impl Diagnostic {
    pub fn new(level: DiagLevel, span: Span, message: impl Into<String>) -> Self {
        Diagnostic {
            code: None,
            level,
            span,
            message: message.into(),
            hint: None,
            related_spans: Vec::new(),
        }
    }

    pub fn with_code(mut self, code: DiagCode) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Point at a second location, e.g. the first definition of a duplicate.
    pub fn with_related(mut self, span: Span, label: impl Into<String>) -> Self {
        self.related_spans.push(Note {
            span,
            label: label.into(),
        });
        self
    }

    pub fn is_error(&self) -> bool {
        self.level == DiagLevel::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            DiagLevel::Error => "error",
            DiagLevel::Warning => "warning",
        };
        match &self.code {
            Some(code) => write!(f, "{}[{}]: {}", level, code, self.message)?,
            None => write!(f, "{}: {}", level, self.message)?,
        }
        if let Some(hint) = &self.hint {
            write!(f, "\n  hint: {}", hint)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: usize, end: usize) -> Span {
        (start..end).into()
    }

    #[test]
    fn plain_message() {
        let d = Diagnostic::new(DiagLevel::Error, span(0, 1), "undefined value `%x`");
        assert_eq!(d.to_string(), "error: undefined value `%x`");
        assert!(d.is_error());
    }

    #[test]
    fn code_and_hint() {
        let d = Diagnostic::new(DiagLevel::Warning, span(4, 9), "forward reference")
            .with_code(codes::W0200)
            .with_hint("move the definition up");
        assert!(!d.is_error());
        assert_eq!(
            d.to_string(),
            "warning[W0200]: forward reference\n  hint: move the definition up"
        );
    }

    #[test]
    fn notes_accumulate() {
        let d = Diagnostic::new(DiagLevel::Error, span(10, 12), "duplicate value `%a`")
            .with_code(codes::E0100)
            .with_related(span(2, 4), "first defined here");
        assert_eq!(d.code, Some(DiagCode("E0100")));
        assert_eq!(d.related_spans.len(), 1);
        assert_eq!(d.related_spans[0].span.start, 2);
        // Notes are rendered by the caller, not by Display.
        assert_eq!(d.to_string(), "error[E0100]: duplicate value `%a`");
    }
}
