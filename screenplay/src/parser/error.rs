use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};

/// A listing parse error pointing at the offending bytes of the source.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message} (at {}..{})", .span.start, .span.end)]
pub struct ParseError {
    pub message: String,
    pub span: Range<usize>,
    pub file_id: usize,
    pub notes: Vec<String>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Range<usize>, file_id: usize) -> Self {
        ParseError {
            message: message.into(),
            span,
            file_id,
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        Diagnostic::new(Severity::Error)
            .with_message(&self.message)
            .with_labels(vec![Label::primary(self.file_id, self.span.clone())])
            .with_notes(self.notes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_shows_message_and_span() {
        let err = ParseError::new("unknown block type 'montage'", 11..18, 0);
        assert_eq!(err.to_string(), "unknown block type 'montage' (at 11..18)");
    }

    #[test]
    fn diagnostic_keeps_notes() {
        let err = ParseError::new("bad", 0..1, 3).with_note("try `action:`");
        let diagnostic = err.to_diagnostic();
        assert_eq!(diagnostic.message, "bad");
        assert_eq!(diagnostic.notes, vec!["try `action:`".to_string()]);
        assert_eq!(diagnostic.labels[0].file_id, 3);
    }
}
