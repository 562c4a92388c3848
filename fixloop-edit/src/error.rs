//! Error types for fixloop-edit.
//!
//! Every variant means the operation was rejected as a whole; the input
//! project is left untouched.

use camino::Utf8PathBuf;
use fixloop_types::diagnostic::Span;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditError {
    /// The operation targets a unit the project does not contain.
    #[error("unknown unit: {path}")]
    UnknownUnit { path: Utf8PathBuf },

    /// `AddUnit` for a path that already exists.
    #[error("unit already exists: {path}")]
    UnitExists { path: Utf8PathBuf },

    #[error("span {}..{} out of bounds for {unit} (len {len})", span.start, span.end)]
    SpanOutOfBounds {
        unit: Utf8PathBuf,
        span: Span,
        len: usize,
    },

    #[error("offset {offset} in {unit} is not on a char boundary")]
    NotCharBoundary { unit: Utf8PathBuf, offset: usize },

    #[error("overlapping edits in {unit}: {}..{} and {}..{}", first.start, first.end, second.start, second.end)]
    OverlappingEdits {
        unit: Utf8PathBuf,
        first: Span,
        second: Span,
    },

    #[error("operation contains no edits")]
    Empty,
}

impl EditError {
    /// The unit the error refers to, when there is one.
    pub fn unit(&self) -> Option<&Utf8PathBuf> {
        match self {
            EditError::UnknownUnit { path } | EditError::UnitExists { path } => Some(path),
            EditError::SpanOutOfBounds { unit, .. }
            | EditError::NotCharBoundary { unit, .. }
            | EditError::OverlappingEdits { unit, .. } => Some(unit),
            EditError::Empty => None,
        }
    }
}

/// Result type alias using EditError.
pub type EditResult<T> = Result<T, EditError>;

#[cfg(test)]
mod tests {
    use super::EditError;
    use fixloop_types::diagnostic::Span;

    #[test]
    fn display_includes_unit_and_span() {
        let err = EditError::SpanOutOfBounds {
            unit: "a.txt".into(),
            span: Span::new(3, 9),
            len: 4,
        };
        let msg = err.to_string();
        assert!(msg.contains("a.txt"));
        assert!(msg.contains("3..9"));
        assert!(msg.contains("len 4"));
    }

    #[test]
    fn overlapping_display_lists_both_spans() {
        let err = EditError::OverlappingEdits {
            unit: "b.txt".into(),
            first: Span::new(0, 2),
            second: Span::new(1, 3),
        };
        assert!(err.to_string().contains("0..2 and 1..3"));
    }

    #[test]
    fn unit_accessor() {
        assert!(EditError::Empty.unit().is_none());
        let err = EditError::UnknownUnit {
            path: "c.txt".into(),
        };
        assert_eq!(err.unit().map(|p| p.as_str()), Some("c.txt"));
    }
}
