use crate::diagnostic::Span;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// Replace `span` in `unit` with `new_text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitEdit {
    pub unit: Utf8PathBuf,
    pub span: Span,
    pub new_text: String,
}

impl UnitEdit {
    pub fn replace(unit: impl Into<Utf8PathBuf>, span: Span, new_text: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            span,
            new_text: new_text.into(),
        }
    }

    pub fn insert(unit: impl Into<Utf8PathBuf>, at: usize, text: impl Into<String>) -> Self {
        Self::replace(unit, Span::empty(at), text)
    }

    pub fn delete(unit: impl Into<Utf8PathBuf>, span: Span) -> Self {
        Self::replace(unit, span, String::new())
    }
}

/// One atomic change to a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditOperation {
    /// Non-overlapping replacements, possibly across several units, applied together.
    ApplyEdits { edits: Vec<UnitEdit> },
    AddUnit { path: Utf8PathBuf, text: String },
    RemoveUnit { path: Utf8PathBuf },
}

impl EditOperation {
    pub fn single(edit: UnitEdit) -> Self {
        EditOperation::ApplyEdits { edits: vec![edit] }
    }
}

/// A fixer's candidate change.
///
/// Only actions with exactly one operation are applied automatically; anything
/// else is left for a human.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeAction {
    pub title: String,

    /// Identifies "the same kind of fix" across invocations, used to pick
    /// between alternatives.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equivalence_key: Option<String>,

    pub operations: Vec<EditOperation>,
}

impl CodeAction {
    pub fn new(title: impl Into<String>, operation: EditOperation) -> Self {
        Self {
            title: title.into(),
            equivalence_key: None,
            operations: vec![operation],
        }
    }

    pub fn with_equivalence_key(mut self, key: impl Into<String>) -> Self {
        self.equivalence_key = Some(key.into());
        self
    }
}

/// What a fixer returns for a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixProposal {
    Edit(CodeAction),
    /// Several independent alternatives; something outside the fixer must choose.
    Ambiguous(Vec<CodeAction>),
    None,
}
