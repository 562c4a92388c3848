//! BDD harness (cucumber-rs).
//!
//! This crate exists to keep scenario tests isolated from the production crates.
//! It only carries the support code the step definitions share.

use fixloop_domain::{Analyzer, AnalyzerExecutionError, Compilation, Fixer};
use fixloop_types::diagnostic::{Diagnostic, DiagnosticDescriptor, Location, Severity, Span};
use fixloop_types::ops::{CodeAction, EditOperation, FixProposal, UnitEdit};
use fixloop_types::solution::Project;

/// Reports every occurrence of `from` and rewrites them all to `to`.
///
/// Two swaps pointing at each other never converge.
#[derive(Debug, Clone)]
pub struct WordSwap {
    pub id: String,
    pub from: String,
    pub to: String,
}

impl WordSwap {
    pub fn new(id: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            to: to.into(),
        }
    }
}

impl Analyzer for WordSwap {
    fn name(&self) -> &str {
        &self.id
    }

    fn supported_descriptors(&self) -> Vec<DiagnosticDescriptor> {
        vec![DiagnosticDescriptor::new(
            &self.id,
            format!("'{}' should read '{}'", self.from, self.to),
            Severity::Warning,
        )]
    }

    fn analyze(&self, compilation: &Compilation) -> Result<Vec<Diagnostic>, AnalyzerExecutionError> {
        if self.from.is_empty() {
            return Err(AnalyzerExecutionError::new(&self.id, "empty search word"));
        }
        let mut out = Vec::new();
        for unit in &compilation.units {
            for (at, word) in unit.text().match_indices(self.from.as_str()) {
                out.push(Diagnostic::new(
                    &self.id,
                    Severity::Warning,
                    Location::new(unit.path().to_path_buf(), Span::new(at, at + word.len())),
                    format!("found '{}'", self.from),
                ));
            }
        }
        Ok(out)
    }
}

impl Fixer for WordSwap {
    fn name(&self) -> &str {
        &self.id
    }

    fn fixable_ids(&self) -> Vec<String> {
        vec![self.id.clone()]
    }

    fn supports_fix_all(&self) -> bool {
        true
    }

    fn propose_fix(&self, batch: &[Diagnostic], _project: &Project) -> anyhow::Result<FixProposal> {
        if batch.is_empty() {
            return Ok(FixProposal::None);
        }
        let edits = batch
            .iter()
            .map(|d| UnitEdit::replace(d.location.unit.clone(), d.location.span, self.to.as_str()))
            .collect();
        Ok(FixProposal::Edit(CodeAction::new(
            format!("Rewrite '{}' to '{}'", self.from, self.to),
            EditOperation::ApplyEdits { edits },
        )))
    }
}

/// Expands `\n` and `\t` written literally in feature files.
pub fn unescape(text: &str) -> String {
    text.replace("\\n", "\n").replace("\\t", "\t")
}
