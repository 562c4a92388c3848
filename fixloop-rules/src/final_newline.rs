use crate::{RuleMeta, RuleSource};
use fixloop_domain::{Analyzer, AnalyzerExecutionError, Compilation, Fixer};
use fixloop_types::diagnostic::{Diagnostic, DiagnosticDescriptor, Location, Severity, Span};
use fixloop_types::ops::{CodeAction, EditOperation, FixProposal, UnitEdit};
use fixloop_types::solution::Project;

pub struct FinalNewline;

impl FinalNewline {
    pub const ID: &'static str = "TXT1003";
    const TITLE: &'static str = "Missing final newline";

    pub const META: RuleMeta = RuleMeta {
        id: Self::ID,
        title: Self::TITLE,
        severity: Severity::Warning,
        source: RuleSource::Analyzer,
        fixable: true,
        fix_all: true,
        description: "A non-empty unit does not end with a newline.",
        remediation: "A newline is appended to every reported unit.",
    };
}

impl Analyzer for FinalNewline {
    fn name(&self) -> &str {
        "final-newline"
    }

    fn supported_descriptors(&self) -> Vec<DiagnosticDescriptor> {
        vec![DiagnosticDescriptor::new(
            Self::ID,
            Self::TITLE,
            Severity::Warning,
        )]
    }

    fn analyze(&self, compilation: &Compilation) -> Result<Vec<Diagnostic>, AnalyzerExecutionError> {
        Ok(compilation
            .units
            .iter()
            .filter(|u| !u.text().is_empty() && !u.text().ends_with('\n'))
            .map(|u| {
                Diagnostic::new(
                    Self::ID,
                    Severity::Warning,
                    Location::new(u.path().to_path_buf(), Span::empty(u.text().len())),
                    "no newline at end of unit",
                )
            })
            .collect())
    }
}

impl Fixer for FinalNewline {
    fn name(&self) -> &str {
        "final-newline"
    }

    fn fixable_ids(&self) -> Vec<String> {
        vec![Self::ID.to_string()]
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
            .map(|d| UnitEdit::insert(d.location.unit.clone(), d.location.span.start, "\n"))
            .collect();
        Ok(FixProposal::Edit(
            CodeAction::new("Add final newline", EditOperation::ApplyEdits { edits })
                .with_equivalence_key(Self::ID),
        ))
    }
}
