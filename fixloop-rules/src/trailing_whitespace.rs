use crate::{RuleMeta, RuleSource, allows, lines};
use fixloop_domain::{Analyzer, AnalyzerExecutionError, Compilation, Fixer};
use fixloop_types::diagnostic::{Diagnostic, DiagnosticDescriptor, Location, Severity, Span};
use fixloop_types::ops::{CodeAction, EditOperation, FixProposal, UnitEdit};
use fixloop_types::solution::Project;

pub struct TrailingWhitespace;

impl TrailingWhitespace {
    pub const ID: &'static str = "TXT1001";
    const TITLE: &'static str = "Trailing whitespace";

    pub const META: RuleMeta = RuleMeta {
        id: Self::ID,
        title: Self::TITLE,
        severity: Severity::Warning,
        source: RuleSource::Analyzer,
        fixable: true,
        fix_all: true,
        description: "A line ends with spaces or tabs before the line ending.",
        remediation: "Deleted automatically; every occurrence in a batch is removed at once.",
    };
}

impl Analyzer for TrailingWhitespace {
    fn name(&self) -> &str {
        "trailing-whitespace"
    }

    fn supported_descriptors(&self) -> Vec<DiagnosticDescriptor> {
        vec![DiagnosticDescriptor::new(
            Self::ID,
            Self::TITLE,
            Severity::Warning,
        )]
    }

    fn analyze(&self, compilation: &Compilation) -> Result<Vec<Diagnostic>, AnalyzerExecutionError> {
        let mut out = Vec::new();
        for unit in &compilation.units {
            for (start, line) in lines(unit.text()) {
                let trimmed = line.trim_end_matches([' ', '\t']);
                if trimmed.len() == line.len() {
                    continue;
                }
                let span = Span::new(start + trimmed.len(), start + line.len());
                let mut d = Diagnostic::new(
                    Self::ID,
                    Severity::Warning,
                    Location::new(unit.path().to_path_buf(), span),
                    format!("{} trailing whitespace character(s)", span.len()),
                );
                if allows(line, Self::ID) {
                    d = d.suppressed();
                }
                out.push(d);
            }
        }
        Ok(out)
    }
}

impl Fixer for TrailingWhitespace {
    fn name(&self) -> &str {
        "trailing-whitespace"
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
            .map(|d| UnitEdit::delete(d.location.unit.clone(), d.location.span))
            .collect();
        Ok(FixProposal::Edit(
            CodeAction::new(
                "Remove trailing whitespace",
                EditOperation::ApplyEdits { edits },
            )
            .with_equivalence_key(Self::ID),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixloop_types::solution::CompilationUnit;
    use pretty_assertions::assert_eq;

    fn compile(text: &str) -> (Project, Compilation) {
        let project = Project::new("p", "p").with_unit(CompilationUnit::new("p/a.txt", text));
        let compilation = Compilation::clean(&project);
        (project, compilation)
    }

    #[test]
    fn finds_trailing_runs_per_line() {
        let (_, compilation) = compile("a  \nb\t\r\nc\n   ");
        let diags = TrailingWhitespace.analyze(&compilation).unwrap();
        let spans: Vec<Span> = diags.iter().map(|d| d.location.span).collect();
        assert_eq!(spans, vec![Span::new(1, 3), Span::new(5, 6), Span::new(10, 13)]);
    }

    #[test]
    fn allow_marker_suppresses() {
        let (_, compilation) = compile("keep  fixloop:allow(TXT1001)  \n");
        let diags = TrailingWhitespace.analyze(&compilation).unwrap();
        assert_eq!(diags.len(), 1);
        assert!(diags[0].suppressed);
    }

    #[test]
    fn fix_deletes_every_span_in_one_action() {
        let (project, compilation) = compile("a  \nb \n");
        let diags = TrailingWhitespace.analyze(&compilation).unwrap();
        let FixProposal::Edit(action) = TrailingWhitespace.propose_fix(&diags, &project).unwrap()
        else {
            panic!("expected an edit");
        };
        assert_eq!(action.operations.len(), 1);
        let next = fixloop_edit::apply_operation(&project, &action.operations[0]).unwrap();
        assert_eq!(next.units()[0].text(), "a\nb\n");
    }
}
