use crate::{RuleMeta, RuleSource, allows, lines};
use anyhow::Context;
use fixloop_domain::{Analyzer, AnalyzerExecutionError, Compilation, Fixer};
use fixloop_types::diagnostic::{Diagnostic, DiagnosticDescriptor, Location, Severity, Span};
use fixloop_types::ops::{CodeAction, EditOperation, FixProposal, UnitEdit};
use fixloop_types::solution::Project;

/// Indentation that contains a tab. The fixer expands one line per call.
pub struct TabIndent {
    pub width: usize,
}

impl Default for TabIndent {
    fn default() -> Self {
        Self { width: 4 }
    }
}

impl TabIndent {
    pub const ID: &'static str = "TXT1002";
    const TITLE: &'static str = "Tab indentation";

    pub const META: RuleMeta = RuleMeta {
        id: Self::ID,
        title: Self::TITLE,
        severity: Severity::Info,
        source: RuleSource::Analyzer,
        fixable: true,
        fix_all: false,
        description: "A line is indented with one or more tab characters.",
        remediation: "Expanded to spaces one line at a time, so every batch is re-analyzed.",
    };

    fn expand(&self, indent: &str) -> String {
        let mut out = String::with_capacity(indent.len() * self.width);
        for c in indent.chars() {
            if c == '\t' {
                let pad = self.width - out.len() % self.width.max(1);
                out.extend(std::iter::repeat_n(' ', pad));
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl Analyzer for TabIndent {
    fn name(&self) -> &str {
        "tab-indent"
    }

    fn supported_descriptors(&self) -> Vec<DiagnosticDescriptor> {
        vec![DiagnosticDescriptor::new(Self::ID, Self::TITLE, Severity::Info)]
    }

    fn analyze(&self, compilation: &Compilation) -> Result<Vec<Diagnostic>, AnalyzerExecutionError> {
        let mut out = Vec::new();
        for unit in &compilation.units {
            for (start, line) in lines(unit.text()) {
                let content = line.trim_start_matches([' ', '\t']);
                let indent = &line[..line.len() - content.len()];
                if !indent.contains('\t') {
                    continue;
                }
                let mut d = Diagnostic::new(
                    Self::ID,
                    Severity::Info,
                    Location::new(
                        unit.path().to_path_buf(),
                        Span::new(start, start + indent.len()),
                    ),
                    "indentation uses tabs",
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

impl Fixer for TabIndent {
    fn name(&self) -> &str {
        "tab-indent"
    }

    fn fixable_ids(&self) -> Vec<String> {
        vec![Self::ID.to_string()]
    }

    fn propose_fix(&self, batch: &[Diagnostic], project: &Project) -> anyhow::Result<FixProposal> {
        // Last in the batch: expanding it leaves earlier spans where they were.
        let Some(target) = batch.last() else {
            return Ok(FixProposal::None);
        };
        let unit = project
            .unit(&target.location.unit)
            .with_context(|| format!("unit {} not in project", target.location.unit))?;
        let indent = unit
            .text()
            .get(target.location.span.start..target.location.span.end)
            .with_context(|| format!("stale span {} in {}", target.location.span.start, unit.path()))?;

        let edit = UnitEdit::replace(
            target.location.unit.clone(),
            target.location.span,
            self.expand(indent),
        );
        Ok(FixProposal::Edit(
            CodeAction::new(
                format!("Indent with {} spaces", self.width),
                EditOperation::single(edit),
            )
            .with_equivalence_key(format!("{}:spaces", Self::ID)),
        ))
    }
}
