use crate::{RuleMeta, RuleSource, allows, lines};
use fixloop_domain::{Analyzer, AnalyzerExecutionError, Compilation};
use fixloop_types::diagnostic::{Diagnostic, DiagnosticDescriptor, Location, Severity, Span};

/// Lines longer than `max` characters. Report-only: there is no fixer, so
/// these always end up unfixable.
pub struct LineLength {
    pub max: usize,
}

impl Default for LineLength {
    fn default() -> Self {
        Self { max: 100 }
    }
}

impl LineLength {
    pub const ID: &'static str = "TXT1004";
    const TITLE: &'static str = "Line too long";

    pub const META: RuleMeta = RuleMeta {
        id: Self::ID,
        title: Self::TITLE,
        severity: Severity::Info,
        source: RuleSource::Analyzer,
        fixable: false,
        fix_all: false,
        description: "A line is longer than 100 characters.",
        remediation: "Wrap the line by hand, or mark it with fixloop:allow(TXT1004).",
    };
}

impl Analyzer for LineLength {
    fn name(&self) -> &str {
        "line-length"
    }

    fn supported_descriptors(&self) -> Vec<DiagnosticDescriptor> {
        vec![DiagnosticDescriptor::new(Self::ID, Self::TITLE, Severity::Info)]
    }

    fn analyze(&self, compilation: &Compilation) -> Result<Vec<Diagnostic>, AnalyzerExecutionError> {
        let mut out = Vec::new();
        for unit in &compilation.units {
            for (start, line) in lines(unit.text()) {
                let Some((cut, _)) = line.char_indices().nth(self.max) else {
                    continue;
                };
                let mut d = Diagnostic::new(
                    Self::ID,
                    Severity::Info,
                    Location::new(
                        unit.path().to_path_buf(),
                        Span::new(start + cut, start + line.len()),
                    ),
                    format!("line is {} characters long (max {})", line.chars().count(), self.max),
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
