use crate::{RuleMeta, RuleSource, lines};
use fixloop_domain::{Compilation, Compiler};
use fixloop_types::diagnostic::{Diagnostic, Location, Severity, Span};
use fixloop_types::solution::{Project, Solution};
use tracing::debug;

/// Treats every unit as plain text. The only thing that "fails to compile" is
/// an unresolved merge conflict.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCompiler;

impl TextCompiler {
    pub const CONFLICT_MARKER: &'static str = "TXT0001";

    pub const META: RuleMeta = RuleMeta {
        id: Self::CONFLICT_MARKER,
        title: "Unresolved merge conflict marker",
        severity: Severity::Error,
        source: RuleSource::Compiler,
        fixable: false,
        fix_all: false,
        description: "A line starts with a git merge conflict marker (<<<<<<<, ======= or >>>>>>>). \
                      The unit is treated as broken and the project is not fixed.",
        remediation: "Resolve the conflict by hand, or pass --ignore-compiler-errors to fix around it.",
    };

    fn is_marker(line: &str) -> bool {
        line.starts_with("<<<<<<< ")
            || line == "<<<<<<<"
            || line == "======="
            || line.starts_with(">>>>>>> ")
            || line == ">>>>>>>"
    }
}

impl Compiler for TextCompiler {
    fn compile(&self, project: &Project, _solution: &Solution) -> anyhow::Result<Compilation> {
        let mut compilation = Compilation::clean(project);
        for unit in project.units() {
            for (start, line) in lines(unit.text()) {
                if Self::is_marker(line) {
                    compilation.diagnostics.push(Diagnostic::new(
                        Self::CONFLICT_MARKER,
                        Severity::Error,
                        Location::new(unit.path().to_path_buf(), Span::new(start, start + line.len())),
                        "unresolved merge conflict marker",
                    ));
                }
            }
        }
        if !compilation.diagnostics.is_empty() {
            debug!(
                project = %project.id(),
                markers = compilation.diagnostics.len(),
                "conflict markers found"
            );
        }
        Ok(compilation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixloop_types::solution::CompilationUnit;

    #[test]
    fn reports_conflict_markers_only() {
        let project = Project::new("p", "p").with_unit(CompilationUnit::new(
            "p/a.txt",
            "ok\n<<<<<<< HEAD\nmine\n=======\ntheirs\n>>>>>>> branch\n== not a marker\n",
        ));
        let solution = Solution::new(vec![project.clone()]).unwrap();
        let compilation = TextCompiler.compile(&project, &solution).unwrap();

        let spans: Vec<Span> = compilation
            .diagnostics
            .iter()
            .map(|d| d.location.span)
            .collect();
        assert_eq!(
            spans,
            vec![Span::new(3, 15), Span::new(21, 28), Span::new(36, 50)]
        );
        assert!(compilation.diagnostics.iter().all(|d| d.severity == Severity::Error));
    }
}
