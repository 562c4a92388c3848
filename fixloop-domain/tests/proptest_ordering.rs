//! Property-based tests for scheduling order and termination in fixloop-domain.
//!
//! These tests verify that:
//! - Descriptor priority does not depend on the order diagnostics arrive in
//! - Higher counts always run first, fewer fixers break ties
//! - Descriptor passes finish within ceil(n / batch) batches
//! - Project passes never exceed the iteration cap

use fixloop_domain::{
    Analyzer, AnalyzerExecutionError, CapabilityRegistry, CodeFixer, Compilation, Compiler,
    FixOptions, Fixer, fix_priority,
};
use fixloop_types::diagnostic::{Diagnostic, DiagnosticDescriptor, Location, Severity, Span};
use fixloop_types::ops::{CodeAction, EditOperation, FixProposal, UnitEdit};
use fixloop_types::result::FixResult;
use fixloop_types::solution::{CompilationUnit, Project, ProjectId, Solution};
use proptest::prelude::*;
use std::sync::Arc;

struct Clean;

impl Compiler for Clean {
    fn compile(&self, project: &Project, _: &Solution) -> anyhow::Result<Compilation> {
        Ok(Compilation::clean(project))
    }
}

struct CharAnalyzer(&'static str, char);

impl Analyzer for CharAnalyzer {
    fn name(&self) -> &str {
        self.0
    }

    fn supported_descriptors(&self) -> Vec<DiagnosticDescriptor> {
        vec![DiagnosticDescriptor::new(self.0, self.0, Severity::Warning)]
    }

    fn analyze(&self, compilation: &Compilation) -> Result<Vec<Diagnostic>, AnalyzerExecutionError> {
        let mut out = Vec::new();
        for unit in &compilation.units {
            for (at, _) in unit.text().match_indices(self.1) {
                out.push(Diagnostic::new(
                    self.0,
                    Severity::Warning,
                    Location::new(unit.path().to_path_buf(), Span::new(at, at + 1)),
                    "found",
                ));
            }
        }
        Ok(out)
    }
}

/// Replaces every diagnostic in the batch with `to`.
struct ReplaceAll(&'static str, char);

impl Fixer for ReplaceAll {
    fn name(&self) -> &str {
        self.0
    }

    fn fixable_ids(&self) -> Vec<String> {
        vec![self.0.to_string()]
    }

    fn supports_fix_all(&self) -> bool {
        true
    }

    fn propose_fix(&self, batch: &[Diagnostic], _: &Project) -> anyhow::Result<FixProposal> {
        let edits = batch
            .iter()
            .map(|d| UnitEdit::replace(d.location.unit.clone(), d.location.span, self.1.to_string()))
            .collect();
        Ok(FixProposal::Edit(CodeAction::new(
            "replace",
            EditOperation::ApplyEdits { edits },
        )))
    }
}

fn arb_ids() -> impl Strategy<Value = Vec<(String, usize)>> {
    prop::collection::vec(("[A-E]", 1usize..4), 1..12)
}

fn diagnostics_for(ids: &[(String, usize)]) -> Vec<Diagnostic> {
    ids.iter()
        .enumerate()
        .map(|(at, (id, _))| {
            Diagnostic::new(
                id.clone(),
                Severity::Warning,
                Location::new("u.txt", Span::new(at, at + 1)),
                "m",
            )
        })
        .collect()
}

fn fixers_for(id: &str) -> usize {
    (id.as_bytes()[0] - b'A') as usize % 3 + 1
}

proptest! {
    /// Reversing the input does not change the schedule.
    #[test]
    fn priority_ignores_input_order(ids in arb_ids()) {
        let diagnostics = diagnostics_for(&ids);
        let mut reversed = diagnostics.clone();
        reversed.reverse();

        prop_assert_eq!(
            fix_priority(&diagnostics, fixers_for),
            fix_priority(&reversed, fixers_for)
        );
    }

    /// Each scheduled entry outranks the next by count, then fixer count, then id.
    #[test]
    fn priority_is_a_total_order(ids in arb_ids()) {
        let order = fix_priority(&diagnostics_for(&ids), fixers_for);
        for pair in order.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            prop_assert!(
                a.count > b.count
                    || (a.count == b.count && a.fixers < b.fixers)
                    || (a.count == b.count && a.fixers == b.fixers && a.id < b.id)
            );
        }
        let total: usize = order.iter().map(|p| p.count).sum();
        prop_assert_eq!(total, ids.len());
    }

    /// A fix-all fixer needs exactly ceil(n / batch) batches.
    #[test]
    fn descriptor_pass_terminates_within_batch_bound(n in 1usize..24, batch_size in 0usize..6) {
        let analyzers: Vec<Arc<dyn Analyzer>> = vec![Arc::new(CharAnalyzer("D1", 'x'))];
        let fixers: Vec<Arc<dyn Fixer>> = vec![Arc::new(ReplaceAll("D1", '_'))];
        let options = FixOptions { batch_size, ..FixOptions::default() };
        let registry = CapabilityRegistry::build(&analyzers, &fixers, &options).ok().unwrap();
        let engine = CodeFixer::new(Arc::new(Clean), analyzers, fixers, options);

        let project = Project::new("p", "p")
            .with_unit(CompilationUnit::new("p/u.txt", "x".repeat(n)));
        let mut solution = Solution::new(vec![project]).unwrap();
        let descriptor = DiagnosticDescriptor::new("D1", "D1", Severity::Warning);

        let pass = engine
            .fix_descriptor(&mut solution, &ProjectId::new("p"), &registry, &descriptor)
            .unwrap();

        let expected = if batch_size == 0 { 1 } else { n.div_ceil(batch_size) };
        prop_assert_eq!(pass.result, FixResult::Success);
        prop_assert_eq!(pass.batches, expected);
        prop_assert_eq!(pass.fixed.len(), n);
    }

    /// Alternating fixers never run past the cap.
    #[test]
    fn project_pass_respects_iteration_cap(cap in 0usize..8) {
        let engine = CodeFixer::new(
            Arc::new(Clean),
            vec![Arc::new(CharAnalyzer("A", 'a')), Arc::new(CharAnalyzer("B", 'b'))],
            vec![Arc::new(ReplaceAll("A", 'b')), Arc::new(ReplaceAll("B", 'a'))],
            FixOptions { max_iterations: cap, ..FixOptions::default() },
        );

        let project = Project::new("p", "p").with_unit(CompilationUnit::new("p/u.txt", "a"));
        let mut solution = Solution::new(vec![project]).unwrap();
        let result = engine.fix_project(&mut solution, &ProjectId::new("p"));

        prop_assert!(result.iterations <= cap);
        prop_assert!(result.iterations <= 3);
    }
}
