use crate::descriptor_loop::DescriptorPass;
use crate::engine::CodeFixer;
use crate::error::FixError;
use crate::ports::{Analyzer, Compilation, DescriptorReport, ProjectReport};
use crate::registry::CapabilityRegistry;
use fixloop_types::diagnostic::{Diagnostic, deep_contains, deep_equal_sets, sort_diagnostics};
use fixloop_types::result::{FixResult, LoopEvidence, ProjectFixKind, ProjectFixResult};
use fixloop_types::solution::{ProjectId, Solution};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

const ERROR_PREVIEW: usize = 10;
const ERROR_COUNT_CAP: usize = 1000;

/// Scheduling key for one descriptor within a project iteration.
///
/// Higher occurrence counts run first; ties go to the id with fewer fixers,
/// then to the smaller id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixPriority {
    pub id: String,
    pub count: usize,
    pub fixers: usize,
}

impl Ord for FixPriority {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .count
            .cmp(&self.count)
            .then(self.fixers.cmp(&other.fixers))
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for FixPriority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Distinct ids in `diagnostics`, in the order they should be fixed.
pub fn fix_priority(
    diagnostics: &[Diagnostic],
    fixer_count: impl Fn(&str) -> usize,
) -> Vec<FixPriority> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for d in diagnostics {
        *counts.entry(d.id.as_str()).or_insert(0) += 1;
    }

    let mut order: Vec<FixPriority> = counts
        .into_iter()
        .map(|(id, count)| FixPriority {
            id: id.to_string(),
            count,
            fixers: fixer_count(id),
        })
        .collect();
    order.sort();
    order
}

impl CodeFixer {
    /// Fix one project until nothing fixable changes, a cycle shows up, or
    /// the iteration cap is reached.
    ///
    /// Cancellation and host failures end the pass as `Canceled` and
    /// `HostError`; whatever was fixed before that stays in the result.
    pub fn fix_project(&self, solution: &mut Solution, id: &ProjectId) -> ProjectFixResult {
        let registry =
            match CapabilityRegistry::build(&self.analyzers, &self.fixers, &self.options) {
                Ok(registry) => registry,
                Err(kind) => {
                    info!(project = %id, kind = kind.as_str(), "nothing to fix");
                    let result = ProjectFixResult::new(id.clone(), kind);
                    self.report_project(&result);
                    return result;
                }
            };

        let mut result = ProjectFixResult::new(id.clone(), ProjectFixKind::Success);
        match self.drive_project(solution, id, &registry, &mut result) {
            Ok(()) => {}
            Err(FixError::Canceled) => {
                info!(project = %id, fixed = result.fixed.len(), "project pass canceled");
                result.kind = ProjectFixKind::Canceled;
            }
            Err(err) => {
                warn!(project = %id, error = %err, "project pass aborted");
                result.kind = ProjectFixKind::HostError;
                result.error = Some(err.to_string());
            }
        }
        self.finish(result)
    }

    fn drive_project(
        &self,
        solution: &mut Solution,
        id: &ProjectId,
        registry: &CapabilityRegistry,
        result: &mut ProjectFixResult,
    ) -> Result<(), FixError> {
        let mut previous: Vec<Diagnostic> = Vec::new();
        let mut before_previous: Vec<Diagnostic> = Vec::new();

        loop {
            if result.iterations >= self.options.max_iterations {
                debug!(project = %id, iterations = result.iterations, "iteration cap reached");
                break;
            }
            self.check_canceled()?;

            let compilation = self.compile(solution, id)?;
            let errors = self.options.blocking_errors(&compilation);
            if !errors.is_empty() {
                log_compiler_errors(id, &errors);
                result.kind = ProjectFixKind::CompilerError;
                return Ok(());
            }

            result.iterations += 1;
            let current = self.fixable_diagnostics(registry, &compilation);
            if current.is_empty() {
                break;
            }
            if deep_equal_sets(&current, &previous) {
                debug!(project = %id, remaining = current.len(), "no further progress");
                break;
            }
            if deep_equal_sets(&current, &before_previous) {
                warn!(
                    project = %id,
                    iteration = result.iterations,
                    "fixers keep alternating between two diagnostic sets"
                );
                result.kind = ProjectFixKind::InfiniteLoop;
                result.infinite_loop = Some(LoopEvidence {
                    current,
                    previous,
                });
                return Ok(());
            }

            let order = fix_priority(&current, |d| registry.fixers_for(d).len());
            debug!(
                project = %id,
                iteration = result.iterations,
                diagnostics = current.len(),
                descriptors = order.len(),
                "project iteration"
            );

            for entry in &order {
                let severity = current
                    .iter()
                    .find(|d| d.id == entry.id)
                    .map(|d| d.severity)
                    .unwrap_or_default();
                let descriptor = registry.descriptor(&entry.id, severity);
                let mut pass = DescriptorPass::default();
                let driven =
                    self.drive_descriptor(solution, id, registry, &descriptor, &mut pass);

                self.reporter.descriptor_fixed(&DescriptorReport {
                    project: id.clone(),
                    id: descriptor.id.clone(),
                    title: descriptor.title.clone(),
                    result: pass.result,
                    fixed: pass.fixed.len(),
                    remaining: pass.remaining,
                });
                result.fixed.extend(pass.fixed);
                driven?;

                if pass.result == FixResult::CompilerError {
                    warn!(project = %id, id = %entry.id, "fix introduced compiler errors");
                    result.kind = ProjectFixKind::CompilerError;
                    return Ok(());
                }
            }

            before_previous = std::mem::replace(&mut previous, current);
        }

        self.final_pass(solution, id, registry, result)
    }

    /// Everything still reported after convergence, minus what was fixed.
    fn final_pass(
        &self,
        solution: &Solution,
        id: &ProjectId,
        registry: &CapabilityRegistry,
        result: &mut ProjectFixResult,
    ) -> Result<(), FixError> {
        let compilation = self.compile(solution, id)?;

        let mut remaining: Vec<Diagnostic> = self
            .run_analyzers(registry.accepted_analyzers(), &compilation)
            .into_iter()
            .filter(|d| self.options.accepts_id(&d.id) && self.options.passes_filters(d))
            .collect();
        remaining.extend(
            compilation
                .diagnostics
                .iter()
                .filter(|d| {
                    self.options.accepts_id(&d.id)
                        && !self.options.is_ignored_compiler_id(&d.id)
                        && self.options.passes_filters(d)
                })
                .cloned(),
        );
        sort_diagnostics(&mut remaining);

        for d in remaining {
            if deep_contains(&result.fixed, &d) {
                continue;
            }
            if registry.has_fixer(&d.id) {
                result.unfixed.push(d);
            } else {
                result.unfixable.push(d);
            }
        }
        Ok(())
    }

    fn fixable_diagnostics(
        &self,
        registry: &CapabilityRegistry,
        compilation: &Compilation,
    ) -> Vec<Diagnostic> {
        let mut out: Vec<Diagnostic> = self
            .run_analyzers(registry.fixable_analyzers(), compilation)
            .into_iter()
            .filter(|d| {
                registry.has_analyzer(&d.id)
                    && registry.has_fixer(&d.id)
                    && self.options.passes_filters(d)
            })
            .collect();

        out.extend(
            compilation
                .diagnostics
                .iter()
                .filter(|d| {
                    registry.has_fixer(&d.id)
                        && !self.options.is_ignored_compiler_id(&d.id)
                        && self.options.passes_filters(d)
                })
                .cloned(),
        );
        sort_diagnostics(&mut out);
        out
    }

    /// Run analyzers, merging output in declaration order. A failing analyzer
    /// contributes nothing.
    pub(crate) fn run_analyzers(
        &self,
        analyzers: &[Arc<dyn Analyzer>],
        compilation: &Compilation,
    ) -> Vec<Diagnostic> {
        let run = |analyzer: &Arc<dyn Analyzer>| match analyzer.analyze(compilation) {
            Ok(diagnostics) => diagnostics,
            Err(err) => {
                warn!(analyzer = analyzer.name(), error = %err, "analyzer failed");
                Vec::new()
            }
        };

        let outputs: Vec<Vec<Diagnostic>> = if self.options.concurrent_analysis {
            analyzers.par_iter().map(run).collect()
        } else {
            analyzers.iter().map(run).collect()
        };
        outputs.into_iter().flatten().collect()
    }

    fn finish(&self, mut result: ProjectFixResult) -> ProjectFixResult {
        sort_diagnostics(&mut result.fixed);
        self.report_project(&result);
        result
    }

    fn report_project(&self, result: &ProjectFixResult) {
        info!(
            project = %result.project,
            kind = result.kind.as_str(),
            iterations = result.iterations,
            fixed = result.fixed.len(),
            unfixed = result.unfixed.len(),
            unfixable = result.unfixable.len(),
            "project done"
        );
        self.reporter.project_fixed(&ProjectReport {
            project: result.project.clone(),
            kind: result.kind,
            iterations: result.iterations,
            fixed: result.fixed.len(),
            unfixed: result.unfixed.len(),
            unfixable: result.unfixable.len(),
        });
    }
}

fn log_compiler_errors(project: &ProjectId, errors: &[&Diagnostic]) {
    for d in errors.iter().take(ERROR_PREVIEW) {
        warn!(project = %project, id = %d.id, location = %d.location, "{}", d.message);
    }
    if errors.len() > ERROR_PREVIEW {
        let more = (errors.len() - ERROR_PREVIEW).min(ERROR_COUNT_CAP);
        warn!(project = %project, "+{more} more compiler errors");
    }
}
