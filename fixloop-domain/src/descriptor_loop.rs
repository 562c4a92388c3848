//! Drives one diagnostic id to zero within a project, one batch at a time.

use crate::engine::{CodeFixer, current_project};
use crate::error::FixError;
use crate::ports::Compilation;
use crate::registry::{CapabilityRegistry, DescriptorSource};
use fixloop_edit::apply_operation;
use fixloop_types::diagnostic::{
    Diagnostic, DiagnosticDescriptor, deep_difference, deep_equal_sets, sort_diagnostics,
};
use fixloop_types::ops::FixProposal;
use fixloop_types::result::FixResult;
use fixloop_types::solution::{ProjectId, Solution};
use tracing::{debug, info, warn};

/// Outcome of one descriptor pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorPass {
    pub result: FixResult,
    pub fixed: Vec<Diagnostic>,

    /// Diagnostics of the id seen on the last recompilation.
    pub remaining: usize,

    /// Batches handed to a fixer.
    pub batches: usize,
}

impl Default for DescriptorPass {
    fn default() -> Self {
        Self {
            result: FixResult::Success,
            fixed: Vec::new(),
            remaining: 0,
            batches: 0,
        }
    }
}

impl CodeFixer {
    /// Fix all diagnostics of `descriptor` in the latest snapshot of `project`.
    ///
    /// Accepted edits are published to `solution` as they happen, so an error
    /// or cancellation never discards earlier batches.
    pub fn fix_descriptor(
        &self,
        solution: &mut Solution,
        project: &ProjectId,
        registry: &CapabilityRegistry,
        descriptor: &DiagnosticDescriptor,
    ) -> Result<DescriptorPass, FixError> {
        let mut pass = DescriptorPass::default();
        self.drive_descriptor(solution, project, registry, descriptor, &mut pass)?;
        Ok(pass)
    }

    /// Runs the batch loop, recording progress in `pass` as it goes. When this
    /// returns an error, `pass` still holds what was verified as fixed.
    pub(crate) fn drive_descriptor(
        &self,
        solution: &mut Solution,
        project: &ProjectId,
        registry: &CapabilityRegistry,
        descriptor: &DiagnosticDescriptor,
        pass: &mut DescriptorPass,
    ) -> Result<(), FixError> {
        let id = descriptor.id.as_str();
        let source = registry.source_for(descriptor);
        let batch_size = self.options.batch_size_for(id);

        let mut previous: Vec<Diagnostic> = Vec::new();
        let mut previous_batch: Vec<Diagnostic> = Vec::new();
        let mut last: Option<FixResult> = None;

        loop {
            if self.cancel.is_canceled() {
                // Account for the batch that already landed; start no new one.
                if !previous_batch.is_empty() {
                    let compilation = self.compile(solution, project)?;
                    let current = self.descriptor_diagnostics(&source, id, &compilation);
                    pass.remaining = current.len();
                    pass.fixed.extend(deep_difference(&previous_batch, &current));
                }
                return Err(FixError::Canceled);
            }

            let compilation = self.compile(solution, project)?;
            if !self.options.blocking_errors(&compilation).is_empty() {
                last = Some(FixResult::CompilerError);
                if previous.is_empty() {
                    break;
                }
            }

            let current = self.descriptor_diagnostics(&source, id, &compilation);
            pass.remaining = current.len();
            pass.fixed.extend(deep_difference(&previous_batch, &current));
            previous_batch.clear();

            match last {
                Some(FixResult::CompilerError) => break,
                Some(FixResult::Success) => {
                    if batch_size == 0 || previous.len() <= batch_size {
                        break;
                    }
                }
                Some(FixResult::PartiallyFixed) | None => {}
                Some(_) => {
                    if !previous.is_empty() {
                        break;
                    }
                }
            }

            if current.is_empty() {
                break;
            }
            if deep_equal_sets(&current, &previous) {
                debug!(project = %project, id, "diagnostics unchanged by last batch");
                break;
            }
            if pass.batches >= self.options.max_batches {
                warn!(
                    project = %project,
                    id,
                    batches = pass.batches,
                    "descriptor pass hit the batch cap"
                );
                break;
            }

            let batch: Vec<Diagnostic> = if batch_size > 0 && current.len() > batch_size {
                current[..batch_size].to_vec()
            } else {
                current.clone()
            };

            let result = self.apply_batch(solution, project, registry, id, &batch)?;
            pass.batches += 1;
            pass.result = result;
            debug!(
                project = %project,
                id,
                batch = batch.len(),
                result = result.as_str(),
                "applied batch"
            );

            previous_batch = batch;
            previous = current;
            last = Some(result);
        }

        pass.result = last.unwrap_or(FixResult::Success);
        Ok(())
    }

    fn descriptor_diagnostics(
        &self,
        source: &DescriptorSource,
        id: &str,
        compilation: &Compilation,
    ) -> Vec<Diagnostic> {
        let candidates = match source {
            DescriptorSource::Compiler => compilation.diagnostics.clone(),
            DescriptorSource::Analyzers(analyzers) => self.run_analyzers(analyzers, compilation),
        };

        let mut out: Vec<Diagnostic> = candidates
            .into_iter()
            .filter(|d| d.id == id && self.options.passes_filters(d))
            .collect();
        sort_diagnostics(&mut out);
        out
    }

    fn apply_batch(
        &self,
        solution: &mut Solution,
        project_id: &ProjectId,
        registry: &CapabilityRegistry,
        id: &str,
        batch: &[Diagnostic],
    ) -> Result<FixResult, FixError> {
        let candidates = registry.fixers_for(id);
        let fixer = match candidates {
            [] => return Ok(FixResult::NotFixed),
            [only] => only,
            many => {
                let names: Vec<&str> = many.iter().map(|f| f.name()).collect();
                match self
                    .resolver
                    .choose_fixer(id, &names)
                    .and_then(|i| many.get(i))
                {
                    Some(chosen) => chosen,
                    None => {
                        info!(id, fixers = ?names, "several fixers claim this id");
                        return Ok(FixResult::MultipleFixers);
                    }
                }
            }
        };

        let project = current_project(solution, project_id)?;
        let proposal = match fixer.propose_fix(batch, project) {
            Ok(proposal) => proposal,
            Err(err) => {
                warn!(fixer = fixer.name(), id, error = %format!("{err:#}"), "fixer failed");
                return Ok(FixResult::NotFixed);
            }
        };

        let action = match proposal {
            FixProposal::None => return Ok(FixResult::NotFixed),
            FixProposal::Edit(action) => action,
            FixProposal::Ambiguous(mut actions) => {
                if actions.len() <= 1 {
                    match actions.pop() {
                        Some(action) => action,
                        None => return Ok(FixResult::NotFixed),
                    }
                } else {
                    let choice = {
                        let keys: Vec<&str> = actions
                            .iter()
                            .map(|a| a.equivalence_key.as_deref().unwrap_or(&a.title))
                            .collect();
                        self.resolver.choose_action(id, &keys)
                    };
                    match choice {
                        Some(i) if i < actions.len() => actions.swap_remove(i),
                        _ => {
                            info!(id, actions = actions.len(), "fixer offered alternatives");
                            return Ok(FixResult::MultipleFixers);
                        }
                    }
                }
            }
        };

        let [operation] = action.operations.as_slice() else {
            warn!(
                fixer = fixer.name(),
                id,
                title = %action.title,
                operations = action.operations.len(),
                "code action left for manual inspection"
            );
            return Ok(FixResult::NotFixed);
        };

        let next = match apply_operation(project, operation) {
            Ok(next) => next,
            Err(err) => {
                warn!(fixer = fixer.name(), id, error = %err, "edit rejected");
                return Ok(FixResult::NotFixed);
            }
        };
        *solution = solution.with_project(next);

        if batch.len() == 1 || fixer.supports_fix_all() {
            Ok(FixResult::Success)
        } else {
            Ok(FixResult::PartiallyFixed)
        }
    }
}
