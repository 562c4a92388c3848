//! The solution-level orchestrator and the shared engine state.

use crate::error::FixError;
use crate::options::FixOptions;
use crate::ports::{
    Analyzer, CancellationToken, Compilation, Compiler, DecliningResolver, FixReporter, Fixer,
    NullReporter, Resolver,
};
use anyhow::Context;
use fixloop_types::result::{ProjectFixKind, ProjectOutcome, SolutionFixResult, SolutionStatus};
use fixloop_types::solution::{Project, ProjectId, Solution};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Drives analyzers and fixers to a fixed point over a solution.
pub struct CodeFixer {
    pub(crate) compiler: Arc<dyn Compiler>,
    pub(crate) analyzers: Vec<Arc<dyn Analyzer>>,
    pub(crate) fixers: Vec<Arc<dyn Fixer>>,
    pub(crate) options: FixOptions,
    pub(crate) resolver: Arc<dyn Resolver>,
    pub(crate) reporter: Arc<dyn FixReporter>,
    pub(crate) cancel: CancellationToken,
}

/// Results plus the snapshot the run ended on.
pub struct SolutionFixOutcome {
    pub result: SolutionFixResult,
    pub solution: Solution,
}

impl CodeFixer {
    pub fn new(
        compiler: Arc<dyn Compiler>,
        analyzers: Vec<Arc<dyn Analyzer>>,
        fixers: Vec<Arc<dyn Fixer>>,
        options: FixOptions,
    ) -> Self {
        Self {
            compiler,
            analyzers,
            fixers,
            options,
            resolver: Arc::new(DecliningResolver),
            reporter: Arc::new(NullReporter),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn FixReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn options(&self) -> &FixOptions {
        &self.options
    }

    /// Fix every project accepted by `include`, in dependency order.
    ///
    /// A project ending in `CompilerError` or `HostError` stops the run; later
    /// projects are not recorded. Cancellation keeps every result and edit
    /// made so far, including the partial result of the interrupted project.
    pub fn fix_solution(
        &self,
        solution: Solution,
        include: impl Fn(&Project) -> bool,
    ) -> Result<SolutionFixOutcome, FixError> {
        let order = solution.topological_order()?;
        let mut current = solution;
        let mut result = SolutionFixResult::default();

        info!(projects = order.len(), "fixing solution");

        for id in order {
            if self.cancel.is_canceled() {
                result.status = SolutionStatus::Canceled;
                break;
            }

            let included = current.project(&id).map(&include).unwrap_or(false);
            if !included {
                debug!(project = %id, "skip project");
                self.reporter.project_skipped(&id);
                result.projects.push(ProjectOutcome::Skipped { project: id });
                continue;
            }

            let project_result = self.fix_project(&mut current, &id);
            let kind = project_result.kind;
            result.projects.push(ProjectOutcome::Fixed(project_result));
            let stop = match kind {
                ProjectFixKind::CompilerError => SolutionStatus::CompilerError,
                ProjectFixKind::Canceled => SolutionStatus::Canceled,
                ProjectFixKind::HostError => SolutionStatus::HostError,
                _ => continue,
            };
            warn!(project = %id, status = stop.as_str(), "stopping solution pass");
            result.status = stop;
            break;
        }

        Ok(SolutionFixOutcome {
            result,
            solution: current,
        })
    }

    pub(crate) fn check_canceled(&self) -> Result<(), FixError> {
        if self.cancel.is_canceled() {
            Err(FixError::Canceled)
        } else {
            Ok(())
        }
    }

    /// Compile the latest snapshot of `id`.
    pub(crate) fn compile(&self, solution: &Solution, id: &ProjectId) -> Result<Compilation, FixError> {
        let project = current_project(solution, id)?;
        let compilation = self
            .compiler
            .compile(project, solution)
            .with_context(|| format!("compile project {id}"))?;
        Ok(compilation)
    }
}

pub(crate) fn current_project<'a>(solution: &'a Solution, id: &ProjectId) -> Result<&'a Project, FixError> {
    solution
        .project(id)
        .ok_or_else(|| FixError::Host(anyhow::anyhow!("project {id} vanished from the solution")))
}
