//! Outcome classifications produced by the fix loops.

use crate::diagnostic::Diagnostic;
use crate::solution::ProjectId;
use serde::{Deserialize, Serialize};

/// Terminal classification of one descriptor pass within a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixResult {
    Success,
    PartiallyFixed,
    NotFixed,
    CompilerError,
    MultipleFixers,
}

impl FixResult {
    pub fn as_str(self) -> &'static str {
        match self {
            FixResult::Success => "success",
            FixResult::PartiallyFixed => "partially_fixed",
            FixResult::NotFixed => "not_fixed",
            FixResult::CompilerError => "compiler_error",
            FixResult::MultipleFixers => "multiple_fixers",
        }
    }
}

/// Terminal classification of one project pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectFixKind {
    NoAnalyzers,
    NoFixers,
    NoFixableAnalyzers,
    CompilerError,
    InfiniteLoop,
    /// Canceled mid-pass. Edits applied before that are kept.
    Canceled,
    /// The host failed, e.g. the compiler could not read a unit.
    HostError,
    Success,
}

impl ProjectFixKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectFixKind::NoAnalyzers => "no_analyzers",
            ProjectFixKind::NoFixers => "no_fixers",
            ProjectFixKind::NoFixableAnalyzers => "no_fixable_analyzers",
            ProjectFixKind::CompilerError => "compiler_error",
            ProjectFixKind::InfiniteLoop => "infinite_loop",
            ProjectFixKind::Canceled => "canceled",
            ProjectFixKind::HostError => "host_error",
            ProjectFixKind::Success => "success",
        }
    }

    /// Outcomes that leave the project in a state worth a human look.
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            ProjectFixKind::CompilerError
                | ProjectFixKind::InfiniteLoop
                | ProjectFixKind::HostError
        )
    }
}

/// The two diagnostic sets a project kept alternating between.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopEvidence {
    pub current: Vec<Diagnostic>,
    pub previous: Vec<Diagnostic>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFixResult {
    pub project: ProjectId,
    pub kind: ProjectFixKind,

    /// Project-level iterations that ran analyzers.
    #[serde(default)]
    pub iterations: usize,

    #[serde(default)]
    pub fixed: Vec<Diagnostic>,

    /// A fixer exists but the diagnostic is still present.
    #[serde(default)]
    pub unfixed: Vec<Diagnostic>,

    /// No fixer exists for the diagnostic id.
    #[serde(default)]
    pub unfixable: Vec<Diagnostic>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infinite_loop: Option<LoopEvidence>,

    /// Host failure that ended the pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProjectFixResult {
    pub fn new(project: ProjectId, kind: ProjectFixKind) -> Self {
        Self {
            project,
            kind,
            iterations: 0,
            fixed: Vec::new(),
            unfixed: Vec::new(),
            unfixable: Vec::new(),
            infinite_loop: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProjectOutcome {
    Fixed(ProjectFixResult),
    Skipped { project: ProjectId },
}

impl ProjectOutcome {
    pub fn project(&self) -> &ProjectId {
        match self {
            ProjectOutcome::Fixed(r) => &r.project,
            ProjectOutcome::Skipped { project } => project,
        }
    }

    pub fn as_fixed(&self) -> Option<&ProjectFixResult> {
        match self {
            ProjectOutcome::Fixed(r) => Some(r),
            ProjectOutcome::Skipped { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolutionStatus {
    #[default]
    Completed,
    /// A project ended in `CompilerError`; later projects were not processed.
    CompilerError,
    Canceled,
    /// The host failed inside a project; later projects were not processed.
    HostError,
}

impl SolutionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SolutionStatus::Completed => "completed",
            SolutionStatus::CompilerError => "compiler_error",
            SolutionStatus::Canceled => "canceled",
            SolutionStatus::HostError => "host_error",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionFixResult {
    pub status: SolutionStatus,

    #[serde(default)]
    pub projects: Vec<ProjectOutcome>,
}

impl SolutionFixResult {
    pub fn fixed_results(&self) -> impl Iterator<Item = &ProjectFixResult> {
        self.projects.iter().filter_map(ProjectOutcome::as_fixed)
    }

    pub fn total_fixed(&self) -> usize {
        self.fixed_results().map(|r| r.fixed.len()).sum()
    }

    pub fn total_unfixed(&self) -> usize {
        self.fixed_results().map(|r| r.unfixed.len()).sum()
    }

    pub fn total_unfixable(&self) -> usize {
        self.fixed_results().map(|r| r.unfixable.len()).sum()
    }
}
