//! Capabilities the engine consumes. Hosts implement these; the engine never
//! looks inside a compilation or a fix.

use fixloop_types::diagnostic::{Diagnostic, DiagnosticDescriptor};
use fixloop_types::ops::FixProposal;
use fixloop_types::solution::{CompilationUnit, Project, ProjectId, Solution};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Aggregate view of one project at one snapshot.
#[derive(Debug, Clone)]
pub struct Compilation {
    pub project: ProjectId,
    pub units: Vec<Arc<CompilationUnit>>,

    /// Diagnostics reported by the compiler itself.
    pub diagnostics: Vec<Diagnostic>,
}

impl Compilation {
    /// A compilation with no compiler diagnostics.
    pub fn clean(project: &Project) -> Self {
        Self {
            project: project.id().clone(),
            units: project.units().to_vec(),
            diagnostics: Vec::new(),
        }
    }
}

/// Recomputes a project's compilation.
///
/// An `Err` means the host could not compile at all (I/O, crashed tool), which
/// aborts the run. Broken source is reported through `Compilation::diagnostics`.
pub trait Compiler: Send + Sync {
    fn compile(&self, project: &Project, solution: &Solution) -> anyhow::Result<Compilation>;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("analyzer '{analyzer}' failed: {message}")]
pub struct AnalyzerExecutionError {
    pub analyzer: String,
    pub message: String,
}

impl AnalyzerExecutionError {
    pub fn new(analyzer: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            analyzer: analyzer.into(),
            message: message.into(),
        }
    }
}

/// Produces diagnostics from a compilation.
pub trait Analyzer: Send + Sync {
    fn name(&self) -> &str;

    fn supported_descriptors(&self) -> Vec<DiagnosticDescriptor>;

    fn analyze(&self, compilation: &Compilation) -> Result<Vec<Diagnostic>, AnalyzerExecutionError>;
}

/// Proposes an edit for a batch of same-id diagnostics.
pub trait Fixer: Send + Sync {
    fn name(&self) -> &str;

    fn fixable_ids(&self) -> Vec<String>;

    /// True if one proposal can resolve every diagnostic in a batch.
    fn supports_fix_all(&self) -> bool {
        false
    }

    fn propose_fix(&self, batch: &[Diagnostic], project: &Project) -> anyhow::Result<FixProposal>;
}

/// Settles choices the engine cannot make on its own.
pub trait Resolver: Send + Sync {
    /// Several fixers consume `id`. Return the index of the one to use, or decline.
    fn choose_fixer(&self, id: &str, fixers: &[&str]) -> Option<usize>;

    /// A fixer offered alternatives. `keys` are equivalence keys (titles when absent).
    fn choose_action(&self, id: &str, keys: &[&str]) -> Option<usize>;
}

/// Always declines; the engine then reports `MultipleFixers`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecliningResolver;

impl Resolver for DecliningResolver {
    fn choose_fixer(&self, _id: &str, _fixers: &[&str]) -> Option<usize> {
        None
    }

    fn choose_action(&self, _id: &str, _keys: &[&str]) -> Option<usize> {
        None
    }
}

/// Resolves from configured preferences: diagnostic id → fixer name, and
/// diagnostic id → action equivalence key.
#[derive(Debug, Clone, Default)]
pub struct PreferenceResolver {
    pub fixers: HashMap<String, String>,
    pub actions: HashMap<String, String>,
}

impl PreferenceResolver {
    pub fn new(fixers: HashMap<String, String>, actions: HashMap<String, String>) -> Self {
        Self { fixers, actions }
    }
}

impl Resolver for PreferenceResolver {
    fn choose_fixer(&self, id: &str, fixers: &[&str]) -> Option<usize> {
        let wanted = self.fixers.get(id)?;
        fixers.iter().position(|f| *f == wanted.as_str())
    }

    fn choose_action(&self, id: &str, keys: &[&str]) -> Option<usize> {
        let wanted = self.actions.get(id)?;
        keys.iter().position(|k| *k == wanted.as_str())
    }
}

/// Emitted after each descriptor pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorReport {
    pub project: ProjectId,
    pub id: String,
    pub title: String,
    pub result: fixloop_types::result::FixResult,
    pub fixed: usize,

    /// Diagnostics of this id still present when the pass ended.
    pub remaining: usize,
}

/// Emitted once per processed project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectReport {
    pub project: ProjectId,
    pub kind: fixloop_types::result::ProjectFixKind,
    pub iterations: usize,
    pub fixed: usize,
    pub unfixed: usize,
    pub unfixable: usize,
}

/// Sink for structured progress events. Formatting is the sink's business.
pub trait FixReporter: Send + Sync {
    fn descriptor_fixed(&self, _report: &DescriptorReport) {}

    fn project_fixed(&self, _report: &ProjectReport) {}

    fn project_skipped(&self, _project: &ProjectId) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl FixReporter for NullReporter {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    Descriptor(DescriptorReport),
    Project(ProjectReport),
    Skipped(ProjectId),
}

/// Keeps every event in memory. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    events: Arc<std::sync::Mutex<Vec<ReportEvent>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ReportEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    fn push(&self, event: ReportEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl FixReporter for RecordingReporter {
    fn descriptor_fixed(&self, report: &DescriptorReport) {
        self.push(ReportEvent::Descriptor(report.clone()));
    }

    fn project_fixed(&self, report: &ProjectReport) {
        self.push(ReportEvent::Project(report.clone()));
    }

    fn project_skipped(&self, project: &ProjectId) {
        self.push(ReportEvent::Skipped(project.clone()));
    }
}

/// Cooperative cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
