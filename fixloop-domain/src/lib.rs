//! Domain logic: drive analyzers and fixers over a solution until it reaches a
//! fixed point, a cycle, or the iteration cap.
//!
//! This crate owns *when* and *in which order* fixes run. It does not own how
//! edits are applied to text; that's the `fixloop-edit` crate.

mod descriptor_loop;
mod engine;
mod error;
mod options;
mod ports;
mod project_loop;
mod registry;

pub use descriptor_loop::DescriptorPass;
pub use engine::{CodeFixer, SolutionFixOutcome};
pub use error::FixError;
pub use options::{DEFAULT_MAX_BATCHES, DEFAULT_MAX_ITERATIONS, FixOptions, ProjectFilter, glob_match};
pub use ports::{
    Analyzer, AnalyzerExecutionError, CancellationToken, Compilation, Compiler,
    DecliningResolver, DescriptorReport, FixReporter, Fixer, NullReporter, PreferenceResolver,
    ProjectReport, RecordingReporter, ReportEvent, Resolver,
};
pub use project_loop::{FixPriority, fix_priority};
pub use registry::{CapabilityRegistry, DescriptorSource};
