//! Embeddable core library for fixloop.
//!
//! Provides a clap-free, I/O-abstracted entry point suitable for linking
//! into an editor host, a CI job or the `fixloop` binary.
//!
//! # Port traits
//!
//! All I/O is abstracted behind port traits in [`ports`]:
//! - [`SolutionSource`](ports::SolutionSource) loads the solution snapshot
//! - [`WritePort`](ports::WritePort) writes files and creates directories
//!
//! The [`adapters`] module provides default filesystem-backed implementations.
//!
//! # Entry points
//!
//! - [`run_fix`](pipeline::run_fix) converges a solution and builds the report
//! - [`write_solution`](pipeline::write_solution) persists the fixed units
//! - [`write_fix_artifacts`](pipeline::write_fix_artifacts) writes report and patch

pub mod adapters;
pub mod pipeline;
pub mod ports;
pub mod settings;

// Re-export the engine surface so embedders don't need fixloop-domain directly.
pub use fixloop_domain::{CancellationToken, FixOptions, FixReporter, ProjectFilter};
