//! Shared value types for the fixloop workspace.
//!
//! # Design constraints
//! - Diagnostics are compared by deep equality (id, severity, location), never identity.
//! - Snapshots are immutable; edits produce new values.
//! - Report types are serialized to disk. Prefer adding optional fields over changing semantics.

pub mod diagnostic;
pub mod ops;
pub mod report;
pub mod result;
pub mod solution;

/// Schema identifiers.
pub mod schema {
    pub const FIXLOOP_REPORT_V1: &str = "fixloop.report.v1";
}
