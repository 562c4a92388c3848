//! Edit engine for fixloop snapshots.
//!
//! Responsibilities:
//! - Apply one `EditOperation` to a project, producing a new project.
//! - Compare two solution snapshots (changed units, sha256 fingerprints).
//! - Render a unified diff preview between snapshots.

mod error;

pub use error::{EditError, EditResult};

use camino::{Utf8Path, Utf8PathBuf};
use diffy::PatchFormatter;
use fixloop_types::diagnostic::Span;
use fixloop_types::ops::{EditOperation, UnitEdit};
use fixloop_types::solution::{CompilationUnit, Project, Solution};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Apply a single atomic operation. On error nothing is applied.
pub fn apply_operation(project: &Project, op: &EditOperation) -> EditResult<Project> {
    match op {
        EditOperation::ApplyEdits { edits } => apply_unit_edits(project, edits),
        EditOperation::AddUnit { path, text } => {
            if project.unit(path).is_some() {
                return Err(EditError::UnitExists { path: path.clone() });
            }
            debug!(project = %project.id(), unit = %path, "add unit");
            Ok(project.with_unit(CompilationUnit::new(path.clone(), text.as_str())))
        }
        EditOperation::RemoveUnit { path } => {
            if project.unit(path).is_none() {
                return Err(EditError::UnknownUnit { path: path.clone() });
            }
            debug!(project = %project.id(), unit = %path, "remove unit");
            Ok(project.without_unit(path))
        }
    }
}

fn apply_unit_edits(project: &Project, edits: &[UnitEdit]) -> EditResult<Project> {
    if edits.is_empty() {
        return Err(EditError::Empty);
    }

    let mut by_unit: BTreeMap<&Utf8Path, Vec<&UnitEdit>> = BTreeMap::new();
    for edit in edits {
        by_unit.entry(edit.unit.as_path()).or_default().push(edit);
    }

    // Validate every unit first so a failure leaves nothing half-applied.
    let mut rewritten = Vec::with_capacity(by_unit.len());
    for (path, unit_edits) in by_unit {
        let unit = project.unit(path).ok_or_else(|| EditError::UnknownUnit {
            path: path.to_path_buf(),
        })?;
        let text = apply_text_edits(path, unit.text(), &unit_edits)?;
        rewritten.push(unit.with_text(text));
    }

    let mut next = project.clone();
    for unit in rewritten {
        debug!(project = %project.id(), unit = %unit.path(), "rewrite unit");
        next = next.with_unit(unit);
    }
    Ok(next)
}

/// Apply non-overlapping edits to `text`. Offsets refer to the original text.
pub fn apply_text_edits(unit: &Utf8Path, text: &str, edits: &[&UnitEdit]) -> EditResult<String> {
    let mut sorted: Vec<&UnitEdit> = edits.to_vec();
    sorted.sort_by_key(|e| (e.span.start, e.span.end));

    for e in &sorted {
        check_span(unit, text, e.span)?;
    }
    for pair in sorted.windows(2) {
        if pair[0].span.overlaps(&pair[1].span) {
            return Err(EditError::OverlappingEdits {
                unit: unit.to_path_buf(),
                first: pair[0].span,
                second: pair[1].span,
            });
        }
    }

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for e in sorted {
        out.push_str(&text[cursor..e.span.start]);
        out.push_str(&e.new_text);
        cursor = e.span.end;
    }
    out.push_str(&text[cursor..]);
    Ok(out)
}

fn check_span(unit: &Utf8Path, text: &str, span: Span) -> EditResult<()> {
    if span.start > span.end || span.end > text.len() {
        return Err(EditError::SpanOutOfBounds {
            unit: unit.to_path_buf(),
            span,
            len: text.len(),
        });
    }
    for offset in [span.start, span.end] {
        if !text.is_char_boundary(offset) {
            return Err(EditError::NotCharBoundary {
                unit: unit.to_path_buf(),
                offset,
            });
        }
    }
    Ok(())
}

/// A unit whose text differs between two snapshots. `None` means absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitChange {
    pub path: Utf8PathBuf,
    pub before: Option<String>,
    pub after: Option<String>,
}

/// Units that were added, removed or rewritten between `before` and `after`,
/// sorted by path.
pub fn changed_units(before: &Solution, after: &Solution) -> Vec<UnitChange> {
    let old = unit_texts(before);
    let new = unit_texts(after);

    let paths: BTreeSet<&Utf8PathBuf> = old.keys().chain(new.keys()).collect();
    let mut out = Vec::new();
    for path in paths {
        let b = old.get(path);
        let a = new.get(path);
        if b == a {
            continue;
        }
        out.push(UnitChange {
            path: path.clone(),
            before: b.map(|s| s.to_string()),
            after: a.map(|s| s.to_string()),
        });
    }
    out
}

fn unit_texts(solution: &Solution) -> BTreeMap<Utf8PathBuf, &str> {
    solution
        .projects()
        .flat_map(|p| p.units())
        .map(|u| (u.path().to_path_buf(), u.text()))
        .collect()
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Unified diff of every unit that changed between two snapshots.
pub fn render_patch(before: &Solution, after: &Solution) -> String {
    let mut out = String::new();
    let formatter = PatchFormatter::new();

    for change in changed_units(before, after) {
        let old = change.before.as_deref().unwrap_or("");
        let new = change.after.as_deref().unwrap_or("");

        out.push_str(&format!("diff --git a/{0} b/{0}\n", change.path));
        match (&change.before, &change.after) {
            (None, Some(_)) => out.push_str(&format!("--- /dev/null\n+++ b/{}\n", change.path)),
            (Some(_), None) => out.push_str(&format!("--- a/{}\n+++ /dev/null\n", change.path)),
            _ => out.push_str(&format!("--- a/{0}\n+++ b/{0}\n", change.path)),
        }

        let patch = diffy::create_patch(old, new);
        let body = formatter.fmt_patch(&patch).to_string();
        // diffy repeats its own ---/+++ header; keep only the hunks.
        for line in body.lines().skip_while(|l| !l.starts_with("@@")) {
            out.push_str(line);
            out.push('\n');
        }
    }

    out
}
