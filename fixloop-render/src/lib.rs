//! Rendering helpers (markdown) for human-readable artifacts.

use fixloop_types::diagnostic::Diagnostic;
use fixloop_types::report::{FixloopReport, ReportStatus};
use fixloop_types::result::{ProjectFixResult, ProjectOutcome};
use std::collections::BTreeMap;

/// Diagnostics listed per bucket before the rest is rolled up.
const LIST_LIMIT: usize = 25;

pub fn render_report_md(report: &FixloopReport) -> String {
    let counts = &report.verdict.counts;
    let mut out = String::new();
    out.push_str("# fixloop report\n\n");
    out.push_str(&format!(
        "- Verdict: `{}`\n",
        verdict_label(report.verdict.status)
    ));
    out.push_str(&format!("- Run: `{}`\n", report.result.status.as_str()));
    out.push_str(&format!(
        "- Mode: {}\n",
        if report.run.applied { "applied" } else { "dry-run" }
    ));
    out.push_str(&format!(
        "- Projects: {} (skipped {})\n",
        counts.projects, counts.skipped
    ));
    out.push_str(&format!(
        "- Fixed: {}\n- Unfixed: {}\n- Unfixable: {}\n",
        counts.fixed, counts.unfixed, counts.unfixable
    ));
    out.push_str(&format!("- Units changed: {}\n", report.changed_units.len()));
    for reason in &report.verdict.reasons {
        out.push_str(&format!("- Reason: {}\n", reason));
    }
    out.push('\n');

    out.push_str("## Projects\n\n");
    if report.result.projects.is_empty() {
        out.push_str("_No projects processed._\n");
        return out;
    }

    for (i, outcome) in report.result.projects.iter().enumerate() {
        match outcome {
            ProjectOutcome::Skipped { project } => {
                out.push_str(&format!("### {}. {}\n\n- Skipped\n\n", i + 1, project));
            }
            ProjectOutcome::Fixed(result) => {
                out.push_str(&format!("### {}. {}\n\n", i + 1, result.project));
                render_project(&mut out, result);
            }
        }
    }

    if !report.changed_units.is_empty() {
        out.push_str("## Changed units\n\n");
        for unit in &report.changed_units {
            let before = unit.sha256_before.as_deref().map(short_hash).unwrap_or("-");
            let after = unit.sha256_after.as_deref().map(short_hash).unwrap_or("-");
            out.push_str(&format!("- `{}` {} → {}\n", unit.path, before, after));
        }
    }

    out
}

fn render_project(out: &mut String, result: &ProjectFixResult) {
    out.push_str(&format!("- Result: `{}`\n", result.kind.as_str()));
    out.push_str(&format!("- Iterations: {}\n", result.iterations));
    if let Some(error) = &result.error {
        out.push_str(&format!("- Error: {}\n", error));
    }

    if !result.fixed.is_empty() {
        out.push_str("\n**Fixed**\n\n");
        let mut by_id: BTreeMap<&str, usize> = BTreeMap::new();
        for d in &result.fixed {
            *by_id.entry(d.id.as_str()).or_insert(0) += 1;
        }
        for (id, n) in by_id {
            out.push_str(&format!("- `{}` × {}\n", id, n));
        }
    }

    render_bucket(out, "Unfixed", &result.unfixed);
    render_bucket(out, "Unfixable", &result.unfixable);

    if let Some(evidence) = &result.infinite_loop {
        out.push_str("\n**Alternating sets**\n\n");
        render_list(out, &evidence.current);
        out.push_str("\n_and_\n\n");
        render_list(out, &evidence.previous);
    }

    out.push('\n');
}

fn render_bucket(out: &mut String, title: &str, diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    out.push_str(&format!("\n**{}**\n\n", title));
    render_list(out, diagnostics);
}

fn render_list(out: &mut String, diagnostics: &[Diagnostic]) {
    for d in diagnostics.iter().take(LIST_LIMIT) {
        out.push_str(&format!(
            "- `{}` {} at `{}`: {}\n",
            d.id, d.severity, d.location, d.message
        ));
    }
    if diagnostics.len() > LIST_LIMIT {
        out.push_str(&format!(
            "- … {} more\n",
            diagnostics.len() - LIST_LIMIT
        ));
    }
}

fn verdict_label(s: ReportStatus) -> &'static str {
    match s {
        ReportStatus::Pass => "pass",
        ReportStatus::Warn => "warn",
        ReportStatus::Fail => "fail",
    }
}

fn short_hash(h: &str) -> &str {
    h.get(..12).unwrap_or(h)
}
