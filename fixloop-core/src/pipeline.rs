//! The fix pipeline, extracted from the CLI.
//!
//! `run_fix` is I/O-agnostic: the solution comes from a [`SolutionSource`] and
//! nothing is written until the caller hands the outcome to [`write_solution`]
//! or [`write_fix_artifacts`].

use crate::ports::{SolutionSource, WritePort};
use crate::settings::FixSettings;
use anyhow::Context;
use camino::Utf8Path;
use chrono::Utc;
use fixloop_domain::{
    Analyzer, CancellationToken, CodeFixer, Compiler, FixError, FixReporter, Fixer,
};
use fixloop_edit::{changed_units, render_patch, sha256_hex};
use fixloop_render::render_report_md;
use fixloop_types::report::{ChangedUnit, FixloopReport, ReportRunInfo, ReportToolInfo};
use fixloop_types::result::{SolutionFixResult, SolutionStatus};
use fixloop_types::solution::Solution;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

/// Error type for pipeline results. Exit code 1 = tool error.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("fix run canceled")]
    Canceled,
    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

impl From<FixError> for ToolError {
    fn from(err: FixError) -> Self {
        match err {
            FixError::Canceled => ToolError::Canceled,
            other => ToolError::Internal(anyhow::Error::new(other)),
        }
    }
}

/// The compiler, analyzers and fixers a run works with.
#[derive(Clone)]
pub struct Toolset {
    pub compiler: Arc<dyn Compiler>,
    pub analyzers: Vec<Arc<dyn Analyzer>>,
    pub fixers: Vec<Arc<dyn Fixer>>,
}

impl Toolset {
    /// The text hygiene rules shipped with fixloop.
    pub fn builtin() -> Self {
        Self {
            compiler: Arc::new(fixloop_rules::TextCompiler),
            analyzers: fixloop_rules::builtin_analyzers(),
            fixers: fixloop_rules::builtin_fixers(),
        }
    }
}

/// Outcome of `run_fix`.
pub struct FixOutcome {
    pub result: SolutionFixResult,
    pub report: FixloopReport,
    pub patch: String,

    pub before: Solution,
    pub solution: Solution,
}

impl FixOutcome {
    /// Whether the run left something a human has to look at.
    ///
    /// Failing projects and early stops always count; leftover diagnostics
    /// only count when `strict`.
    pub fn problems_remain(&self, strict: bool) -> bool {
        if self.result.status != SolutionStatus::Completed {
            return true;
        }
        if self.result.fixed_results().any(|r| r.kind.is_failure()) {
            return true;
        }
        strict && (self.result.total_unfixed() > 0 || self.result.total_unfixable() > 0)
    }

    pub fn has_changes(&self) -> bool {
        !self.report.changed_units.is_empty()
    }
}

pub fn tool_info() -> ReportToolInfo {
    ReportToolInfo {
        name: "fixloop".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

/// Run the fix pipeline: load, converge every selected project, report.
///
/// Cancellation is not an error here: the outcome carries a `Canceled`
/// status and every edit made before the token fired.
pub fn run_fix(
    settings: &FixSettings,
    source: &dyn SolutionSource,
    toolset: &Toolset,
    reporter: Arc<dyn FixReporter>,
    cancel: CancellationToken,
) -> Result<FixOutcome, ToolError> {
    let started_at = Utc::now();
    let clock = Instant::now();

    let before = source.load_solution().context("load solution")?;
    debug!(projects = before.projects().count(), "solution loaded");

    let engine = CodeFixer::new(
        toolset.compiler.clone(),
        toolset.analyzers.clone(),
        toolset.fixers.clone(),
        settings.options.clone(),
    )
    .with_resolver(Arc::new(settings.options.resolver()))
    .with_reporter(reporter)
    .with_cancellation(cancel);

    let filter = &settings.filter;
    let fixed = engine.fix_solution(before.clone(), |p| filter.matches(p))?;

    let patch = render_patch(&before, &fixed.solution);
    let changed: Vec<ChangedUnit> = changed_units(&before, &fixed.solution)
        .into_iter()
        .map(|c| ChangedUnit {
            path: c.path.to_string(),
            sha256_before: c.before.as_deref().map(|t| sha256_hex(t.as_bytes())),
            sha256_after: c.after.as_deref().map(|t| sha256_hex(t.as_bytes())),
        })
        .collect();

    let run = ReportRunInfo {
        started_at: started_at.to_rfc3339(),
        ended_at: Some(Utc::now().to_rfc3339()),
        duration_ms: Some(clock.elapsed().as_millis() as u64),
        applied: settings.apply && !changed.is_empty(),
    };
    let mut report = FixloopReport::new(tool_info(), run, fixed.result.clone());
    report.changed_units = changed;

    let options = serde_json::to_value(&settings.options).context("serialize options")?;
    report.data = Some(serde_json::json!({
        "run_id": Uuid::new_v4().to_string(),
        "options": options,
    }));

    info!(
        status = fixed.result.status.as_str(),
        fixed = fixed.result.total_fixed(),
        unfixed = fixed.result.total_unfixed(),
        unfixable = fixed.result.total_unfixable(),
        changed_units = report.changed_units.len(),
        "fix run finished"
    );

    Ok(FixOutcome {
        result: fixed.result,
        report,
        patch,
        before,
        solution: fixed.solution,
    })
}

/// Write every changed unit of `outcome` below `root`.
///
/// Returns the number of files touched.
pub fn write_solution(
    outcome: &FixOutcome,
    root: &Utf8Path,
    writer: &dyn WritePort,
) -> anyhow::Result<usize> {
    let changes = changed_units(&outcome.before, &outcome.solution);
    for change in &changes {
        let path = root.join(&change.path);
        match &change.after {
            Some(text) => writer.write_file(&path, text.as_bytes())?,
            None => writer.remove_file(&path)?,
        }
        debug!(path = %path, "unit written");
    }
    Ok(changes.len())
}

/// Write `report.json`, `report.md` and `patch.diff` to the output directory.
pub fn write_fix_artifacts(
    outcome: &FixOutcome,
    out_dir: &Utf8Path,
    writer: &dyn WritePort,
) -> anyhow::Result<()> {
    writer.create_dir_all(out_dir)?;

    let report_json =
        serde_json::to_string_pretty(&outcome.report).context("serialize report")?;
    writer.write_file(&out_dir.join("report.json"), report_json.as_bytes())?;

    let report_md = render_report_md(&outcome.report);
    writer.write_file(&out_dir.join("report.md"), report_md.as_bytes())?;

    writer.write_file(&out_dir.join("patch.diff"), outcome.patch.as_bytes())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemorySolutionSource;
    use fixloop_domain::{NullReporter, ProjectFilter};
    use fixloop_types::result::ProjectOutcome;
    use fixloop_types::solution::{CompilationUnit, Project, ProjectId};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct MemWriter {
        files: RefCell<BTreeMap<String, String>>,
        removed: RefCell<Vec<String>>,
    }

    impl WritePort for MemWriter {
        fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
            self.files.borrow_mut().insert(
                path.to_string(),
                String::from_utf8_lossy(contents).into_owned(),
            );
            Ok(())
        }

        fn create_dir_all(&self, _path: &Utf8Path) -> anyhow::Result<()> {
            Ok(())
        }

        fn remove_file(&self, path: &Utf8Path) -> anyhow::Result<()> {
            self.removed.borrow_mut().push(path.to_string());
            Ok(())
        }
    }

    fn source() -> InMemorySolutionSource {
        InMemorySolutionSource::new(
            Solution::new(vec![
                Project::new("a", "a")
                    .with_unit(CompilationUnit::new("a/x.txt", "one  \ntwo\n")),
                Project::new("b", "b").with_unit(CompilationUnit::new("b/y.txt", "clean\n")),
            ])
            .unwrap(),
        )
    }

    fn run(settings: &FixSettings) -> FixOutcome {
        run_fix(
            settings,
            &source(),
            &Toolset::builtin(),
            Arc::new(NullReporter),
            CancellationToken::new(),
        )
        .unwrap()
    }

    #[test]
    fn run_fix_reports_changed_units_and_patch() {
        let outcome = run(&FixSettings::default());

        assert_eq!(outcome.result.status, SolutionStatus::Completed);
        assert_eq!(outcome.result.total_fixed(), 1);
        assert_eq!(outcome.report.changed_units.len(), 1);
        let changed = &outcome.report.changed_units[0];
        assert_eq!(changed.path, "a/x.txt");
        assert_eq!(
            changed.sha256_after.as_deref(),
            Some(sha256_hex(b"one\ntwo\n").as_str())
        );
        assert!(outcome.patch.contains("-one  \n+one\n"));
        assert!(!outcome.report.run.applied);
        assert!(!outcome.problems_remain(true));

        let data = outcome.report.data.as_ref().unwrap();
        assert!(data["run_id"].as_str().is_some());
        assert_eq!(data["options"]["batch_size"], 0);
    }

    #[test]
    fn filtered_projects_are_skipped_and_untouched() {
        let settings = FixSettings {
            filter: ProjectFilter::new(Vec::new(), vec!["a".to_string()]),
            ..FixSettings::default()
        };
        let outcome = run(&settings);

        assert!(matches!(
            &outcome.result.projects[0],
            ProjectOutcome::Skipped { project } if project == &ProjectId::new("a")
        ));
        assert!(outcome.report.changed_units.is_empty());
        assert!(outcome.patch.is_empty());
    }

    #[test]
    fn write_solution_writes_only_changed_units() {
        let settings = FixSettings {
            apply: true,
            ..FixSettings::default()
        };
        let outcome = run(&settings);
        assert!(outcome.report.run.applied);

        let writer = MemWriter::default();
        let written = write_solution(&outcome, Utf8Path::new("/repo"), &writer).unwrap();
        assert_eq!(written, 1);
        assert_eq!(
            writer.files.borrow().get("/repo/a/x.txt").map(String::as_str),
            Some("one\ntwo\n")
        );
        assert!(writer.removed.borrow().is_empty());
    }

    #[test]
    fn artifacts_land_in_out_dir() {
        let outcome = run(&FixSettings::default());
        let writer = MemWriter::default();
        write_fix_artifacts(&outcome, Utf8Path::new("out"), &writer).unwrap();

        let files = writer.files.borrow();
        let names: Vec<&str> = files.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["out/patch.diff", "out/report.json", "out/report.md"]);

        let report: serde_json::Value = serde_json::from_str(&files["out/report.json"]).unwrap();
        assert_eq!(report["schema"], "fixloop.report.v1");
        assert_eq!(report["verdict"]["status"], "pass");
        assert!(files["out/report.md"].starts_with("# fixloop report"));
    }

    #[test]
    fn strict_counts_leftover_diagnostics() {
        let source = InMemorySolutionSource::new(
            Solution::new(vec![Project::new("p", "p").with_unit(CompilationUnit::new(
                "p/long.txt",
                format!("{}\n", "w".repeat(150)),
            ))])
            .unwrap(),
        );
        let outcome = run_fix(
            &FixSettings::default(),
            &source,
            &Toolset::builtin(),
            Arc::new(NullReporter),
            CancellationToken::new(),
        )
        .unwrap();

        assert_eq!(outcome.result.total_unfixable(), 1);
        assert!(!outcome.problems_remain(false));
        assert!(outcome.problems_remain(true));
    }

    #[test]
    fn canceled_token_yields_canceled_status() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = run_fix(
            &FixSettings::default(),
            &source(),
            &Toolset::builtin(),
            Arc::new(NullReporter),
            cancel,
        )
        .unwrap();

        assert_eq!(outcome.result.status, SolutionStatus::Canceled);
        assert!(outcome.problems_remain(false));
    }

    /// Cancels the run as soon as the first descriptor pass is reported.
    struct CancelAfterFirstPass(CancellationToken);

    impl FixReporter for CancelAfterFirstPass {
        fn descriptor_fixed(&self, _report: &fixloop_domain::DescriptorReport) {
            self.0.cancel();
        }
    }

    #[test]
    fn canceled_mid_project_report_matches_the_patch() {
        let cancel = CancellationToken::new();
        let outcome = run_fix(
            &FixSettings::default(),
            &source(),
            &Toolset::builtin(),
            Arc::new(CancelAfterFirstPass(cancel.clone())),
            cancel,
        )
        .unwrap();

        assert_eq!(outcome.result.status, SolutionStatus::Canceled);
        assert_eq!(outcome.result.projects.len(), 1);
        assert_eq!(outcome.report.verdict.counts.fixed, 1);
        assert_eq!(outcome.report.changed_units.len(), 1);
        assert!(outcome.patch.contains("+one"));
    }
}
