use fixloop_types::diagnostic::{Diagnostic, Location, Severity, Span};
use fixloop_types::ops::{CodeAction, EditOperation, UnitEdit};
use fixloop_types::report::{FixloopReport, ReportRunInfo, ReportStatus, ReportToolInfo};
use fixloop_types::result::{
    FixResult, LoopEvidence, ProjectFixKind, ProjectFixResult, ProjectOutcome, SolutionFixResult,
    SolutionStatus,
};

fn tool() -> ReportToolInfo {
    ReportToolInfo {
        name: "fixloop".to_string(),
        version: "1.0.0".to_string(),
    }
}

fn run() -> ReportRunInfo {
    ReportRunInfo {
        started_at: "2025-01-01T00:00:00Z".to_string(),
        ended_at: None,
        duration_ms: None,
        applied: false,
    }
}

fn diag(id: &str) -> Diagnostic {
    Diagnostic::new(
        id,
        Severity::Warning,
        Location::new("src/a.txt", Span::new(0, 1)),
        "message",
    )
}

#[test]
fn classifications_serialize_snake_case() {
    assert_eq!(
        serde_json::to_value(FixResult::PartiallyFixed).unwrap(),
        serde_json::json!("partially_fixed")
    );
    assert_eq!(
        serde_json::to_value(FixResult::MultipleFixers).unwrap(),
        serde_json::json!("multiple_fixers")
    );
    assert_eq!(
        serde_json::to_value(ProjectFixKind::NoFixableAnalyzers).unwrap(),
        serde_json::json!("no_fixable_analyzers")
    );
    assert_eq!(
        serde_json::to_value(SolutionStatus::Canceled).unwrap(),
        serde_json::json!("canceled")
    );
    assert_eq!(
        serde_json::to_value(SolutionStatus::HostError).unwrap(),
        serde_json::json!("host_error")
    );
    assert_eq!(
        serde_json::to_value(Severity::Warning).unwrap(),
        serde_json::json!("warning")
    );
}

#[test]
fn diagnostic_omits_suppressed_when_false() {
    let value = serde_json::to_value(diag("TXT1001")).unwrap();
    assert!(value.get("suppressed").is_none());

    let value = serde_json::to_value(diag("TXT1001").suppressed()).unwrap();
    assert_eq!(value["suppressed"], serde_json::json!(true));
}

#[test]
fn project_outcome_is_tagged() {
    let skipped = ProjectOutcome::Skipped {
        project: "docs".into(),
    };
    let value = serde_json::to_value(&skipped).unwrap();
    assert_eq!(value["outcome"], serde_json::json!("skipped"));
    assert_eq!(value["project"], serde_json::json!("docs"));

    let fixed = ProjectOutcome::Fixed(ProjectFixResult::new(
        "core".into(),
        ProjectFixKind::Success,
    ));
    let value = serde_json::to_value(&fixed).unwrap();
    assert_eq!(value["outcome"], serde_json::json!("fixed"));
    assert_eq!(value["kind"], serde_json::json!("success"));
    assert!(value.get("infinite_loop").is_none());
}

#[test]
fn edit_operation_is_tagged_by_type() {
    let op = EditOperation::single(UnitEdit::replace("a.txt", Span::new(1, 2), "x"));
    let value = serde_json::to_value(&op).unwrap();
    assert_eq!(value["type"], serde_json::json!("apply_edits"));

    let action = CodeAction::new("Remove it", EditOperation::RemoveUnit { path: "a.txt".into() });
    let value = serde_json::to_value(&action).unwrap();
    assert!(value.get("equivalence_key").is_none());
    assert_eq!(value["operations"][0]["type"], serde_json::json!("remove_unit"));
}

#[test]
fn report_verdict_reflects_failures() {
    let mut looping = ProjectFixResult::new("core".into(), ProjectFixKind::InfiniteLoop);
    looping.infinite_loop = Some(LoopEvidence {
        current: vec![diag("A")],
        previous: vec![diag("B")],
    });
    let result = SolutionFixResult {
        status: SolutionStatus::Completed,
        projects: vec![ProjectOutcome::Fixed(looping)],
    };

    let report = FixloopReport::new(tool(), run(), result);
    assert_eq!(report.schema, fixloop_types::schema::FIXLOOP_REPORT_V1);
    assert_eq!(report.verdict.status, ReportStatus::Fail);
    assert_eq!(report.verdict.reasons, vec!["core: infinite_loop".to_string()]);

    let value = serde_json::to_value(&report).unwrap();
    assert!(value.get("changed_units").is_none());
    assert_eq!(
        value["result"]["projects"][0]["infinite_loop"]["current"][0]["id"],
        serde_json::json!("A")
    );
}

#[test]
fn report_verdict_warns_on_leftovers() {
    let mut done = ProjectFixResult::new("core".into(), ProjectFixKind::Success);
    done.fixed = vec![diag("A")];
    done.unfixable = vec![diag("B")];
    let result = SolutionFixResult {
        status: SolutionStatus::Completed,
        projects: vec![
            ProjectOutcome::Fixed(done),
            ProjectOutcome::Skipped {
                project: "docs".into(),
            },
        ],
    };

    let report = FixloopReport::new(tool(), run(), result);
    assert_eq!(report.verdict.status, ReportStatus::Warn);
    assert_eq!(report.verdict.counts.projects, 2);
    assert_eq!(report.verdict.counts.skipped, 1);
    assert_eq!(report.verdict.counts.fixed, 1);
    assert_eq!(report.verdict.counts.unfixable, 1);
}

#[test]
fn report_roundtrips_through_json() {
    let result = SolutionFixResult {
        status: SolutionStatus::Canceled,
        projects: vec![ProjectOutcome::Skipped {
            project: "docs".into(),
        }],
    };
    let report = FixloopReport::new(tool(), run(), result.clone());
    let json = serde_json::to_string(&report).unwrap();
    let back: FixloopReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back.result, result);
    assert_eq!(back.verdict.status, ReportStatus::Fail);
}
