use crate::result::{SolutionFixResult, SolutionStatus};
use serde::{Deserialize, Serialize};

/// Machine-readable run report (`fixloop.report.v1`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixloopReport {
    pub schema: String,
    pub tool: ReportToolInfo,
    pub run: ReportRunInfo,
    pub verdict: ReportVerdict,
    pub result: SolutionFixResult,

    /// Units whose text differs between the input and the final snapshot.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changed_units: Vec<ChangedUnit>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl FixloopReport {
    pub fn new(tool: ReportToolInfo, run: ReportRunInfo, result: SolutionFixResult) -> Self {
        let verdict = ReportVerdict::from_result(&result);
        Self {
            schema: crate::schema::FIXLOOP_REPORT_V1.to_string(),
            tool,
            run,
            verdict,
            result,
            changed_units: Vec::new(),
            data: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportToolInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRunInfo {
    pub started_at: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,

    /// True when edits were written back to disk.
    #[serde(default)]
    pub applied: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportVerdict {
    pub status: ReportStatus,
    pub counts: ReportCounts,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
}

impl ReportVerdict {
    pub fn from_result(result: &SolutionFixResult) -> Self {
        let counts = ReportCounts {
            projects: result.projects.len() as u64,
            skipped: (result.projects.len() - result.fixed_results().count()) as u64,
            fixed: result.total_fixed() as u64,
            unfixed: result.total_unfixed() as u64,
            unfixable: result.total_unfixable() as u64,
        };

        let mut reasons = Vec::new();
        for r in result.fixed_results() {
            if r.kind.is_failure() {
                reasons.push(format!("{}: {}", r.project, r.kind.as_str()));
            }
        }
        if result.status == SolutionStatus::Canceled {
            reasons.push("canceled".to_string());
        }
        if let Some(error) = result.fixed_results().find_map(|r| r.error.as_deref()) {
            reasons.push(format!("host error: {error}"));
        }

        let status = if !reasons.is_empty() {
            ReportStatus::Fail
        } else if counts.unfixed > 0 || counts.unfixable > 0 {
            ReportStatus::Warn
        } else {
            ReportStatus::Pass
        };

        Self {
            status,
            counts,
            reasons,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pass,
    Warn,
    Fail,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportCounts {
    pub projects: u64,
    pub skipped: u64,
    pub fixed: u64,
    pub unfixed: u64,
    pub unfixable: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedUnit {
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256_before: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256_after: Option<String>,
}
