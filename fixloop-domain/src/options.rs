use crate::ports::{Compilation, PreferenceResolver};
use fixloop_types::diagnostic::{Diagnostic, Severity};
use fixloop_types::solution::Project;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_MAX_ITERATIONS: usize = 100;
pub const DEFAULT_MAX_BATCHES: usize = 1000;

/// Engine configuration. Id lists accept `*` and `?` patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixOptions {
    /// Diagnostics below this severity are ignored.
    pub severity_level: Severity,

    /// Upper bound on diagnostics handed to a fixer at once. 0 means unlimited.
    pub batch_size: usize,

    /// Bound on project-level iterations.
    pub max_iterations: usize,

    /// Bound on batches applied by one descriptor pass.
    pub max_batches: usize,

    pub ignored_compiler_diagnostic_ids: Vec<String>,
    pub ignored_diagnostic_ids: Vec<String>,

    /// When non-empty, only these ids are considered.
    pub supported_diagnostic_ids: Vec<String>,

    pub include_suppressed: bool,
    pub ignore_compiler_errors: bool,

    /// Ids that are always fixed with a batch size of 1.
    pub fix_one_by_one: Vec<String>,

    /// Diagnostic id -> fixer name.
    pub fixer_preferences: BTreeMap<String, String>,

    /// Diagnostic id -> action equivalence key.
    pub action_preferences: BTreeMap<String, String>,

    pub concurrent_analysis: bool,
}

impl Default for FixOptions {
    fn default() -> Self {
        Self {
            severity_level: Severity::Info,
            batch_size: 0,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_batches: DEFAULT_MAX_BATCHES,
            ignored_compiler_diagnostic_ids: Vec::new(),
            ignored_diagnostic_ids: Vec::new(),
            supported_diagnostic_ids: Vec::new(),
            include_suppressed: false,
            ignore_compiler_errors: false,
            fix_one_by_one: Vec::new(),
            fixer_preferences: BTreeMap::new(),
            action_preferences: BTreeMap::new(),
            concurrent_analysis: false,
        }
    }
}

impl FixOptions {
    /// Deny patterns win over the allowlist.
    pub fn accepts_id(&self, id: &str) -> bool {
        if matches_any(&self.ignored_diagnostic_ids, id) {
            return false;
        }
        self.supported_diagnostic_ids.is_empty() || matches_any(&self.supported_diagnostic_ids, id)
    }

    pub fn is_ignored_compiler_id(&self, id: &str) -> bool {
        matches_any(&self.ignored_compiler_diagnostic_ids, id)
    }

    /// Severity threshold and suppression.
    pub fn passes_filters(&self, diagnostic: &Diagnostic) -> bool {
        diagnostic.severity >= self.severity_level
            && (self.include_suppressed || !diagnostic.suppressed)
    }

    pub fn batch_size_for(&self, id: &str) -> usize {
        if matches_any(&self.fix_one_by_one, id) {
            1
        } else {
            self.batch_size
        }
    }

    /// Compiler errors that block fixing, or nothing when errors are ignored.
    pub fn blocking_errors<'a>(&self, compilation: &'a Compilation) -> Vec<&'a Diagnostic> {
        if self.ignore_compiler_errors {
            return Vec::new();
        }
        compilation
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error && !self.is_ignored_compiler_id(&d.id))
            .collect()
    }

    pub fn resolver(&self) -> PreferenceResolver {
        PreferenceResolver::new(
            self.fixer_preferences
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            self.action_preferences
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

/// Inclusion predicate over project ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFilter {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl ProjectFilter {
    pub fn new(include: Vec<String>, exclude: Vec<String>) -> Self {
        Self { include, exclude }
    }

    pub fn matches(&self, project: &Project) -> bool {
        let id = project.id().as_str();
        if matches_any(&self.exclude, id) {
            return false;
        }
        self.include.is_empty() || matches_any(&self.include, id)
    }
}

fn matches_any(patterns: &[String], text: &str) -> bool {
    patterns.iter().any(|p| glob_match(p, text))
}

/// `*` matches any run of characters, `?` exactly one.
pub fn glob_match(pat: &str, text: &str) -> bool {
    let p: Vec<char> = pat.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let mut dp = vec![vec![false; t.len() + 1]; p.len() + 1];
    dp[0][0] = true;

    for i in 1..=p.len() {
        if p[i - 1] == '*' {
            dp[i][0] = dp[i - 1][0];
        }
    }

    for i in 1..=p.len() {
        for j in 1..=t.len() {
            dp[i][j] = match p[i - 1] {
                '*' => dp[i - 1][j] || dp[i][j - 1],
                '?' => dp[i - 1][j - 1],
                c => dp[i - 1][j - 1] && c == t[j - 1],
            };
        }
    }

    dp[p.len()][t.len()]
}
