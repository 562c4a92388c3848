//! Clap-free settings for the fix pipeline.

use camino::Utf8PathBuf;
use fixloop_domain::{FixOptions, ProjectFilter};
use serde::{Deserialize, Serialize};

/// Unit globs used when a project does not list its own.
pub const DEFAULT_INCLUDE: &[&str] = &["**/*.txt", "**/*.md"];

/// One project of an on-disk solution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSpec {
    pub name: String,

    /// Directory relative to the solution root.
    #[serde(default = "default_project_path")]
    pub path: Utf8PathBuf,

    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Globs relative to `path`. Empty means [`DEFAULT_INCLUDE`].
    #[serde(default)]
    pub include: Vec<String>,
}

fn default_project_path() -> Utf8PathBuf {
    Utf8PathBuf::from(".")
}

impl ProjectSpec {
    pub fn new(name: impl Into<String>, path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            dependencies: Vec::new(),
            include: Vec::new(),
        }
    }

    pub fn include_patterns(&self) -> Vec<String> {
        if self.include.is_empty() {
            DEFAULT_INCLUDE.iter().map(|s| s.to_string()).collect()
        } else {
            self.include.clone()
        }
    }
}

/// Settings for one `run_fix` invocation.
#[derive(Debug, Clone)]
pub struct FixSettings {
    pub root: Utf8PathBuf,
    pub out_dir: Utf8PathBuf,

    /// Write fixed units back to disk. Otherwise only artifacts are produced.
    pub apply: bool,

    /// Unfixed or unfixable diagnostics count as problems for the exit code.
    pub strict: bool,

    pub options: FixOptions,
    pub filter: ProjectFilter,

    /// Empty means a single project rooted at `root`.
    pub projects: Vec<ProjectSpec>,
}

impl Default for FixSettings {
    fn default() -> Self {
        Self {
            root: Utf8PathBuf::from("."),
            out_dir: Utf8PathBuf::from("artifacts/fixloop"),
            apply: false,
            strict: false,
            options: FixOptions::default(),
            filter: ProjectFilter::default(),
            projects: Vec::new(),
        }
    }
}

impl FixSettings {
    /// Configured projects, or the implicit root project.
    pub fn project_specs(&self) -> Vec<ProjectSpec> {
        if self.projects.is_empty() {
            vec![ProjectSpec::new("root", ".")]
        } else {
            self.projects.clone()
        }
    }
}
