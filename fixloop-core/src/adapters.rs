//! Default filesystem-backed port implementations.

use crate::ports::{SolutionSource, WritePort};
use crate::settings::{FixSettings, ProjectSpec};
use anyhow::Context;
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use fixloop_domain::{DescriptorReport, FixReporter, ProjectReport};
use fixloop_types::solution::{CompilationUnit, Project, ProjectId, Solution};
use glob::MatchOptions;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Builds a solution from project directories on disk.
///
/// Units are collected per project with glob patterns and keyed by their path
/// relative to `root`, using `/` separators. Hidden entries, non-UTF-8 files
/// and anything under `skip_dir` are left out.
#[derive(Debug, Clone)]
pub struct FsSolutionSource {
    pub root: Utf8PathBuf,
    pub projects: Vec<ProjectSpec>,
    pub skip_dir: Option<Utf8PathBuf>,
}

impl FsSolutionSource {
    pub fn new(root: Utf8PathBuf, projects: Vec<ProjectSpec>) -> Self {
        Self {
            root,
            projects,
            skip_dir: None,
        }
    }

    /// Source for `settings`, never reading back its own output directory.
    pub fn from_settings(settings: &FixSettings) -> Self {
        Self {
            root: settings.root.clone(),
            projects: settings.project_specs(),
            skip_dir: Some(settings.root.join(&settings.out_dir)),
        }
    }

    fn collect_units(&self, spec: &ProjectSpec) -> anyhow::Result<Vec<CompilationUnit>> {
        let base = match normalize(&self.root.join(&spec.path)) {
            b if b.as_str().is_empty() => Utf8PathBuf::from("."),
            b => b,
        };
        let options = MatchOptions {
            require_literal_leading_dot: true,
            ..MatchOptions::new()
        };
        let skip = self.skip_dir.as_deref().map(normalize);
        let root = normalize(&self.root);

        let mut found = BTreeMap::new();
        for include in spec.include_patterns() {
            let pattern = format!("{}/{}", glob::Pattern::escape(base.as_str()), include);
            let entries = glob::glob_with(&pattern, options).with_context(|| {
                format!("invalid include pattern {include:?} for project {}", spec.name)
            })?;

            for entry in entries {
                let path = entry.with_context(|| format!("walk {}", base))?;
                let Ok(path) = Utf8PathBuf::from_path_buf(path) else {
                    warn!(project = spec.name.as_str(), "skipping non-UTF-8 path");
                    continue;
                };
                if !path.is_file() {
                    continue;
                }
                let path = normalize(&path);
                if skip.as_ref().is_some_and(|s| path.starts_with(s)) {
                    continue;
                }

                let bytes = fs_err::read(&path)?;
                let Ok(text) = String::from_utf8(bytes) else {
                    debug!(path = %path, "skipping binary file");
                    continue;
                };
                let relative = path.strip_prefix(&root).unwrap_or(&path);
                found.insert(relative.as_str().replace('\\', "/"), text);
            }
        }

        debug!(project = spec.name.as_str(), units = found.len(), "collected units");
        Ok(found
            .into_iter()
            .map(|(path, text)| CompilationUnit::new(path, text))
            .collect())
    }
}

fn normalize(path: &Utf8Path) -> Utf8PathBuf {
    let mut out = Utf8PathBuf::new();
    for component in path.components() {
        if component != Utf8Component::CurDir {
            out.push(component.as_str());
        }
    }
    out
}

impl SolutionSource for FsSolutionSource {
    fn load_solution(&self) -> anyhow::Result<Solution> {
        let mut projects = Vec::with_capacity(self.projects.len());
        for spec in &self.projects {
            let mut project = Project::new(ProjectId::new(&spec.name), spec.path.clone());
            for dep in &spec.dependencies {
                project = project.with_dependency(ProjectId::new(dep));
            }
            for unit in self.collect_units(spec)? {
                project = project.with_unit(unit);
            }
            projects.push(project);
        }
        Solution::new(projects).with_context(|| format!("load solution from {}", self.root))
    }
}

/// In-memory solution for embedding and testing.
#[derive(Debug, Clone)]
pub struct InMemorySolutionSource {
    solution: Solution,
}

impl InMemorySolutionSource {
    pub fn new(solution: Solution) -> Self {
        Self { solution }
    }
}

impl SolutionSource for InMemorySolutionSource {
    fn load_solution(&self) -> anyhow::Result<Solution> {
        Ok(self.solution.clone())
    }
}

/// Filesystem write operations.
#[derive(Debug, Clone, Default)]
pub struct FsWritePort;

impl WritePort for FsWritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_str().is_empty()
        {
            fs_err::create_dir_all(parent)
                .with_context(|| format!("create parent dir for {}", path))?;
        }
        fs_err::write(path, contents).with_context(|| format!("write {}", path))
    }

    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()> {
        fs_err::create_dir_all(path).with_context(|| format!("create_dir_all {}", path))
    }

    fn remove_file(&self, path: &Utf8Path) -> anyhow::Result<()> {
        fs_err::remove_file(path).with_context(|| format!("remove {}", path))
    }
}

/// Forwards engine progress to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl FixReporter for TracingReporter {
    fn descriptor_fixed(&self, report: &DescriptorReport) {
        info!(
            project = %report.project,
            id = report.id.as_str(),
            result = report.result.as_str(),
            fixed = report.fixed,
            remaining = report.remaining,
            "{}",
            report.title
        );
    }

    fn project_fixed(&self, report: &ProjectReport) {
        info!(
            project = %report.project,
            kind = report.kind.as_str(),
            iterations = report.iterations,
            fixed = report.fixed,
            unfixed = report.unfixed,
            unfixable = report.unfixable,
            "project done"
        );
    }

    fn project_skipped(&self, project: &ProjectId) {
        debug!(project = %project, "project skipped");
    }
}
