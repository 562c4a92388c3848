//! Immutable snapshots of units, projects and solutions.
//!
//! Nothing here is mutated in place. Every `with_*` method returns a new value
//! that shares the untouched parts (`Arc`) with the old one, so a snapshot a
//! caller holds on to stays valid after later edits.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// One source artifact's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationUnit {
    path: Utf8PathBuf,
    text: Arc<str>,
}

impl CompilationUnit {
    pub fn new(path: impl Into<Utf8PathBuf>, text: impl Into<Arc<str>>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// A new unit with the same path and different text.
    pub fn with_text(&self, text: impl Into<Arc<str>>) -> Self {
        Self {
            path: self.path.clone(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProjectId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct Project {
    id: ProjectId,
    path: Utf8PathBuf,
    dependencies: Vec<ProjectId>,
    units: Vec<Arc<CompilationUnit>>,
}

impl Project {
    pub fn new(id: impl Into<ProjectId>, path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            dependencies: Vec::new(),
            units: Vec::new(),
        }
    }

    pub fn with_dependency(mut self, dep: impl Into<ProjectId>) -> Self {
        let dep = dep.into();
        if !self.dependencies.contains(&dep) {
            self.dependencies.push(dep);
        }
        self
    }

    pub fn id(&self) -> &ProjectId {
        &self.id
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn dependencies(&self) -> &[ProjectId] {
        &self.dependencies
    }

    pub fn units(&self) -> &[Arc<CompilationUnit>] {
        &self.units
    }

    pub fn unit(&self, path: &Utf8Path) -> Option<&Arc<CompilationUnit>> {
        self.units.iter().find(|u| u.path() == path)
    }

    /// Replace the unit with the same path, or append it.
    pub fn with_unit(&self, unit: CompilationUnit) -> Self {
        let mut next = self.clone();
        let unit = Arc::new(unit);
        match next.units.iter_mut().find(|u| u.path() == unit.path()) {
            Some(slot) => *slot = unit,
            None => next.units.push(unit),
        }
        next
    }

    pub fn without_unit(&self, path: &Utf8Path) -> Self {
        let mut next = self.clone();
        next.units.retain(|u| u.path() != path);
        next
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SolutionError {
    #[error("duplicate project id '{0}'")]
    DuplicateProject(ProjectId),

    #[error("project '{project}' depends on unknown project '{dependency}'")]
    UnknownDependency {
        project: ProjectId,
        dependency: ProjectId,
    },

    #[error("dependency cycle between projects: {}", .0.iter().map(|p| p.as_str()).collect::<Vec<_>>().join(", "))]
    DependencyCycle(Vec<ProjectId>),
}

/// A set of projects and the edges between them.
#[derive(Debug, Clone)]
pub struct Solution {
    projects: Vec<Arc<Project>>,
    version: u64,
}

impl Solution {
    pub fn new(projects: Vec<Project>) -> Result<Self, SolutionError> {
        let mut seen = BTreeSet::new();
        for p in &projects {
            if !seen.insert(p.id().clone()) {
                return Err(SolutionError::DuplicateProject(p.id().clone()));
            }
        }
        for p in &projects {
            if let Some(dep) = p.dependencies().iter().find(|d| !seen.contains(*d)) {
                return Err(SolutionError::UnknownDependency {
                    project: p.id().clone(),
                    dependency: dep.clone(),
                });
            }
        }

        Ok(Self {
            projects: projects.into_iter().map(Arc::new).collect(),
            version: 0,
        })
    }

    /// Incremented by every `with_project`; distinguishes snapshots cheaply.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.iter().map(|p| p.as_ref())
    }

    pub fn project(&self, id: &ProjectId) -> Option<&Project> {
        self.projects
            .iter()
            .find(|p| p.id() == id)
            .map(|p| p.as_ref())
    }

    /// Copy-on-write: a new snapshot with `project` replacing the one with its id.
    pub fn with_project(&self, project: Project) -> Self {
        let mut projects = self.projects.clone();
        let project = Arc::new(project);
        match projects.iter_mut().find(|p| p.id() == project.id()) {
            Some(slot) => *slot = project,
            None => projects.push(project),
        }
        Self {
            projects,
            version: self.version + 1,
        }
    }

    /// Dependencies before dependents. Among projects that are ready at the
    /// same time, declaration order wins.
    pub fn topological_order(&self) -> Result<Vec<ProjectId>, SolutionError> {
        let index: BTreeMap<&ProjectId, usize> = self
            .projects
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id(), i))
            .collect();

        let mut pending: Vec<usize> = self
            .projects
            .iter()
            .map(|p| p.dependencies().len())
            .collect();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.projects.len()];
        for (i, p) in self.projects.iter().enumerate() {
            for dep in p.dependencies() {
                match index.get(dep) {
                    Some(&d) => dependents[d].push(i),
                    None => {
                        return Err(SolutionError::UnknownDependency {
                            project: p.id().clone(),
                            dependency: dep.clone(),
                        });
                    }
                }
            }
        }

        let mut ready: BTreeSet<usize> = pending
            .iter()
            .enumerate()
            .filter(|(_, n)| **n == 0)
            .map(|(i, _)| i)
            .collect();
        let mut order = Vec::with_capacity(self.projects.len());

        while let Some(i) = ready.pop_first() {
            order.push(self.projects[i].id().clone());
            for &j in &dependents[i] {
                pending[j] -= 1;
                if pending[j] == 0 {
                    ready.insert(j);
                }
            }
        }

        if order.len() != self.projects.len() {
            let stuck = self
                .projects
                .iter()
                .enumerate()
                .filter(|(i, _)| pending[*i] > 0)
                .map(|(_, p)| p.id().clone())
                .collect();
            return Err(SolutionError::DependencyCycle(stuck));
        }

        Ok(order)
    }
}
