//! Indexes analyzers and fixers by diagnostic id for one project pass.

use crate::options::FixOptions;
use crate::ports::{Analyzer, Fixer};
use fixloop_types::diagnostic::{DiagnosticDescriptor, Severity};
use fixloop_types::result::ProjectFixKind;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Where a descriptor's diagnostics come from. Resolved once per descriptor pass.
#[derive(Clone)]
pub enum DescriptorSource {
    /// Read from the compilation; no analyzer runs.
    Compiler,
    Analyzers(Vec<Arc<dyn Analyzer>>),
}

impl DescriptorSource {
    pub fn is_compiler(&self) -> bool {
        matches!(self, DescriptorSource::Compiler)
    }
}

pub struct CapabilityRegistry {
    fixers_by_id: BTreeMap<String, Vec<Arc<dyn Fixer>>>,
    analyzers_by_id: BTreeMap<String, Vec<Arc<dyn Analyzer>>>,
    descriptors_by_id: BTreeMap<String, DiagnosticDescriptor>,

    /// Analyzers with at least one descriptor that has a fixer.
    fixable_analyzers: Vec<Arc<dyn Analyzer>>,

    /// Analyzers with at least one descriptor accepted by the options.
    accepted_analyzers: Vec<Arc<dyn Analyzer>>,
}

impl CapabilityRegistry {
    /// Build the index, or return the terminal kind when there is nothing to do.
    pub fn build(
        analyzers: &[Arc<dyn Analyzer>],
        fixers: &[Arc<dyn Fixer>],
        options: &FixOptions,
    ) -> Result<Self, ProjectFixKind> {
        if analyzers.is_empty() {
            return Err(ProjectFixKind::NoAnalyzers);
        }
        if fixers.is_empty() {
            return Err(ProjectFixKind::NoFixers);
        }

        let mut fixers_by_id: BTreeMap<String, Vec<Arc<dyn Fixer>>> = BTreeMap::new();
        for fixer in fixers {
            let ids: BTreeSet<String> = fixer.fixable_ids().into_iter().collect();
            for id in ids.into_iter().filter(|id| options.accepts_id(id)) {
                fixers_by_id.entry(id).or_default().push(Arc::clone(fixer));
            }
        }

        let mut analyzers_by_id: BTreeMap<String, Vec<Arc<dyn Analyzer>>> = BTreeMap::new();
        let mut descriptors_by_id = BTreeMap::new();
        let mut fixable_analyzers = Vec::new();
        let mut accepted_analyzers = Vec::new();

        for analyzer in analyzers {
            let mut accepted = false;
            let mut fixable = false;
            let mut seen = BTreeSet::new();

            for descriptor in analyzer.supported_descriptors() {
                if !options.accepts_id(&descriptor.id) || !seen.insert(descriptor.id.clone()) {
                    continue;
                }
                accepted = true;
                fixable |= fixers_by_id.contains_key(&descriptor.id);
                analyzers_by_id
                    .entry(descriptor.id.clone())
                    .or_default()
                    .push(Arc::clone(analyzer));
                descriptors_by_id
                    .entry(descriptor.id.clone())
                    .or_insert(descriptor);
            }

            if accepted {
                accepted_analyzers.push(Arc::clone(analyzer));
            }
            if fixable {
                fixable_analyzers.push(Arc::clone(analyzer));
            }
        }

        if fixable_analyzers.is_empty() {
            return Err(ProjectFixKind::NoFixableAnalyzers);
        }

        Ok(Self {
            fixers_by_id,
            analyzers_by_id,
            descriptors_by_id,
            fixable_analyzers,
            accepted_analyzers,
        })
    }

    pub fn fixers_for(&self, id: &str) -> &[Arc<dyn Fixer>] {
        self.fixers_by_id.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_fixer(&self, id: &str) -> bool {
        self.fixers_by_id.contains_key(id)
    }

    pub fn has_analyzer(&self, id: &str) -> bool {
        self.analyzers_by_id.contains_key(id)
    }

    pub fn fixable_analyzers(&self) -> &[Arc<dyn Analyzer>] {
        &self.fixable_analyzers
    }

    pub fn accepted_analyzers(&self) -> &[Arc<dyn Analyzer>] {
        &self.accepted_analyzers
    }

    /// The declared descriptor, or a synthesized compiler descriptor.
    pub fn descriptor(&self, id: &str, severity: Severity) -> DiagnosticDescriptor {
        self.descriptors_by_id
            .get(id)
            .cloned()
            .unwrap_or_else(|| DiagnosticDescriptor::compiler(id, severity))
    }

    pub fn source_for(&self, descriptor: &DiagnosticDescriptor) -> DescriptorSource {
        if descriptor.is_compiler() {
            return DescriptorSource::Compiler;
        }
        match self.analyzers_by_id.get(&descriptor.id) {
            Some(analyzers) => DescriptorSource::Analyzers(analyzers.clone()),
            None => DescriptorSource::Compiler,
        }
    }
}
