use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Well-known descriptor tags.
pub mod tags {
    /// The descriptor is produced by the compiler, not by an analyzer.
    pub const COMPILER_ERROR: &str = "compiler-error";
}

/// Diagnostic severity, ordered from least to most severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Hidden,
    #[default]
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Hidden => "hidden",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hidden" => Ok(Severity::Hidden),
            "info" => Ok(Severity::Info),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            other => Err(format!("unknown severity '{}'", other)),
        }
    }
}

/// Half-open byte range `[start, end)` inside a compilation unit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn empty(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        if self.is_empty() || other.is_empty() {
            return self.start == other.start
                || (self.start > other.start && self.start < other.end)
                || (other.start > self.start && other.start < self.end);
        }
        self.start < other.end && other.start < self.end
    }
}

/// Where a diagnostic points: a unit path and a span inside it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    pub unit: Utf8PathBuf,
    pub span: Span,
}

impl Location {
    pub fn new(unit: impl Into<Utf8PathBuf>, span: Span) -> Self {
        Self {
            unit: unit.into(),
            span,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}..{}", self.unit, self.span.start, self.span.end)
    }
}

/// Identity of a rule or check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiagnosticDescriptor {
    pub id: String,
    pub title: String,
    pub default_severity: Severity,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl DiagnosticDescriptor {
    pub fn new(id: impl Into<String>, title: impl Into<String>, severity: Severity) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            default_severity: severity,
            tags: Vec::new(),
        }
    }

    /// Descriptor for a diagnostic the compiler emitted. Titled with its id.
    pub fn compiler(id: impl Into<String>, severity: Severity) -> Self {
        let id = id.into();
        Self {
            title: id.clone(),
            id,
            default_severity: severity,
            tags: vec![tags::COMPILER_ERROR.to_string()],
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn is_compiler(&self) -> bool {
        self.has_tag(tags::COMPILER_ERROR)
    }
}

/// A single reported issue.
///
/// Instances are recreated on every recompilation, so convergence checks use
/// [`Diagnostic::key`] rather than full structural equality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub id: String,
    pub severity: Severity,
    pub location: Location,
    pub message: String,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub suppressed: bool,
}

impl Diagnostic {
    pub fn new(
        id: impl Into<String>,
        severity: Severity,
        location: Location,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            severity,
            location,
            message: message.into(),
            suppressed: false,
        }
    }

    pub fn suppressed(mut self) -> Self {
        self.suppressed = true;
        self
    }

    pub fn key(&self) -> DiagnosticKey<'_> {
        DiagnosticKey {
            id: &self.id,
            severity: self.severity,
            location: &self.location,
        }
    }

    /// Equality by id, severity and location.
    pub fn deep_eq(&self, other: &Diagnostic) -> bool {
        self.key() == other.key()
    }
}

/// The deep-equality class of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DiagnosticKey<'a> {
    pub id: &'a str,
    pub severity: Severity,
    pub location: &'a Location,
}

/// Stable ordering used wherever diagnostics are listed.
pub fn compare_diagnostics(a: &Diagnostic, b: &Diagnostic) -> Ordering {
    a.location
        .cmp(&b.location)
        .then_with(|| a.id.cmp(&b.id))
        .then_with(|| a.severity.cmp(&b.severity))
}

pub fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(compare_diagnostics);
}

/// Deep equality of two diagnostic sequences, treated as multisets.
pub fn deep_equal_sets(a: &[Diagnostic], b: &[Diagnostic]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    key_counts(a) == key_counts(b)
}

/// Diagnostics in `from` whose deep-equality class does not occur in `remove`.
pub fn deep_difference(from: &[Diagnostic], remove: &[Diagnostic]) -> Vec<Diagnostic> {
    let mut remaining = key_counts(remove);
    let mut out = Vec::new();
    for d in from {
        match remaining.get_mut(&d.key()) {
            Some(n) if *n > 0 => *n -= 1,
            _ => out.push(d.clone()),
        }
    }
    out
}

/// True if any diagnostic in `haystack` deep-equals `needle`.
pub fn deep_contains(haystack: &[Diagnostic], needle: &Diagnostic) -> bool {
    haystack.iter().any(|d| d.deep_eq(needle))
}

fn key_counts(diagnostics: &[Diagnostic]) -> BTreeMap<DiagnosticKey<'_>, usize> {
    let mut counts = BTreeMap::new();
    for d in diagnostics {
        *counts.entry(d.key()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diag(id: &str, start: usize, message: &str) -> Diagnostic {
        Diagnostic::new(
            id,
            Severity::Warning,
            Location::new("src/a.txt", Span::new(start, start + 1)),
            message,
        )
    }

    #[test]
    fn deep_eq_ignores_message_and_suppression() {
        let a = diag("TXT1", 3, "first wording");
        let b = diag("TXT1", 3, "second wording").suppressed();
        assert!(a.deep_eq(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn deep_eq_respects_severity_and_location() {
        let a = diag("TXT1", 3, "m");
        let mut b = a.clone();
        b.severity = Severity::Error;
        assert!(!a.deep_eq(&b));

        let c = diag("TXT1", 4, "m");
        assert!(!a.deep_eq(&c));
    }

    #[test]
    fn deep_equal_sets_is_order_independent() {
        let x = vec![diag("A", 1, "m"), diag("B", 2, "m")];
        let y = vec![diag("B", 2, "other"), diag("A", 1, "other")];
        assert!(deep_equal_sets(&x, &y));
        assert!(!deep_equal_sets(&x, &y[..1]));
    }

    #[test]
    fn deep_equal_sets_counts_duplicates() {
        let x = vec![diag("A", 1, "m"), diag("A", 1, "m"), diag("B", 2, "m")];
        let y = vec![diag("A", 1, "m"), diag("B", 2, "m"), diag("B", 2, "m")];
        assert!(!deep_equal_sets(&x, &y));
    }

    #[test]
    fn deep_difference_removes_matching_classes() {
        let before = vec![diag("A", 1, "m"), diag("A", 5, "m"), diag("A", 9, "m")];
        let after = vec![diag("A", 5, "regenerated")];
        let fixed = deep_difference(&before, &after);
        assert_eq!(fixed.len(), 2);
        assert_eq!(fixed[0].location.span.start, 1);
        assert_eq!(fixed[1].location.span.start, 9);
    }

    #[test]
    fn severity_orders_and_parses() {
        assert!(Severity::Hidden < Severity::Info);
        assert!(Severity::Warning < Severity::Error);
        assert_eq!("warn".parse::<Severity>().unwrap(), Severity::Warning);
        assert!("fatal".parse::<Severity>().is_err());
    }

    #[test]
    fn span_overlap_handles_insertions() {
        assert!(Span::new(0, 4).overlaps(&Span::new(3, 6)));
        assert!(!Span::new(0, 3).overlaps(&Span::new(3, 6)));
        assert!(Span::empty(2).overlaps(&Span::new(0, 4)));
        assert!(Span::empty(2).overlaps(&Span::empty(2)));
        assert!(!Span::empty(4).overlaps(&Span::new(0, 4)));
    }

    #[test]
    fn compiler_descriptor_is_tagged() {
        let d = DiagnosticDescriptor::compiler("TXT0001", Severity::Error);
        assert!(d.is_compiler());
        assert_eq!(d.title, "TXT0001");
        assert!(!DiagnosticDescriptor::new("X", "x", Severity::Info).is_compiler());
    }
}
