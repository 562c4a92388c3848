//! Built-in text hygiene rules.
//!
//! `TextCompiler` plays the compiler for plain-text projects; the analyzers and
//! fixers below are what `fixloop fix` runs by default.

mod compiler;
mod final_newline;
mod line_length;
mod tab_indent;
mod trailing_whitespace;

pub use compiler::TextCompiler;
pub use final_newline::FinalNewline;
pub use line_length::LineLength;
pub use tab_indent::TabIndent;
pub use trailing_whitespace::TrailingWhitespace;

use fixloop_domain::{Analyzer, Fixer};
use fixloop_types::diagnostic::Severity;
use serde::Serialize;
use std::sync::Arc;

/// Who reports a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSource {
    Compiler,
    Analyzer,
}

/// Static description of a built-in rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RuleMeta {
    pub id: &'static str,
    pub title: &'static str,
    pub severity: Severity,
    pub source: RuleSource,
    pub fixable: bool,
    pub fix_all: bool,
    pub description: &'static str,
    pub remediation: &'static str,
}

pub fn builtin_analyzers() -> Vec<Arc<dyn Analyzer>> {
    vec![
        Arc::new(TrailingWhitespace),
        Arc::new(TabIndent::default()),
        Arc::new(FinalNewline),
        Arc::new(LineLength::default()),
    ]
}

pub fn builtin_fixers() -> Vec<Arc<dyn Fixer>> {
    vec![
        Arc::new(TrailingWhitespace),
        Arc::new(TabIndent::default()),
        Arc::new(FinalNewline),
    ]
}

pub fn builtin_rule_metas() -> Vec<RuleMeta> {
    vec![
        TextCompiler::META,
        TrailingWhitespace::META,
        TabIndent::META,
        FinalNewline::META,
        LineLength::META,
    ]
}

pub fn lookup_rule(id: &str) -> Option<RuleMeta> {
    builtin_rule_metas()
        .into_iter()
        .find(|m| m.id.eq_ignore_ascii_case(id))
}

/// Marker that suppresses a rule on the line it appears on, e.g.
/// `fixloop:allow(TXT1004)`.
pub(crate) fn allows(line: &str, id: &str) -> bool {
    line.match_indices("fixloop:allow(").any(|(at, marker)| {
        line[at + marker.len()..]
            .split(')')
            .next()
            .is_some_and(|ids| ids.split(',').any(|i| i.trim() == id))
    })
}

/// Lines of `text` with their starting byte offset, without the line ending.
pub(crate) fn lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut offset = 0;
    text.split_inclusive('\n').map(move |raw| {
        let start = offset;
        offset += raw.len();
        let line = raw.strip_suffix('\n').unwrap_or(raw);
        (start, line.strip_suffix('\r').unwrap_or(line))
    })
}
