//! Rule explanations for `fixloop explain` and `fixloop list-rules`.

use fixloop_rules::{RuleMeta, RuleSource, builtin_rule_metas, lookup_rule};

/// Look up a rule by id, case-insensitively. `txt1001` and `TXT1001` match.
pub fn lookup(query: &str) -> Option<RuleMeta> {
    lookup_rule(query.trim())
}

pub fn list_rule_ids() -> Vec<&'static str> {
    builtin_rule_metas().iter().map(|m| m.id).collect()
}

pub fn format_source(source: RuleSource) -> &'static str {
    match source {
        RuleSource::Compiler => "Compiler",
        RuleSource::Analyzer => "Analyzer",
    }
}

/// Short label for how a rule's diagnostics are handled.
pub fn fix_mode(meta: &RuleMeta) -> &'static str {
    match (meta.fixable, meta.fix_all) {
        (false, _) => "report-only",
        (true, true) => "fix-all",
        (true, false) => "one-at-a-time",
    }
}

/// What a fix mode means for a run.
pub fn fix_mode_meaning(meta: &RuleMeta) -> &'static str {
    match (meta.source, meta.fixable, meta.fix_all) {
        (RuleSource::Compiler, _, _) => {
            "COMPILER diagnostics at error severity stop the project pass before any fix\n\
             is attempted. Use `--ignore-compiler-errors` to fix around them."
        }
        (_, false, _) => {
            "REPORT-ONLY rules have no fixer. Their diagnostics end up in the\n\
             `unfixable` bucket of the report."
        }
        (_, true, true) => {
            "FIX-ALL rules fix a whole batch in one edit. `--batch-size` bounds the\n\
             batch; `--one-by-one <id>` forces single-diagnostic batches."
        }
        (_, true, false) => {
            "ONE-AT-A-TIME rules fix one diagnostic per edit, and the project is\n\
             re-analyzed after every edit."
        }
    }
}
