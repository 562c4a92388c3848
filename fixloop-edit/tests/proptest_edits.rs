//! Property-based tests for the text edit primitive.
//!
//! These tests verify key invariants:
//! - Applying disjoint edits in any input order yields the same text
//! - Unedited regions survive verbatim
//! - A rejected operation never changes the project

use camino::Utf8Path;
use fixloop_edit::{EditError, apply_operation, apply_text_edits};
use fixloop_types::diagnostic::Span;
use fixloop_types::ops::{EditOperation, UnitEdit};
use fixloop_types::solution::{CompilationUnit, Project};
use proptest::prelude::*;

/// Strategy to generate ASCII text plus a set of disjoint spans inside it.
fn arb_text_and_edits() -> impl Strategy<Value = (String, Vec<(usize, usize, String)>)> {
    prop::string::string_regex(r"[a-z \n]{0,60}")
        .unwrap()
        .prop_flat_map(|text| {
            let len = text.len();
            let cuts = prop::collection::btree_set(0..=len, 0..8);
            (Just(text), cuts, prop::collection::vec("[A-Z]{0,3}", 8))
        })
        .prop_map(|(text, cuts, replacements)| {
            let cuts: Vec<usize> = cuts.into_iter().collect();
            let mut edits = Vec::new();
            for (i, pair) in cuts.chunks(2).enumerate() {
                if let [start, end] = pair {
                    edits.push((*start, *end, replacements[i].clone()));
                }
            }
            (text, edits)
        })
}

proptest! {
    #[test]
    fn edit_order_does_not_matter((text, edits) in arb_text_and_edits()) {
        let unit = Utf8Path::new("u.txt");
        let forward: Vec<UnitEdit> = edits
            .iter()
            .map(|(s, e, t)| UnitEdit::replace("u.txt", Span::new(*s, *e), t.clone()))
            .collect();
        let mut backward = forward.clone();
        backward.reverse();

        let a = apply_text_edits(unit, &text, &forward.iter().collect::<Vec<_>>()).unwrap();
        let b = apply_text_edits(unit, &text, &backward.iter().collect::<Vec<_>>()).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn untouched_suffix_survives((text, edits) in arb_text_and_edits()) {
        let unit = Utf8Path::new("u.txt");
        let last_end = edits.iter().map(|(_, e, _)| *e).max().unwrap_or(0);
        let ops: Vec<UnitEdit> = edits
            .iter()
            .map(|(s, e, t)| UnitEdit::replace("u.txt", Span::new(*s, *e), t.clone()))
            .collect();

        let out = apply_text_edits(unit, &text, &ops.iter().collect::<Vec<_>>()).unwrap();
        prop_assert!(out.ends_with(&text[last_end..]));
    }

    #[test]
    fn rejected_operation_leaves_project_unchanged(text in "[a-z]{1,20}") {
        let project = Project::new("p", "p").with_unit(CompilationUnit::new("u.txt", text.as_str()));
        let op = EditOperation::ApplyEdits {
            edits: vec![
                UnitEdit::replace("u.txt", Span::new(0, 1), "X"),
                UnitEdit::replace("u.txt", Span::new(0, text.len() + 1), "Y"),
            ],
        };

        let err = apply_operation(&project, &op).unwrap_err();
        prop_assert!(
            matches!(
                err,
                EditError::SpanOutOfBounds { .. } | EditError::OverlappingEdits { .. }
            ),
            "unexpected error: {:?}",
            err
        );
        prop_assert_eq!(project.unit(Utf8Path::new("u.txt")).unwrap().text(), text.as_str());
    }
}
