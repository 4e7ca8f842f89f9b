//! Property tests for the batch applier.

use proptest::prelude::*;
use redline::{apply_all, Correction, EditError, Finding};

/// Build a document from `(keep, target, replacement)` segments, with one
/// span-anchored finding per target, and the text expected after applying.
fn build(segments: &[(String, String, String)]) -> (String, Vec<Finding>, String) {
    let mut document = String::new();
    let mut expected = String::new();
    let mut findings = Vec::new();

    for (i, (keep, target, replacement)) in segments.iter().enumerate() {
        document.push_str(keep);
        expected.push_str(keep);

        let start = document.chars().count();
        document.push_str(target);
        let end = document.chars().count();
        expected.push_str(replacement);

        findings.push(
            Finding::new(format!("rule-{i}"), "msg", "Resolução").with_correction(
                Correction::new(target.clone(), replacement.clone()).with_span(start, end),
            ),
        );
    }

    (document, findings, expected)
}

fn segments_and_order() -> impl Strategy<Value = (Vec<(String, String, String)>, Vec<usize>)> {
    prop::collection::vec(("[a-zçã ]{0,5}", "[a-z]{1,4}", "[A-Zé ]{0,5}"), 1..8).prop_flat_map(
        |segments| {
            let order: Vec<usize> = (0..segments.len()).collect();
            (Just(segments), Just(order).prop_shuffle())
        },
    )
}

proptest! {
    #[test]
    fn batch_apply_ignores_input_order((segments, order) in segments_and_order()) {
        let (document, findings, expected) = build(&segments);
        let shuffled: Vec<Finding> = order.iter().map(|&i| findings[i].clone()).collect();

        let in_order = apply_all(&document, &findings).unwrap();
        let reordered = apply_all(&document, &shuffled).unwrap();

        prop_assert_eq!(&in_order.text, &expected);
        prop_assert_eq!(&reordered.text, &expected);
        prop_assert_eq!(reordered.applied_count(), segments.len());
        prop_assert!(reordered.skipped.is_empty());
    }

    #[test]
    fn full_drift_never_touches_document((segments, _order) in segments_and_order()) {
        let (document, findings, _) = build(&segments);
        let before = document.clone();

        // Expect digits where the document only has letters
        let stale: Vec<Finding> = findings
            .into_iter()
            .map(|mut finding| {
                if let Some(correction) = finding.correction.as_mut() {
                    correction.original = "0".repeat(correction.original.len());
                }
                finding
            })
            .collect();

        let err = apply_all(&document, &stale).unwrap_err();
        let is_drift = matches!(err, EditError::Drift { ref skipped } if skipped.len() == segments.len());
        prop_assert!(is_drift);
        prop_assert_eq!(document, before);
    }
}
