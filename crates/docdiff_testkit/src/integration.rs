//! Cross-crate integration test helpers.
//!
//! Checks that hold for any diff pass, plus helpers that run the engine
//! over real store files.

use docdiff_core::{compare_keys, DiffClassification, DiffEngine, DiffReport, DiffSummary, Entry};
use docdiff_store::{Db, DocInfo};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Diffs the selected snapshots of two open stores.
pub fn diff_stores(a: &Db, b: &Db) -> DiffSummary {
    DiffEngine::new().diff(a.all_docs(), b.all_docs()).summary
}

/// Diffs two open stores and keeps the records.
pub fn diff_store_report(a: &Db, b: &Db) -> DiffReport<DocInfo> {
    DiffEngine::new().diff(a.all_docs(), b.all_docs())
}

/// Keys of every difference record, rendered lossily.
pub fn difference_keys<T: AsRef<Entry>>(report: &DiffReport<T>) -> Vec<String> {
    report
        .differences()
        .map(|c| String::from_utf8_lossy(c.key()).into_owned())
        .collect()
}

/// Asserts every property a diff of sorted, duplicate-free inputs must hold.
///
/// - one record per distinct key of A ∪ B, in ascending key order
/// - counters partition each side
/// - each record agrees with a map-based reference classification
pub fn assert_diff_invariants(a: &[Entry], b: &[Entry]) {
    let report = DiffEngine::new().diff(a, b);
    let summary = report.summary;

    assert_eq!(summary.entries_a(), a.len() as u64, "A not partitioned");
    assert_eq!(summary.entries_b(), b.len() as u64, "B not partitioned");

    for pair in report.classifications.windows(2) {
        assert_eq!(
            compare_keys(pair[0].key(), pair[1].key()),
            Ordering::Less,
            "records out of order"
        );
    }

    let map_a: BTreeMap<&[u8], &Entry> = a.iter().map(|e| (e.key(), e)).collect();
    let map_b: BTreeMap<&[u8], &Entry> = b.iter().map(|e| (e.key(), e)).collect();
    let mut keys: Vec<&[u8]> = map_a.keys().chain(map_b.keys()).copied().collect();
    keys.sort_unstable();
    keys.dedup();
    assert_eq!(report.classifications.len(), keys.len(), "record count");

    for (record, key) in report.classifications.iter().zip(keys) {
        assert_eq!(record.key(), key);
        match (map_a.get(key), map_b.get(key), record) {
            (Some(_), None, DiffClassification::OnlyInA(_))
            | (None, Some(_), DiffClassification::OnlyInB(_)) => {}
            (Some(ea), Some(eb), DiffClassification::Same(..)) => {
                assert_eq!(ea.fingerprint(), eb.fingerprint());
            }
            (Some(ea), Some(eb), DiffClassification::Changed(..)) => {
                assert_ne!(ea.fingerprint(), eb.fingerprint());
            }
            (in_a, in_b, other) => panic!(
                "key {:?}: in A {}, in B {}, classified {:?}",
                String::from_utf8_lossy(key),
                in_a.is_some(),
                in_b.is_some(),
                other
            ),
        }
    }
}

/// Swaps the sides of a summary.
pub fn mirrored(summary: DiffSummary) -> DiffSummary {
    DiffSummary {
        only_a: summary.only_b,
        only_b: summary.only_a,
        ..summary
    }
}
