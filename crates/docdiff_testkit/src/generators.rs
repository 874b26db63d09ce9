//! Property-based test generators using proptest.
//!
//! Key alphabets are kept small so that independently generated lists
//! share keys often; a `BTreeMap<Vec<u8>, _>` orders keys exactly like
//! [`RawKeyOrdering`](docdiff_core::RawKeyOrdering), which keeps every
//! generated list sorted and duplicate free.

use docdiff_core::{Entry, VersionFingerprint};
use docdiff_store::{NewDoc, RevMeta};
use proptest::prelude::*;

/// Strategy for document keys: short, byte-valued, prefix-heavy.
pub fn key_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop_oneof![3 => b'a'..=b'd', 1 => any::<u8>()], 0..6)
}

/// Strategy for fingerprints drawn from a narrow range so collisions occur.
pub fn fingerprint_strategy() -> impl Strategy<Value = VersionFingerprint> {
    (0u64..3, 0u64..3).prop_map(|(rev_seq, cas)| VersionFingerprint::new(rev_seq, cas))
}

/// Strategy for a sorted, duplicate-free entry list.
pub fn sorted_entries_strategy(max_len: usize) -> impl Strategy<Value = Vec<Entry>> {
    prop::collection::btree_map(key_strategy(), fingerprint_strategy(), 0..max_len)
        .prop_map(|map| map.into_iter().map(|(k, fp)| Entry::new(k, fp)).collect())
}

/// Where a key of an [`entry_pair_strategy`] pair ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Only in A.
    OnlyA,
    /// Only in B.
    OnlyB,
    /// In both with the same fingerprint.
    Same,
    /// In both, fingerprints drawn independently.
    Both,
}

fn placement_strategy() -> impl Strategy<Value = Placement> {
    prop_oneof![
        Just(Placement::OnlyA),
        Just(Placement::OnlyB),
        Just(Placement::Same),
        Just(Placement::Both),
    ]
}

/// Strategy for two sorted entry lists with overlapping keys.
pub fn entry_pair_strategy(max_len: usize) -> impl Strategy<Value = (Vec<Entry>, Vec<Entry>)> {
    prop::collection::btree_map(
        key_strategy(),
        (placement_strategy(), fingerprint_strategy(), fingerprint_strategy()),
        0..max_len,
    )
    .prop_map(|map| {
        let mut a = Vec::new();
        let mut b = Vec::new();
        for (key, (placement, fa, fb)) in map {
            match placement {
                Placement::OnlyA => a.push(Entry::new(key, fa)),
                Placement::OnlyB => b.push(Entry::new(key, fb)),
                Placement::Same => {
                    a.push(Entry::new(key.clone(), fa));
                    b.push(Entry::new(key, fa));
                }
                Placement::Both => {
                    a.push(Entry::new(key.clone(), fa));
                    b.push(Entry::new(key, fb));
                }
            }
        }
        (a, b)
    })
}

/// Strategy for documents to write into a store.
pub fn new_doc_strategy() -> impl Strategy<Value = NewDoc> {
    (
        key_strategy(),
        1u64..4,
        0u64..4,
        any::<bool>(),
        prop::option::of(prop::collection::vec(any::<u8>(), 0..64)),
    )
        .prop_map(|(key, rev_seq, cas, deleted, body)| {
            let mut doc = NewDoc::new(key, rev_seq, RevMeta::new(cas, 0, 0));
            doc.deleted = deleted;
            doc.body = body;
            doc
        })
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
