//! Merge-join diff of two key-sorted entry sequences.
//!
//! ## Algorithm
//!
//! Two cursors, `i` into A and `j` into B, advance monotonically. At every
//! step the keys under the cursors are compared:
//!
//! - A's key is greater: B holds keys that A has already passed. B's cursor
//!   catches up one entry per step, each reported as [`OnlyInB`]. A run of
//!   these steps is the catch-up loop; it ends when B reaches or passes A's
//!   key, or B runs out.
//! - A's key is smaller: the entry under `i` cannot appear later in B, so it
//!   is reported as [`OnlyInA`] and only `i` advances.
//! - Keys are equal: the fingerprints decide between [`Same`] and
//!   [`Changed`], and both cursors advance.
//!
//! Once either side is exhausted the other side's remaining suffix drains as
//! one-sided records. Every entry is classified exactly once, records come
//! out in ascending key order, and no memory beyond the two cursors is used.
//!
//! ## Preconditions
//!
//! Both sequences must be non-decreasing under the engine's
//! [`KeyOrdering`]. This is not checked during the merge: unsorted input
//! produces a wrong classification, never a panic. Use
//! [`check_sorted`](crate::check_sorted) first when the source is untrusted.
//!
//! [`OnlyInA`]: DiffClassification::OnlyInA
//! [`OnlyInB`]: DiffClassification::OnlyInB
//! [`Same`]: DiffClassification::Same
//! [`Changed`]: DiffClassification::Changed

use std::cmp::Ordering;
use std::iter::FusedIterator;

use serde::Serialize;
use tracing::debug;

use crate::entry::Entry;
use crate::key::{KeyOrdering, RawKeyOrdering};

/// How one key compares between the two sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffClassification<T = Entry> {
    /// Present only in A.
    OnlyInA(T),
    /// Present only in B.
    OnlyInB(T),
    /// Present in both with different fingerprints.
    Changed(T, T),
    /// Present in both with equal fingerprints.
    Same(T, T),
}

impl<T: AsRef<Entry>> DiffClassification<T> {
    /// The key this record is about.
    pub fn key(&self) -> &[u8] {
        match self {
            Self::OnlyInA(e) | Self::OnlyInB(e) => e.as_ref().key(),
            Self::Changed(a, _) | Self::Same(a, _) => a.as_ref().key(),
        }
    }

    /// `false` only for [`Same`](Self::Same).
    pub fn is_difference(&self) -> bool {
        !matches!(self, Self::Same(..))
    }

    /// The A-side entry, if any.
    pub fn a(&self) -> Option<&T> {
        match self {
            Self::OnlyInA(a) | Self::Changed(a, _) | Self::Same(a, _) => Some(a),
            Self::OnlyInB(_) => None,
        }
    }

    /// The B-side entry, if any.
    pub fn b(&self) -> Option<&T> {
        match self {
            Self::OnlyInB(b) | Self::Changed(_, b) | Self::Same(_, b) => Some(b),
            Self::OnlyInA(_) => None,
        }
    }
}

/// Counters accumulated over one diff pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    /// Keys present only in A.
    pub only_a: u64,
    /// Keys present only in B.
    pub only_b: u64,
    /// Keys present in both whose fingerprints differ.
    pub changed: u64,
    /// Keys present in both with equal fingerprints.
    pub same: u64,
}

impl DiffSummary {
    /// Everything that is not [`same`](Self::same).
    #[must_use]
    pub const fn total_differences(&self) -> u64 {
        self.only_a + self.only_b + self.changed
    }

    /// Number of A entries accounted for.
    #[must_use]
    pub const fn entries_a(&self) -> u64 {
        self.only_a + self.changed + self.same
    }

    /// Number of B entries accounted for.
    #[must_use]
    pub const fn entries_b(&self) -> u64 {
        self.only_b + self.changed + self.same
    }

    /// Returns `true` when the two sides hold identical metadata.
    #[must_use]
    pub const fn is_identical(&self) -> bool {
        self.total_differences() == 0
    }

    fn record<T>(&mut self, classification: &DiffClassification<T>) {
        match classification {
            DiffClassification::OnlyInA(_) => self.only_a += 1,
            DiffClassification::OnlyInB(_) => self.only_b += 1,
            DiffClassification::Changed(..) => self.changed += 1,
            DiffClassification::Same(..) => self.same += 1,
        }
    }
}

/// The collected result of a full pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffReport<T = Entry> {
    /// Every record, in ascending key order.
    pub classifications: Vec<DiffClassification<T>>,
    /// Final counters.
    pub summary: DiffSummary,
}

impl<T: AsRef<Entry>> DiffReport<T> {
    /// Iterates over the records that are not [`Same`](DiffClassification::Same).
    pub fn differences(&self) -> impl Iterator<Item = &DiffClassification<T>> {
        self.classifications.iter().filter(|c| c.is_difference())
    }
}

/// Merge-join diff engine parameterized by key collation.
///
/// The engine holds no state between calls; one engine can serve any number
/// of concurrent diffs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffEngine<O = RawKeyOrdering> {
    ordering: O,
}

impl DiffEngine {
    /// Creates an engine using the store's byte-wise collation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<O: KeyOrdering> DiffEngine<O> {
    /// Creates an engine with a custom collation.
    pub const fn with_ordering(ordering: O) -> Self {
        Self { ordering }
    }

    /// The collation in use.
    pub const fn ordering(&self) -> &O {
        &self.ordering
    }

    /// Starts a lazy pass over `a` and `b`.
    pub fn iter<'a, T>(&'a self, a: &'a [T], b: &'a [T]) -> DiffIter<'a, T, O>
    where
        T: AsRef<Entry> + Clone,
    {
        DiffIter {
            a,
            b,
            i: 0,
            j: 0,
            ordering: &self.ordering,
            summary: DiffSummary::default(),
        }
    }

    /// Runs a full pass and collects every record.
    pub fn diff<T>(&self, a: &[T], b: &[T]) -> DiffReport<T>
    where
        T: AsRef<Entry> + Clone,
    {
        let mut iter = self.iter(a, b);
        let classifications: Vec<_> = iter.by_ref().collect();
        DiffReport {
            classifications,
            summary: iter.summary(),
        }
    }

    /// Runs a full pass, handing each record to `sink` as it is produced.
    pub fn diff_with<T, F>(&self, a: &[T], b: &[T], mut sink: F) -> DiffSummary
    where
        T: AsRef<Entry> + Clone,
        F: FnMut(DiffClassification<T>),
    {
        let mut iter = self.iter(a, b);
        for classification in iter.by_ref() {
            sink(classification);
        }
        let summary = iter.summary();
        debug!(
            only_a = summary.only_a,
            only_b = summary.only_b,
            changed = summary.changed,
            same = summary.same,
            "diff pass complete"
        );
        summary
    }
}

/// Diffs two sorted sequences with the byte-wise collation.
pub fn diff<T>(a: &[T], b: &[T]) -> DiffReport<T>
where
    T: AsRef<Entry> + Clone,
{
    DiffEngine::new().diff(a, b)
}

/// Lazy sequence of [`DiffClassification`] records.
///
/// Created by [`DiffEngine::iter`]. Counters are updated as records are
/// yielded, so [`summary`](Self::summary) reflects the records consumed so
/// far and [`finish`](Self::finish) drains the rest.
#[derive(Debug)]
pub struct DiffIter<'a, T, O = RawKeyOrdering> {
    a: &'a [T],
    b: &'a [T],
    i: usize,
    j: usize,
    ordering: &'a O,
    summary: DiffSummary,
}

impl<'a, T, O> DiffIter<'a, T, O>
where
    T: AsRef<Entry> + Clone,
    O: KeyOrdering,
{
    /// Counters for the records yielded so far.
    pub fn summary(&self) -> DiffSummary {
        self.summary
    }

    /// Consumes the remaining records and returns the final counters.
    pub fn finish(mut self) -> DiffSummary {
        for _ in self.by_ref() {}
        self.summary
    }

    /// Cursor positions `(i, j)` into A and B.
    pub fn position(&self) -> (usize, usize) {
        (self.i, self.j)
    }

    fn step(&mut self) -> Option<DiffClassification<T>> {
        match (self.a.get(self.i), self.b.get(self.j)) {
            (Some(a), Some(b)) => {
                let (ea, eb) = (a.as_ref(), b.as_ref());
                match self.ordering.compare(ea.key(), eb.key()) {
                    Ordering::Greater => {
                        self.j += 1;
                        Some(DiffClassification::OnlyInB(b.clone()))
                    }
                    Ordering::Less => {
                        self.i += 1;
                        Some(DiffClassification::OnlyInA(a.clone()))
                    }
                    Ordering::Equal => {
                        self.i += 1;
                        self.j += 1;
                        if ea.fingerprint() == eb.fingerprint() {
                            Some(DiffClassification::Same(a.clone(), b.clone()))
                        } else {
                            Some(DiffClassification::Changed(a.clone(), b.clone()))
                        }
                    }
                }
            }
            (Some(a), None) => {
                self.i += 1;
                Some(DiffClassification::OnlyInA(a.clone()))
            }
            (None, Some(b)) => {
                self.j += 1;
                Some(DiffClassification::OnlyInB(b.clone()))
            }
            (None, None) => None,
        }
    }
}

impl<'a, T, O> Iterator for DiffIter<'a, T, O>
where
    T: AsRef<Entry> + Clone,
    O: KeyOrdering,
{
    type Item = DiffClassification<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let classification = self.step()?;
        self.summary.record(&classification);
        Some(classification)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest_a = self.a.len() - self.i;
        let rest_b = self.b.len() - self.j;
        (rest_a.max(rest_b), Some(rest_a + rest_b))
    }
}

impl<'a, T, O> FusedIterator for DiffIter<'a, T, O>
where
    T: AsRef<Entry> + Clone,
    O: KeyOrdering,
{
}
