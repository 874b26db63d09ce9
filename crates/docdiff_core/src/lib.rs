//! # docdiff core
//!
//! The sorted-key diff engine behind `docdiff diff`.
//!
//! Given two entry sequences that are already sorted by key, the engine walks
//! both with one cursor each and classifies every key as only in A, only in
//! B, changed, or the same. It is a single merge-join pass: no index is
//! built, no document body is read, and no I/O happens here.
//!
//! - [`key`] - byte-wise key collation ([`KeyOrdering`], [`RawKeyOrdering`])
//! - [`entry`] - the metadata record the engine compares ([`Entry`])
//! - [`diff`] - the merge itself ([`DiffEngine`], [`DiffIter`])
//!
//! ```rust
//! use docdiff_core::{diff, Entry, VersionFingerprint};
//!
//! let a = vec![Entry::new("a", VersionFingerprint::new(1, 10))];
//! let b = vec![Entry::new("a", VersionFingerprint::new(2, 11))];
//!
//! let report = diff(&a, &b);
//! assert_eq!(report.summary.changed, 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod diff;
pub mod entry;
mod error;
pub mod key;

pub use diff::{diff, DiffClassification, DiffEngine, DiffIter, DiffReport, DiffSummary};
pub use entry::{Entry, VersionFingerprint};
pub use error::{CoreError, CoreResult};
pub use key::{check_sorted, compare_keys, KeyOrdering, RawKeyOrdering};

/// Crate version, reported by `docdiff version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
