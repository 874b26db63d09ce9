//! Key collation.
//!
//! Store keys are raw byte strings. They collate byte by byte over the shared
//! prefix, and when one key is a prefix of the other the shorter one sorts
//! first. This is the store's native iteration order, so both input
//! sequences of a diff arrive already sorted this way.

use std::cmp::Ordering;

use crate::entry::Entry;
use crate::error::{CoreError, CoreResult};

/// A total order over raw byte keys.
///
/// The diff engine is generic over this trait so that a store with a
/// different native collation can still be merged; every implementation
/// must agree with the order in which its store enumerates documents.
pub trait KeyOrdering {
    /// Compares two keys.
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering;
}

/// Byte-wise collation: shared prefix first, then length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawKeyOrdering;

impl KeyOrdering for RawKeyOrdering {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        compare_keys(a, b)
    }
}

/// Compares two keys with the store's native collation.
///
/// ```rust
/// use std::cmp::Ordering;
/// use docdiff_core::compare_keys;
///
/// assert_eq!(compare_keys(b"bar", b"baz"), Ordering::Less);
/// assert_eq!(compare_keys(b"zz", b"zzbag"), Ordering::Less);
/// assert_eq!(compare_keys(b"", b""), Ordering::Equal);
/// ```
#[must_use]
pub fn compare_keys(a: &[u8], b: &[u8]) -> Ordering {
    let shared = a.len().min(b.len());
    match a[..shared].cmp(&b[..shared]) {
        Ordering::Equal => a.len().cmp(&b.len()),
        other => other,
    }
}

/// Checks that `entries` never regress under `ordering`.
///
/// Adjacent duplicates are accepted. The diff engine does not call this; it
/// is for callers that build their inputs from a source they do not trust.
///
/// # Errors
///
/// Returns [`CoreError::OutOfOrder`] naming the first entry whose key sorts
/// before its predecessor.
pub fn check_sorted<T, O>(entries: &[T], ordering: &O) -> CoreResult<()>
where
    T: AsRef<Entry>,
    O: KeyOrdering + ?Sized,
{
    for (position, pair) in entries.windows(2).enumerate() {
        let prev = pair[0].as_ref().key();
        let next = pair[1].as_ref().key();
        if ordering.compare(prev, next) == Ordering::Greater {
            return Err(CoreError::out_of_order(position + 1, next));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::VersionFingerprint;
    use proptest::prelude::*;

    fn entries(keys: &[&str]) -> Vec<Entry> {
        keys.iter()
            .map(|k| Entry::new(*k, VersionFingerprint::new(1, 1)))
            .collect()
    }

    #[test]
    fn prefix_sorts_first() {
        assert_eq!(compare_keys(b"foo", b"foobar"), Ordering::Less);
        assert_eq!(compare_keys(b"foobar", b"foo"), Ordering::Greater);
    }

    #[test]
    fn differing_byte_dominates_length() {
        assert_eq!(compare_keys(b"b", b"abcdef"), Ordering::Greater);
        assert_eq!(compare_keys(b"abcdef", b"b"), Ordering::Less);
    }

    #[test]
    fn bytes_compare_unsigned() {
        assert_eq!(compare_keys(&[0x7f], &[0x80]), Ordering::Less);
        assert_eq!(compare_keys(&[0xff, 0x00], &[0xff]), Ordering::Greater);
    }

    #[test]
    fn case_is_not_folded() {
        assert_eq!(compare_keys(b"Zebra", b"apple"), Ordering::Less);
    }

    #[test]
    fn empty_key_is_smallest() {
        assert_eq!(compare_keys(b"", b"\0"), Ordering::Less);
        assert_eq!(RawKeyOrdering.compare(b"", b""), Ordering::Equal);
    }

    #[test]
    fn check_sorted_accepts_duplicates() {
        assert!(check_sorted(&entries(&["a", "a", "b"]), &RawKeyOrdering).is_ok());
        assert!(check_sorted(&entries(&[]), &RawKeyOrdering).is_ok());
    }

    #[test]
    fn check_sorted_reports_first_regression() {
        let err = check_sorted(&entries(&["a", "c", "b", "a"]), &RawKeyOrdering).unwrap_err();
        assert_eq!(
            err,
            CoreError::OutOfOrder {
                position: 2,
                key: "b".to_string()
            }
        );
    }

    proptest! {
        #[test]
        fn agrees_with_slice_order(a in prop::collection::vec(any::<u8>(), 0..16),
                                   b in prop::collection::vec(any::<u8>(), 0..16)) {
            prop_assert_eq!(compare_keys(&a, &b), a.as_slice().cmp(b.as_slice()));
        }

        #[test]
        fn antisymmetric(a in prop::collection::vec(any::<u8>(), 0..8),
                         b in prop::collection::vec(any::<u8>(), 0..8)) {
            prop_assert_eq!(compare_keys(&a, &b), compare_keys(&b, &a).reverse());
        }
    }
}
