//! Entry metadata compared by the diff engine.

use serde::Serialize;
use std::fmt;

/// Identifies one logical mutation of a document.
///
/// `rev_seq` counts mutations of a key; `cas` is the stamp the owning store
/// assigns to each mutation. A `(rev_seq, cas)` pair is never reused for a
/// different document state, so two equal fingerprints are taken to mean
/// equal content without reading either body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct VersionFingerprint {
    /// Revision sequence of the key.
    pub rev_seq: u64,
    /// Compare-and-swap stamp of the mutation.
    pub cas: u64,
}

impl VersionFingerprint {
    /// Creates a fingerprint.
    #[must_use]
    pub const fn new(rev_seq: u64, cas: u64) -> Self {
        Self { rev_seq, cas }
    }
}

impl fmt::Display for VersionFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rev:{}/cas:{}", self.rev_seq, self.cas)
    }
}

/// Lightweight metadata for one document in a store snapshot.
///
/// Entries are immutable after construction. The engine reads only
/// [`key`](Self::key) and [`fingerprint`](Self::fingerprint); the other
/// fields travel along for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entry {
    key: Vec<u8>,
    fingerprint: VersionFingerprint,
    deleted: bool,
    sequence: u64,
    content_flags: u32,
}

impl Entry {
    /// Creates a live entry with sequence 0 and no content flags.
    #[must_use]
    pub fn new(key: impl Into<Vec<u8>>, fingerprint: VersionFingerprint) -> Self {
        Self {
            key: key.into(),
            fingerprint,
            deleted: false,
            sequence: 0,
            content_flags: 0,
        }
    }

    /// Marks the entry as a deletion.
    #[must_use]
    pub const fn with_deleted(mut self, deleted: bool) -> Self {
        self.deleted = deleted;
        self
    }

    /// Sets the store sequence number at which the entry was written.
    #[must_use]
    pub const fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    /// Sets the content flags bitmask.
    #[must_use]
    pub const fn with_content_flags(mut self, content_flags: u32) -> Self {
        self.content_flags = content_flags;
        self
    }

    /// The document key.
    #[must_use]
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// The version fingerprint.
    #[must_use]
    pub const fn fingerprint(&self) -> VersionFingerprint {
        self.fingerprint
    }

    /// Whether the entry records a deletion.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Store sequence number of the write.
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Content flags bitmask.
    #[must_use]
    pub const fn content_flags(&self) -> u32 {
        self.content_flags
    }

    /// The key rendered lossily as UTF-8, for display.
    #[must_use]
    pub fn key_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.key)
    }
}

impl AsRef<Entry> for Entry {
    fn as_ref(&self) -> &Entry {
        self
    }
}
