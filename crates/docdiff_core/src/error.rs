//! Error types for docdiff core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors reported by core helpers.
///
/// The merge itself has no error states; these come from the optional
/// precondition check run before a diff.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A key sorts before the key preceding it.
    #[error("entries out of order at position {position}: key {key:?} sorts before its predecessor")]
    OutOfOrder {
        /// Index of the first entry that regresses.
        position: usize,
        /// The offending key, lossily rendered.
        key: String,
    },
}

impl CoreError {
    /// Creates an out-of-order error for the entry at `position`.
    pub fn out_of_order(position: usize, key: &[u8]) -> Self {
        Self::OutOfOrder {
            position,
            key: String::from_utf8_lossy(key).into_owned(),
        }
    }
}
