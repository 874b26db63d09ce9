//! # docdiff testkit
//!
//! Test utilities for docdiff.
//!
//! This crate provides:
//! - Store file fixtures written into temporary directories
//! - Property-based generators for sorted entry lists using proptest
//! - Cross-crate checks that diff real store files end to end
//! - Torn-write and corruption helpers for store files
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docdiff_testkit::prelude::*;
//!
//! #[test]
//! fn sample_pair_differs() {
//!     let pair = sample_pair();
//!     let a = pair.open_a();
//!     let b = pair.open_b();
//!     assert_eq!(diff_stores(&a, &b).total_differences(), 8);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod crash;
pub mod fixtures;
pub mod generators;
pub mod integration;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::crash::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
}

pub use crash::*;
pub use fixtures::*;
pub use generators::*;
pub use integration::*;
