//! Benchmark utilities for docdiff.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod utils;
