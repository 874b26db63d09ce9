//! CLI command implementations.

pub mod delta_scan;
pub mod diff;
pub mod dump;
pub mod inspect;
