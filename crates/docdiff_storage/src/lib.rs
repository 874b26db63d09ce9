//! # docdiff storage
//!
//! Byte-store backends underneath the docdiff store file format.
//!
//! Backends are **opaque byte stores**: they read ranges, append and flush.
//! Block framing, headers and document infos live in `docdiff_store`; this
//! crate never interprets the bytes it holds.
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - Scratch stores and crash replay for tests
//! - [`FileBackend`] - Store files on disk, writable or read-only
//!
//! ## Example
//!
//! ```rust
//! use docdiff_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! let offset = backend.append(b"block").unwrap();
//! assert_eq!(backend.read_at(offset, 5).unwrap(), b"block");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
