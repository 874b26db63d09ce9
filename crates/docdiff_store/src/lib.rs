//! # docdiff store
//!
//! The append-only, key-sorted document store file format inspected by the
//! docdiff tools.
//!
//! A store file is a sequence of checksummed [blocks](block): document
//! bodies, index snapshots and commit headers. Each commit appends a full
//! by-key index followed by a header that points at it, so every header in
//! the file is a self-contained historical snapshot.
//!
//! - [`Db`] opens a file read-only at its newest header and can
//!   [rewind](Db::rewind_header) through older ones.
//! - [`DbWriter`] appends documents and commits; used by fixtures and
//!   benchmarks.
//!
//! ```rust
//! use docdiff_storage::InMemoryBackend;
//! use docdiff_store::{Db, DbWriter, NewDoc, RevMeta, StoreConfig};
//!
//! let config = StoreConfig::default();
//! let mut writer = DbWriter::with_backend(Box::new(InMemoryBackend::new()), &config).unwrap();
//! writer.save(NewDoc::new("foo", 1, RevMeta::new(1000, 0, 0))).unwrap();
//! writer.commit().unwrap();
//!
//! let db = Db::open_backend(writer.into_backend(), "memory", &config).unwrap();
//! assert_eq!(db.info().doc_count, 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod block;
mod codec;
mod config;
mod db;
mod docinfo;
mod error;
mod header;
mod index;
mod writer;

pub use config::StoreConfig;
pub use db::{Db, DbInfo, DocReadMode};
pub use docinfo::{cas_from_rev_meta, BodyRef, ContentMeta, DocInfo, RevMeta};
pub use error::{StoreError, StoreResult};
pub use header::{Header, LocalDoc};
pub use writer::{DbWriter, NewDoc};

/// Name of the local document holding replication state.
pub const VBSTATE_LOCAL_DOC: &str = "_local/vbstate";
