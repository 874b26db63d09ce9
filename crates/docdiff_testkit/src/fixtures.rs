//! Store file fixtures.
//!
//! Every fixture lives in its own temporary directory, removed when the
//! fixture is dropped.

use docdiff_store::{Db, DbWriter, NewDoc, RevMeta, StoreConfig, VBSTATE_LOCAL_DOC};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A store file in a temporary directory.
pub struct TestStore {
    path: PathBuf,
    _temp_dir: TempDir,
}

impl TestStore {
    /// Writes a store with one commit holding `docs`.
    pub fn single_commit(docs: impl IntoIterator<Item = NewDoc>) -> Self {
        Self::with_history(vec![docs.into_iter().collect()])
    }

    /// Writes a store with one commit per element of `commits`.
    pub fn with_history(commits: Vec<Vec<NewDoc>>) -> Self {
        Self::with_history_and_config(commits, &test_config())
    }

    /// Like [`with_history`](Self::with_history) with an explicit config.
    pub fn with_history_and_config(commits: Vec<Vec<NewDoc>>, config: &StoreConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("store.ddb");
        write_store(&path, commits, config);
        Self {
            path,
            _temp_dir: temp_dir,
        }
    }

    /// Path of the store file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens the store read-only at its newest header.
    pub fn open(&self) -> Db {
        Db::open(&self.path, &test_config()).expect("Failed to open test store")
    }

    /// Reopens the store for appending.
    pub fn writer(&self) -> DbWriter {
        DbWriter::create(&self.path, &test_config()).expect("Failed to reopen test store")
    }
}

/// Writes `commits` into a new store at `path`.
pub fn write_store(path: &Path, commits: Vec<Vec<NewDoc>>, config: &StoreConfig) {
    let mut writer = DbWriter::create(path, config).expect("Failed to create store");
    for docs in commits {
        for doc in docs {
            writer.save(doc).expect("Failed to save doc");
        }
        writer.commit().expect("Failed to commit");
    }
}

/// Store configuration used by fixtures: checksummed, unsynced.
pub fn test_config() -> StoreConfig {
    StoreConfig::new().sync_on_commit(false)
}

/// A document with standard rev meta carrying `cas` and a small JSON body.
pub fn doc(key: &str, rev_seq: u64, cas: u64) -> NewDoc {
    let body = serde_json::json!({ "key": key, "rev": rev_seq }).to_string();
    NewDoc::new(key, rev_seq, RevMeta::new(cas, 0, 0)).with_body(body)
}

/// The replication state local document written into sample stores.
pub fn vbstate_json() -> String {
    serde_json::json!({
        "state": "active",
        "checkpoint_id": "0",
        "max_deleted_seqno": "0",
    })
    .to_string()
}

/// Two stores for diff tests.
///
/// | key   | A            | B            | result    |
/// |-------|--------------|--------------|-----------|
/// | bar   | (1, 1000)    |              | only in A |
/// | baz   | (1, 1000)    | (1, 1000)    | same      |
/// | breeze|              | (1, 1000)    | only in B |
/// | car   | (1, 1000)    |              | only in A |
/// | fear  |              | (1, 1000)    | only in B |
/// | foo   | (1, 1000)    | (1, 1000)    | same      |
/// | neat  | (1, 1000)    | (8, 9393)    | changed   |
/// | shelf |              | (8, 9393)    | only in B |
/// | zoop  | (1, 1000)    | (1, 1000)    | same      |
/// | zzbag | (2, 1000)    |              | only in A |
/// | zzhuh | (1, 1000)    |              | only in A |
pub struct SamplePair {
    a: PathBuf,
    b: PathBuf,
    _temp_dir: TempDir,
}

impl SamplePair {
    /// Path of store A.
    pub fn a(&self) -> &Path {
        &self.a
    }

    /// Path of store B.
    pub fn b(&self) -> &Path {
        &self.b
    }

    /// Opens store A.
    pub fn open_a(&self) -> Db {
        Db::open(&self.a, &test_config()).expect("Failed to open store A")
    }

    /// Opens store B.
    pub fn open_b(&self) -> Db {
        Db::open(&self.b, &test_config()).expect("Failed to open store B")
    }
}

/// Writes the [`SamplePair`] stores.
pub fn sample_pair() -> SamplePair {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let a = temp_dir.path().join("a.ddb");
    let b = temp_dir.path().join("b.ddb");

    let mut writer = DbWriter::create(&a, &test_config()).expect("Failed to create store A");
    for d in sample_docs_a() {
        writer.save(d).expect("Failed to save doc");
    }
    writer.set_local(VBSTATE_LOCAL_DOC, vbstate_json());
    writer.commit().expect("Failed to commit");

    let mut writer = DbWriter::create(&b, &test_config()).expect("Failed to create store B");
    for d in sample_docs_b() {
        writer.save(d).expect("Failed to save doc");
    }
    writer.set_local(VBSTATE_LOCAL_DOC, vbstate_json());
    writer.commit().expect("Failed to commit");

    SamplePair {
        a,
        b,
        _temp_dir: temp_dir,
    }
}

/// Documents of sample store A, in write order.
pub fn sample_docs_a() -> Vec<NewDoc> {
    vec![
        doc("foo", 1, 1000),
        doc("bar", 1, 1000),
        doc("baz", 1, 1000),
        doc("neat", 1, 1000),
        doc("car", 1, 1000),
        doc("zoop", 1, 1000),
        doc("zzhuh", 1, 1000),
        doc("zzbag", 2, 1000),
    ]
}

/// Documents of sample store B, in write order. `shelf` is written twice.
pub fn sample_docs_b() -> Vec<NewDoc> {
    vec![
        doc("shelf", 9, 4484),
        doc("shelf", 8, 9393),
        doc("foo", 1, 1000),
        doc("baz", 1, 1000),
        doc("breeze", 1, 1000),
        doc("neat", 8, 9393),
        doc("fear", 1, 1000),
        doc("zoop", 1, 1000),
    ]
}

/// A store with three commits, for history and change scans.
///
/// 1. `alpha`, `beta` (seqs 1, 2)
/// 2. `beta` updated, `gamma` added (seqs 3, 4)
/// 3. `alpha` deleted (seq 5)
pub fn history_store() -> TestStore {
    TestStore::with_history(vec![
        vec![doc("alpha", 1, 100), doc("beta", 1, 101)],
        vec![doc("beta", 2, 102), doc("gamma", 1, 103)],
        vec![NewDoc::new("alpha", 2, RevMeta::new(104, 0, 0)).deleted()],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_commit_store() {
        let store = TestStore::single_commit(vec![doc("a", 1, 1), doc("b", 1, 2)]);
        let db = store.open();
        assert_eq!(db.info().doc_count, 2);
        assert_eq!(db.headers().len(), 1);
    }

    #[test]
    fn test_sample_pair_contents() {
        let pair = sample_pair();
        let a = pair.open_a();
        let b = pair.open_b();

        assert_eq!(a.all_docs().len(), 8);
        assert_eq!(b.all_docs().len(), 7);

        let shelf = b.docinfo_by_id(b"shelf").expect("shelf should exist");
        assert_eq!(shelf.rev_seq(), 8);
        assert!(a.local_doc(VBSTATE_LOCAL_DOC).is_some());
    }

    #[test]
    fn test_history_store_headers() {
        let store = history_store();
        let db = store.open();
        let seqs: Vec<u64> = db.headers().iter().map(|h| h.update_seq).collect();
        assert_eq!(seqs, vec![2, 4, 5]);
        assert_eq!(db.info().deleted_count, 1);
    }

    #[test]
    fn test_reopened_writer_appends() {
        let store = TestStore::single_commit(vec![doc("a", 1, 1)]);
        let mut writer = store.writer();
        writer.save(doc("b", 1, 2)).expect("Failed to save");
        writer.commit().expect("Failed to commit");

        let db = store.open();
        assert_eq!(db.headers().len(), 2);
        assert_eq!(db.info().doc_count, 2);
    }
}
