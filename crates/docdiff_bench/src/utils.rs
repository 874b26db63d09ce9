//! Benchmark data generation.
//!
//! All generators take a seed so runs are comparable.

use docdiff_core::{Entry, VersionFingerprint};
use docdiff_storage::{InMemoryBackend, StorageBackend};
use docdiff_store::{DbWriter, NewDoc, RevMeta, StoreConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

/// Generate random bytes of the specified size.
pub fn random_data(rng: &mut StdRng, size: usize) -> Vec<u8> {
    (0..size).map(|_| rng.gen()).collect()
}

/// Generate a random alphanumeric key, 8 to 24 bytes long.
pub fn random_key(rng: &mut StdRng) -> Vec<u8> {
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let len = rng.gen_range(8..=24);
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())])
        .collect()
}

/// Generate `count` sorted entries with distinct keys.
pub fn sorted_entries(count: usize, seed: u64) -> Vec<Entry> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut map = BTreeMap::new();
    while map.len() < count {
        let fp = VersionFingerprint::new(rng.gen_range(1..10), rng.gen());
        map.insert(random_key(&mut rng), fp);
    }
    map.into_iter().map(|(k, fp)| Entry::new(k, fp)).collect()
}

/// Derive a second side from `base`.
///
/// Each entry is dropped with probability `drop_ratio`, otherwise kept
/// and given a new fingerprint with probability `change_ratio`. About
/// `drop_ratio * base.len()` fresh keys are added.
pub fn derived_side(base: &[Entry], drop_ratio: f64, change_ratio: f64, seed: u64) -> Vec<Entry> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut map: BTreeMap<Vec<u8>, VersionFingerprint> = BTreeMap::new();

    for entry in base {
        if rng.gen_bool(drop_ratio) {
            continue;
        }
        let mut fp = entry.fingerprint();
        if rng.gen_bool(change_ratio) {
            fp = VersionFingerprint::new(fp.rev_seq + 1, rng.gen());
        }
        map.insert(entry.key().to_vec(), fp);
    }

    let fresh = (base.len() as f64 * drop_ratio) as usize;
    for _ in 0..fresh {
        map.insert(random_key(&mut rng), VersionFingerprint::new(1, rng.gen()));
    }

    map.into_iter().map(|(k, fp)| Entry::new(k, fp)).collect()
}

/// Write `count` documents with `body_size`-byte bodies into an in-memory
/// store of one commit and return the file image.
pub fn store_image(count: usize, body_size: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let config = StoreConfig::new().sync_on_commit(false);
    let mut writer = DbWriter::with_backend(Box::new(InMemoryBackend::new()), &config)
        .expect("Failed to create writer");

    for _ in 0..count {
        let key = random_key(&mut rng);
        let body = random_data(&mut rng, body_size);
        let doc = NewDoc::new(key, 1, RevMeta::new(rng.gen(), 0, 0)).with_body(body);
        writer.save(doc).expect("Failed to save doc");
    }
    writer.commit().expect("Failed to commit");

    let backend = writer.into_backend();
    let size = backend.size().expect("Failed to size store") as usize;
    backend.read_at(0, size).expect("Failed to read store")
}
