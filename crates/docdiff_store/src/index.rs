//! Index blocks: a full by-key snapshot of doc infos.
//!
//! ```text
//! | count u32 | doc info * count |
//! ```

use crate::codec::ByteReader;
use crate::docinfo::DocInfo;
use crate::error::StoreResult;

/// Encodes doc infos, already sorted by key, as an index payload.
pub(crate) fn encode_index<'a>(docs: impl ExactSizeIterator<Item = &'a DocInfo>) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&(docs.len() as u32).to_le_bytes());
    for doc in docs {
        doc.encode(&mut buf);
    }
    buf
}

/// Decodes an index payload read from the block at `offset`.
pub(crate) fn decode_index(payload: &[u8], offset: u64) -> StoreResult<Vec<DocInfo>> {
    let mut reader = ByteReader::new(payload, offset);
    let count = reader.u32()? as usize;
    let mut docs = Vec::with_capacity(count.min(payload.len()));
    for _ in 0..count {
        docs.push(DocInfo::decode(&mut reader)?);
    }
    reader.finish()?;
    Ok(docs)
}
