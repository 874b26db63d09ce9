//! Rendering of single documents, shared by the commands.

use docdiff_store::{Db, DocInfo, DocReadMode};
use serde::Serialize;
use std::io::{self, Write};

/// JSON view of one document version.
///
/// Sequence numbers and CAS are strings so 64-bit values survive JSON
/// readers that parse numbers as doubles.
#[derive(Debug, Serialize)]
pub struct DocDump {
    /// Store sequence of the write.
    pub db_seq: String,
    /// CAS, present when the rev meta has the standard layout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cas: Option<String>,
    /// Expiry, present with `cas`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<u32>,
    /// Flags, present with `cas`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u32>,
    /// Set for deletions.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deleted: bool,
    /// Revision sequence.
    pub rev: u64,
    /// Raw content meta byte.
    pub cmeta: u8,
    /// Set when the stored body was compressed.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub compressed: bool,
    /// Body as lossy UTF-8: absent unless requested, `null` when unreadable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Option<String>>,
}

impl DocDump {
    /// Builds the dump of `info`, reading its body from `db` when `with_body`.
    pub fn new(db: &Db, info: &DocInfo, with_body: bool) -> Self {
        let meta = info.parsed_rev_meta();
        let mut dump = Self {
            db_seq: info.db_seq().to_string(),
            cas: meta.map(|m| m.cas.to_string()),
            expiry: meta.map(|m| m.expiry),
            flags: meta.map(|m| m.flags),
            deleted: info.is_deleted(),
            rev: info.rev_seq(),
            cmeta: info.content_meta().as_byte(),
            compressed: false,
            data: None,
        };

        if with_body {
            match db.open_doc(info, DocReadMode::Decompress) {
                Ok(body) => {
                    dump.compressed = info.content_meta().is_compressed();
                    dump.data = Some(Some(String::from_utf8_lossy(&body).into_owned()));
                }
                Err(e) => {
                    tracing::debug!(key = %String::from_utf8_lossy(info.id()), error = %e, "body unreadable");
                    dump.data = Some(None);
                }
            }
        }

        dump
    }
}

/// Writes the human-readable dump of one document, followed by a blank line.
pub fn write_text<W: Write>(out: &mut W, db: &Db, info: &DocInfo) -> io::Result<()> {
    writeln!(out, "  Doc ID: {}", String::from_utf8_lossy(info.id()))?;
    if info.db_seq() > 0 {
        writeln!(out, "     seq: {}", info.db_seq())?;
    }
    writeln!(out, "     rev: {}", info.rev_seq())?;
    writeln!(out, "     content_meta: {}", info.content_meta().as_byte())?;
    if let Some(meta) = info.parsed_rev_meta() {
        writeln!(
            out,
            "     cas: {}, expiry: {}, flags: {}",
            meta.cas, meta.expiry, meta.flags
        )?;
    }
    if info.is_deleted() {
        writeln!(out, "     doc deleted")?;
    }

    match db.open_doc(info, DocReadMode::Decompress) {
        Ok(body) if info.content_meta().is_compressed() => {
            writeln!(out, "     data: (compressed) {}", String::from_utf8_lossy(&body))?;
        }
        Ok(body) => writeln!(out, "     data: {}", String::from_utf8_lossy(&body))?,
        Err(e) => writeln!(out, "     could not read document body: {e}")?,
    }
    writeln!(out)
}
