//! Delta-scan command implementation.
//!
//! Walks the header history of one file from newest to oldest and emits,
//! for each pair of adjacent headers, one JSON line listing the documents
//! written between them.

use crate::commands::dump::DocDump;
use docdiff_store::{Db, StoreConfig, VBSTATE_LOCAL_DOC};
use serde::Serialize;
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::Path;

/// Environment variable that turns on body output when set to any value.
pub const INCLUDE_BODY_ENV: &str = "INCLUDE_DOC_BODY";

/// Bodies are included when the flag is given or the variable is set at
/// all, even to `0` or an empty string.
pub fn body_requested(flag: bool, env: Option<OsString>) -> bool {
    flag || env.is_some()
}

/// One changed document between two headers.
#[derive(Debug, Serialize)]
pub struct ChangeInfo {
    /// Document key, lossy UTF-8.
    pub id: String,
    /// Version as of the newer header.
    pub new: DocDump,
    /// Version as of the older header, `null` if the key did not exist.
    pub previous: Option<DocDump>,
}

/// Changes between two adjacent headers.
#[derive(Debug, Serialize)]
pub struct HeaderDelta {
    /// Offset of the newer header.
    pub pos: String,
    /// Update sequence of the older header.
    pub old_seq: String,
    /// Update sequence of the newer header.
    pub new_seq: String,
    /// Documents written after the older header, in sequence order.
    pub changes: Vec<ChangeInfo>,
    /// Replication state local document of the newer header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vbstate: Option<String>,
}

/// Runs the delta-scan command.
pub fn run(
    path: &Path,
    include_body: bool,
    config: &StoreConfig,
) -> Result<usize, Box<dyn std::error::Error>> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let count = scan(path, include_body, config, &mut out)?;
    out.flush()?;
    eprintln!("Total headers found: {count}");
    Ok(count)
}

/// Writes one JSON line per adjacent header pair; returns the pair count.
pub fn scan<W: Write>(
    path: &Path,
    include_body: bool,
    config: &StoreConfig,
    out: &mut W,
) -> Result<usize, Box<dyn std::error::Error>> {
    let mut current = Db::open(path, config)?;
    let mut previous = Db::open(path, config)?;
    let mut count = 0;

    while previous.rewind_header()? {
        count += 1;
        let delta = header_delta(&current, &previous, include_body);
        serde_json::to_writer(&mut *out, &delta)?;
        writeln!(out)?;
        current.rewind_header()?;
    }

    Ok(count)
}

/// Collects the changes `current` holds over `previous`.
pub fn header_delta(current: &Db, previous: &Db, include_body: bool) -> HeaderDelta {
    let since = previous.header().update_seq.saturating_add(1);
    let changes = current
        .changes_since(since)
        .into_iter()
        .map(|info| ChangeInfo {
            id: String::from_utf8_lossy(info.id()).into_owned(),
            new: DocDump::new(current, info, include_body),
            previous: previous
                .docinfo_by_id(info.id())
                .map(|old| DocDump::new(previous, old, include_body)),
        })
        .collect();

    HeaderDelta {
        pos: current.header().position.to_string(),
        old_seq: previous.header().update_seq.to_string(),
        new_seq: current.header().update_seq.to_string(),
        changes,
        vbstate: current.local_doc(VBSTATE_LOCAL_DOC).map(str::to_string),
    }
}
