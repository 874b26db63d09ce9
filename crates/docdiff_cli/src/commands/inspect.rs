//! Inspect command implementation.

use docdiff_store::{Db, Header, StoreConfig};
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

/// Store inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Store path.
    pub path: String,
    /// File size in bytes.
    pub file_size: u64,
    /// Number of complete headers.
    pub header_count: usize,
    /// The newest header.
    pub current: HeaderInfo,
    /// Every header, oldest first (if requested).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<HeaderInfo>>,
}

/// Statistics for a single header.
#[derive(Debug, Serialize)]
pub struct HeaderInfo {
    /// File offset of the header.
    pub position: u64,
    /// Update sequence.
    pub update_seq: u64,
    /// Live documents.
    pub doc_count: u64,
    /// Deleted documents.
    pub deleted_count: u64,
    /// Offset of the index block.
    pub index_pos: u64,
    /// Names of the local documents.
    pub local_docs: Vec<String>,
}

impl From<&Header> for HeaderInfo {
    fn from(header: &Header) -> Self {
        Self {
            position: header.position,
            update_seq: header.update_seq,
            doc_count: header.doc_count,
            deleted_count: header.deleted_count,
            index_pos: header.index_pos,
            local_docs: header.local_docs.iter().map(|d| d.name.clone()).collect(),
        }
    }
}

/// Runs the inspect command.
pub fn run(
    path: &Path,
    show_headers: bool,
    format: &str,
    config: &StoreConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = Db::open(path, config)?;
    let result = inspect(&db, show_headers)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        "json" => {
            serde_json::to_writer_pretty(&mut out, &result)?;
            writeln!(out)?;
        }
        _ => {
            print_text_output(&mut out, &result)?;
        }
    }

    Ok(())
}

/// Gathers statistics for the selected header of `db`.
pub fn inspect(db: &Db, show_headers: bool) -> Result<InspectResult, Box<dyn std::error::Error>> {
    Ok(InspectResult {
        path: db.path().to_string(),
        file_size: db.file_size()?,
        header_count: db.headers().len(),
        current: HeaderInfo::from(db.header()),
        headers: show_headers.then(|| db.headers().iter().map(HeaderInfo::from).collect()),
    })
}

fn print_text_output<W: Write>(out: &mut W, result: &InspectResult) -> io::Result<()> {
    writeln!(out, "docdiff Store Inspection")?;
    writeln!(out, "========================")?;
    writeln!(out)?;
    writeln!(out, "Path: {}", result.path)?;
    writeln!(out, "Size: {} bytes", format_size(result.file_size))?;
    writeln!(out, "Headers: {}", result.header_count)?;
    writeln!(out)?;
    writeln!(out, "Current header:")?;
    print_header(out, &result.current)?;

    if let Some(headers) = &result.headers {
        writeln!(out)?;
        writeln!(out, "History (oldest first):")?;
        for header in headers {
            writeln!(
                out,
                "  @{} seq {} ({} live, {} deleted)",
                header.position, header.update_seq, header.doc_count, header.deleted_count
            )?;
        }
    }
    Ok(())
}

fn print_header<W: Write>(out: &mut W, header: &HeaderInfo) -> io::Result<()> {
    writeln!(out, "  Position:      {}", header.position)?;
    writeln!(out, "  Update seq:    {}", header.update_seq)?;
    writeln!(out, "  Live docs:     {}", header.doc_count)?;
    writeln!(out, "  Deleted docs:  {}", header.deleted_count)?;
    writeln!(out, "  Index at:      {}", header.index_pos)?;
    if !header.local_docs.is_empty() {
        writeln!(out, "  Local docs:    {}", header.local_docs.join(", "))?;
    }
    Ok(())
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{}", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docdiff_testkit::{history_store, sample_pair};

    #[test]
    fn inspect_history_store() {
        let store = history_store();
        let db = store.open();
        let result = inspect(&db, true).unwrap();

        assert_eq!(result.header_count, 3);
        assert_eq!(result.current.update_seq, 5);
        assert_eq!(result.current.doc_count, 2);
        assert_eq!(result.current.deleted_count, 1);
        let seqs: Vec<u64> = result.headers.unwrap().iter().map(|h| h.update_seq).collect();
        assert_eq!(seqs, vec![2, 4, 5]);
    }

    #[test]
    fn text_output_lists_local_docs() {
        let pair = sample_pair();
        let result = inspect(&pair.open_a(), false).unwrap();
        let mut out = Vec::new();
        print_text_output(&mut out, &result).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Headers: 1\n"));
        assert!(text.contains("  Live docs:     8\n"));
        assert!(text.contains("  Local docs:    _local/vbstate\n"));
        assert!(!text.contains("History"));
    }

    #[test]
    fn format_sizes() {
        assert_eq!(format_size(512), "512");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
