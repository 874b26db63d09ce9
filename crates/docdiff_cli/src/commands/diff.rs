//! Diff command implementation.

use crate::commands::dump::{write_text, DocDump};
use docdiff_core::{DiffClassification, DiffEngine, DiffSummary};
use docdiff_store::{Db, StoreConfig};
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

/// One differing key in JSON output.
#[derive(Debug, Serialize)]
pub struct DifferenceInfo {
    /// `only_in_a`, `only_in_b` or `changed`.
    pub kind: &'static str,
    /// Document key, lossy UTF-8.
    pub key: String,
    /// Version in A.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub a: Option<DocDump>,
    /// Version in B.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b: Option<DocDump>,
}

/// Full diff result in JSON output.
#[derive(Debug, Serialize)]
pub struct DiffResult {
    /// Path of A.
    pub file_a: String,
    /// Path of B.
    pub file_b: String,
    /// Entries (live and deleted) in A.
    pub entries_a: u64,
    /// Entries (live and deleted) in B.
    pub entries_b: u64,
    /// Every non-identical key, in key order.
    pub differences: Vec<DifferenceInfo>,
    /// Counters.
    pub summary: DiffSummary,
}

/// Runs the diff command.
pub fn run(
    file_a: &Path,
    file_b: &Path,
    format: &str,
    config: &StoreConfig,
) -> Result<DiffSummary, Box<dyn std::error::Error>> {
    let a = Db::open(file_a, config)?;
    let b = Db::open(file_b, config)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let summary = match format {
        "json" => write_json(&mut out, &a, &b)?,
        _ => write_text_diff(&mut out, &a, &b)?,
    };
    out.flush()?;
    Ok(summary)
}

/// Streams the human-readable report of `a` against `b`.
pub fn write_text_diff<W: Write>(
    out: &mut W,
    a: &Db,
    b: &Db,
) -> Result<DiffSummary, Box<dyn std::error::Error>> {
    writeln!(out, "Found {} entries in {}", a.header().entry_count(), a.path())?;
    writeln!(out, "Found {} entries in {}", b.header().entry_count(), b.path())?;
    writeln!(out)?;

    let engine = DiffEngine::new();
    let mut iter = engine.iter(a.all_docs(), b.all_docs());
    for classification in iter.by_ref() {
        match classification {
            DiffClassification::OnlyInA(info) => {
                writeln!(out, "Entry only in {}", a.path())?;
                write_text(out, a, &info)?;
            }
            DiffClassification::OnlyInB(info) => {
                writeln!(out, "Entry only in {}", b.path())?;
                write_text(out, b, &info)?;
            }
            DiffClassification::Changed(in_a, in_b) => {
                writeln!(out, "(+-) Entry differs between files")?;
                writeln!(out, "  in {}:", a.path())?;
                write_text(out, a, &in_a)?;
                writeln!(out, "  in {}:", b.path())?;
                write_text(out, b, &in_b)?;
            }
            DiffClassification::Same(..) => {}
        }
    }
    let summary = iter.summary();

    writeln!(out, "{} entries only in {}", summary.only_a, a.path())?;
    writeln!(out, "{} entries only in {}", summary.only_b, b.path())?;
    writeln!(out, "{} entries in both files differed", summary.changed)?;
    writeln!(out, "{} entries were similar", summary.same)?;
    writeln!(out, "{} total differences", summary.total_differences())?;
    Ok(summary)
}

/// Writes the report of `a` against `b` as one JSON document.
pub fn write_json<W: Write>(
    out: &mut W,
    a: &Db,
    b: &Db,
) -> Result<DiffSummary, Box<dyn std::error::Error>> {
    let mut differences = Vec::new();
    let summary = DiffEngine::new().diff_with(a.all_docs(), b.all_docs(), |c| {
        let key = String::from_utf8_lossy(c.key()).into_owned();
        let record = match c {
            DiffClassification::OnlyInA(info) => DifferenceInfo {
                kind: "only_in_a",
                key,
                a: Some(DocDump::new(a, &info, true)),
                b: None,
            },
            DiffClassification::OnlyInB(info) => DifferenceInfo {
                kind: "only_in_b",
                key,
                a: None,
                b: Some(DocDump::new(b, &info, true)),
            },
            DiffClassification::Changed(in_a, in_b) => DifferenceInfo {
                kind: "changed",
                key,
                a: Some(DocDump::new(a, &in_a, true)),
                b: Some(DocDump::new(b, &in_b, true)),
            },
            DiffClassification::Same(..) => return,
        };
        differences.push(record);
    });

    let result = DiffResult {
        file_a: a.path().to_string(),
        file_b: b.path().to_string(),
        entries_a: a.header().entry_count(),
        entries_b: b.header().entry_count(),
        differences,
        summary,
    };
    serde_json::to_writer_pretty(&mut *out, &result)?;
    writeln!(out)?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docdiff_testkit::sample_pair;

    #[test]
    fn text_report_of_sample_pair() {
        let pair = sample_pair();
        let (a, b) = (pair.open_a(), pair.open_b());
        let mut out = Vec::new();
        let summary = write_text_diff(&mut out, &a, &b).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(summary.total_differences(), 8);
        assert!(text.starts_with(&format!(
            "Found 8 entries in {}\nFound 7 entries in {}\n\n",
            a.path(),
            b.path()
        )));
        assert_eq!(text.matches(&format!("Entry only in {}\n", a.path())).count(), 4);
        assert_eq!(text.matches(&format!("Entry only in {}\n", b.path())).count(), 3);
        assert_eq!(text.matches("(+-) Entry differs between files").count(), 1);
        assert!(text.ends_with(&format!(
            "4 entries only in {}\n3 entries only in {}\n1 entries in both files differed\n3 entries were similar\n8 total differences\n",
            a.path(),
            b.path()
        )));
    }

    #[test]
    fn text_report_lists_records_in_key_order() {
        let pair = sample_pair();
        let mut out = Vec::new();
        write_text_diff(&mut out, &pair.open_a(), &pair.open_b()).unwrap();
        let text = String::from_utf8(out).unwrap();

        let ids: Vec<&str> = text
            .lines()
            .filter_map(|l| l.strip_prefix("  Doc ID: "))
            .collect();
        assert_eq!(
            ids,
            vec!["bar", "breeze", "car", "fear", "neat", "neat", "shelf", "zzbag", "zzhuh"]
        );
    }

    #[test]
    fn json_report_of_sample_pair() {
        let pair = sample_pair();
        let mut out = Vec::new();
        write_json(&mut out, &pair.open_a(), &pair.open_b()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(value["entries_a"], 8);
        assert_eq!(value["entries_b"], 7);
        assert_eq!(value["summary"]["only_a"], 4);
        assert_eq!(value["summary"]["changed"], 1);

        let diffs = value["differences"].as_array().unwrap();
        assert_eq!(diffs.len(), 8);
        let neat = diffs.iter().find(|d| d["key"] == "neat").unwrap();
        assert_eq!(neat["kind"], "changed");
        assert_eq!(neat["a"]["rev"], 1);
        assert_eq!(neat["b"]["rev"], 8);
        assert_eq!(neat["b"]["cas"], "9393");
    }

    #[test]
    fn identical_files_report_no_differences() {
        let pair = sample_pair();
        let mut out = Vec::new();
        let summary = write_text_diff(&mut out, &pair.open_a(), &pair.open_a()).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(summary.is_identical());
        assert!(!text.contains("Entry only in"));
        assert!(text.ends_with("8 entries were similar\n0 total differences\n"));
    }
}
