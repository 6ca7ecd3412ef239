//! Report records and the target-list reader.

mod render;

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::ErrorKind;
use crate::orc::Compression;
use crate::probe::ProbeResult;

pub use render::{render, render_csv, render_json_lines, render_table};

/// One report row per input target. Failed targets keep their path and
/// carry the error kind and cause; their numeric fields are empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeRecord {
    pub file_path: String,
    pub file_length: Option<u64>,
    pub num_stripes: Option<u32>,
    pub raw_data_size: Option<u64>,
    pub number_of_rows: Option<u64>,
    pub compression: Option<Compression>,
    pub error_kind: Option<ErrorKind>,
    pub error: Option<String>,
}

impl From<&ProbeResult> for ProbeRecord {
    fn from(result: &ProbeResult) -> Self {
        match &result.outcome {
            Ok(info) => Self {
                file_path: result.target.clone(),
                file_length: Some(info.file_length),
                num_stripes: Some(info.stripe_count),
                raw_data_size: info.raw_data_size,
                number_of_rows: info.number_of_rows,
                compression: Some(info.compression),
                error_kind: None,
                error: None,
            },
            Err(e) => Self {
                file_path: result.target.clone(),
                file_length: None,
                num_stripes: None,
                raw_data_size: None,
                number_of_rows: None,
                compression: None,
                error_kind: Some(e.kind),
                error: Some(e.message.clone()),
            },
        }
    }
}

/// Records in input order.
pub fn records(results: &[ProbeResult]) -> Vec<ProbeRecord> {
    results.iter().map(ProbeRecord::from).collect()
}

/// Report rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned columns for terminals.
    #[default]
    Table,
    Csv,
    /// One JSON object per line.
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "csv" => Ok(OutputFormat::Csv),
            "json" | "jsonl" => Ok(OutputFormat::Json),
            other => Err(format!(
                "unknown format {:?} (expected table, csv or json)",
                other
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Table => "table",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        })
    }
}

/// Parse a target list: one target per line, surrounding whitespace trimmed,
/// blank lines and `#` comments skipped.
pub fn parse_target_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

pub fn read_target_list(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read target list {}", path.display()))?;
    Ok(parse_target_list(&text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use crate::trailer::TrailerInfo;

    #[test]
    fn target_list_skips_blanks_and_comments() {
        let text = "# listing\n s3://b/a.orc \n\n/data/b.orc\n  # indented comment\nfile:///c.orc\n";
        assert_eq!(
            parse_target_list(text),
            vec!["s3://b/a.orc", "/data/b.orc", "file:///c.orc"]
        );
    }

    #[test]
    fn read_target_list_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paths.txt");
        fs::write(&path, "s3://b/a.orc\r\ns3://b/b.orc\r\n").unwrap();
        assert_eq!(
            read_target_list(&path).unwrap(),
            vec!["s3://b/a.orc", "s3://b/b.orc"]
        );
        assert!(read_target_list(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn record_from_success_and_failure() {
        let ok = ProbeResult {
            target: "s3://b/a.orc".to_string(),
            outcome: Ok(TrailerInfo {
                file_length: 9876,
                stripe_count: 5,
                raw_data_size: Some(12345),
                number_of_rows: Some(5000),
                compression: Compression::Zlib,
            }),
        };
        let rec = ProbeRecord::from(&ok);
        assert_eq!(rec.num_stripes, Some(5));
        assert_eq!(rec.error_kind, None);

        let failed = ProbeResult {
            target: "s3://b/gone.orc".to_string(),
            outcome: Err(ProbeError::not_found("HEAD s3://b/gone.orc: HTTP 404")),
        };
        let rec = ProbeRecord::from(&failed);
        assert_eq!(rec.file_path, "s3://b/gone.orc");
        assert_eq!(rec.file_length, None);
        assert_eq!(rec.error_kind, Some(ErrorKind::NotFound));
    }

    #[test]
    fn output_format_parses() {
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!("jsonl".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
