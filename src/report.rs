use std::fs::{self, OpenOptions};
use std::io::Write;

use camino::Utf8Path;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::SnpfetchError;

const BLOCK_DELIMITER_WIDTH: usize = 80;

/// Response lines dropped from the overlap report: headers with no payload
/// and the noise categories nobody reads.
const DISCARD: [&str; 5] = [
    "alleles: ",
    "clinical_significance: []",
    "clinical_significance: ",
    "- benign",
    "- risk factor",
];

/// One row of the tab-separated SNP summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnpSummary {
    pub id: String,
    pub location: String,
    pub maf: String,
    pub most_severe_consequence: String,
}

/// Filtered overlap lines for one location, or the attempted URL when the
/// lookup failed.
#[derive(Debug, Clone, Serialize)]
pub struct OverlapBlock {
    pub location: String,
    pub lines: Vec<String>,
    pub attempted_url: Option<String>,
}

/// Appends extracted result entries to `path`, each keyed by its required
/// `"id"` field. An entry without one is reported and skipped; the rest of
/// the batch still writes. Returns how many entries were written.
pub fn append_results(
    path: &Utf8Path,
    results: &[Map<String, Value>],
) -> Result<usize, SnpfetchError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path.as_std_path())
        .map_err(|err| report_write(path, err))?;

    let mut written = 0usize;
    for entry in results {
        let Some(id) = entry.get("id") else {
            warn!(
                "{}",
                SnpfetchError::RecordHasNoId(serde_json::Value::Object(entry.clone()).to_string())
            );
            continue;
        };
        writeln!(file, "{}", render_value(id)).map_err(|err| report_write(path, err))?;
        let pretty = serde_json::to_string_pretty(entry)
            .map_err(|err| SnpfetchError::ReportWrite {
                path: path.to_string(),
                message: err.to_string(),
            })?;
        writeln!(file, "{pretty}").map_err(|err| report_write(path, err))?;
        written += 1;
    }
    Ok(written)
}

/// Writes the tab-separated summary: id, location, MAF, most severe
/// consequence.
pub fn write_snp_summary(path: &Utf8Path, rows: &[SnpSummary]) -> Result<(), SnpfetchError> {
    let mut file = fs::File::create(path.as_std_path()).map_err(|err| report_write(path, err))?;
    for row in rows {
        writeln!(
            file,
            "{}\t{}\t{}\t{}",
            row.id, row.location, row.maf, row.most_severe_consequence
        )
        .map_err(|err| report_write(path, err))?;
    }
    Ok(())
}

/// Writes the overlap report: per location either the filtered lines or a
/// could-not-retrieve notice, each block closed by a row of `=`.
pub fn write_overlap_report(
    path: &Utf8Path,
    blocks: &[OverlapBlock],
) -> Result<(), SnpfetchError> {
    let mut file = fs::File::create(path.as_std_path()).map_err(|err| report_write(path, err))?;
    for block in blocks {
        match &block.attempted_url {
            Some(url) => {
                writeln!(file, "Could not retrieve data on: {}", block.location)
                    .map_err(|err| report_write(path, err))?;
                writeln!(file, "Attempted url: {url}").map_err(|err| report_write(path, err))?;
            }
            None => {
                for line in &block.lines {
                    writeln!(file, "{line}").map_err(|err| report_write(path, err))?;
                }
            }
        }
        writeln!(file, "{}", "=".repeat(BLOCK_DELIMITER_WIDTH))
            .map_err(|err| report_write(path, err))?;
    }
    Ok(())
}

/// Keeps the indented payload lines of an overlap response body, left
/// trimmed, dropping empties, the discard set, and single-allele rows.
pub fn filter_overlap_lines(body: &str) -> Vec<String> {
    let allele_row = Regex::new(r"^- [ACGT]$").unwrap();
    body.lines()
        .filter(|line| line.starts_with(' '))
        .map(str::trim_start)
        .filter(|line| !line.is_empty())
        .filter(|line| !DISCARD.contains(line))
        .filter(|line| !allele_row.is_match(line))
        .map(str::to_string)
        .collect()
}

/// Renders a JSON value for a report cell: strings bare, everything else in
/// JSON notation.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn report_write(path: &Utf8Path, err: std::io::Error) -> SnpfetchError {
    SnpfetchError::ReportWrite {
        path: path.to_string(),
        message: err.to_string(),
    }
}
