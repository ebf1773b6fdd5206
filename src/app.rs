use std::fs;

use camino::Utf8PathBuf;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::client::{DEFAULT_OVERLAP_FEATURES, EnsemblClient, overlap_query_tail, serialize_ids};
use crate::error::SnpfetchError;
use crate::extract::{extract, keyed_records};
use crate::features::{Feature, RequestedFeatures};
use crate::input;
use crate::report::{self, OverlapBlock, SnpSummary};

/// Where the SNP identifiers come from: a plain list file (one id per
/// line) or a cohort JSON file.
#[derive(Debug, Clone)]
pub enum SnpSource {
    List(Utf8PathBuf),
    Cohort(Utf8PathBuf),
}

impl SnpSource {
    fn path(&self) -> &Utf8PathBuf {
        match self {
            SnpSource::List(path) | SnpSource::Cohort(path) => path,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub source: SnpSource,
    pub features: Option<RequestedFeatures>,
    pub out_prefix: Option<String>,
    pub dump_file: Option<Utf8PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub ids_queried: usize,
    pub records_decoded: usize,
    pub summary_rows: usize,
    pub overlap_blocks: usize,
    pub failed_lookups: usize,
    pub summary_path: String,
    pub overlap_path: String,
    pub dump_path: Option<String>,
    pub dumped_entries: Option<usize>,
}

/// The fields the summary report pulls from each variation record.
pub fn summary_features() -> RequestedFeatures {
    RequestedFeatures::new(vec![
        Feature::plain("id"),
        Feature::nested("mappings", vec!["location".to_string()]),
        Feature::plain("MAF"),
        Feature::plain("most_severe_consequence"),
    ])
}

pub struct App<C: EnsemblClient> {
    client: C,
}

impl<C: EnsemblClient> App<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// The whole pipeline: gather identifiers, post one batched query,
    /// extract the requested fields, write the summary, then look up and
    /// report overlaps per mapped location. Degradable steps log and
    /// continue; only transport and report-writing failures abort.
    pub fn run(&self, options: RunOptions) -> Result<RunResult, SnpfetchError> {
        let ids = self.gather_ids(&options.source)?;
        info!(count = ids.len(), "querying variation records");

        let payload = serialize_ids(&ids)?;
        let decoded = self.client.post_variants(&payload)?;
        let records = keyed_records(&decoded)?;

        let spec = options.features.clone().unwrap_or_else(summary_features);
        let results = extract(&records, &spec);

        let prefix = options
            .out_prefix
            .clone()
            .unwrap_or_else(|| derive_prefix(&options.source));
        let summary_path = Utf8PathBuf::from(format!("{prefix}_SNP_summary.txt"));
        let overlap_path = Utf8PathBuf::from(format!("{prefix}_overlap_results.txt"));

        let rows = summary_rows(&results);
        report::write_snp_summary(&summary_path, &rows)?;
        info!(rows = rows.len(), path = %summary_path, "wrote SNP summary");

        let (dump_path, dumped_entries) = match &options.dump_file {
            Some(path) => {
                let written = report::append_results(path, &results)?;
                (Some(path.to_string()), Some(written))
            }
            None => (None, None),
        };

        let tail = overlap_query_tail(&DEFAULT_OVERLAP_FEATURES);
        let mut blocks = Vec::with_capacity(rows.len());
        let mut failed_lookups = 0usize;
        for row in &rows {
            let block = match self.client.get_overlap(&row.location, &tail) {
                Ok(body) => OverlapBlock {
                    location: row.location.clone(),
                    lines: report::filter_overlap_lines(&body),
                    attempted_url: None,
                },
                Err(err) => {
                    warn!(location = %row.location, "overlap lookup failed: {err}");
                    failed_lookups += 1;
                    OverlapBlock {
                        location: row.location.clone(),
                        lines: Vec::new(),
                        attempted_url: Some(self.client.overlap_url(&row.location, &tail)),
                    }
                }
            };
            blocks.push(block);
        }
        report::write_overlap_report(&overlap_path, &blocks)?;
        info!(blocks = blocks.len(), path = %overlap_path, "wrote overlap report");

        Ok(RunResult {
            ids_queried: ids.len(),
            records_decoded: records.len(),
            summary_rows: rows.len(),
            overlap_blocks: blocks.len(),
            failed_lookups,
            summary_path: summary_path.to_string(),
            overlap_path: overlap_path.to_string(),
            dump_path,
            dumped_entries,
        })
    }

    fn gather_ids(&self, source: &SnpSource) -> Result<Vec<String>, SnpfetchError> {
        match source {
            SnpSource::List(path) => {
                let content = fs::read_to_string(path).map_err(|err| SnpfetchError::FileRead {
                    path: path.to_string(),
                    message: err.to_string(),
                })?;
                Ok(content
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string)
                    .collect())
            }
            SnpSource::Cohort(path) => {
                let dataset = input::load(path)?;
                if let Err(err) = dataset.check() {
                    warn!("{err}; continuing with partial cohort data");
                }
                Ok(dataset.snp_list)
            }
        }
    }
}

/// Report prefix from the input file stem: its first two `_`-separated
/// parts (trait and round), or the whole stem when there are fewer.
fn derive_prefix(source: &SnpSource) -> String {
    let stem = source.path().file_stem().unwrap_or("snpfetch");
    let mut parts = stem.split('_');
    match (parts.next(), parts.next()) {
        (Some(first), Some(second)) => format!("{first}_{second}"),
        _ => stem.to_string(),
    }
}

fn summary_rows(results: &[Map<String, Value>]) -> Vec<SnpSummary> {
    let mut rows = Vec::new();
    for entry in results {
        let Some(id) = entry.get("id") else {
            warn!(
                "{}",
                SnpfetchError::RecordHasNoId(serde_json::Value::Object(entry.clone()).to_string())
            );
            continue;
        };
        let Some(location) = entry.get("mappings").and_then(|group| group.get("location")) else {
            warn!(id = %report::render_value(id), "record has no mapped location, skipping row");
            continue;
        };
        rows.push(SnpSummary {
            id: report::render_value(id),
            location: report::render_value(location),
            maf: entry
                .get("MAF")
                .map(report::render_value)
                .unwrap_or_default(),
            most_severe_consequence: entry
                .get("most_severe_consequence")
                .map(report::render_value)
                .unwrap_or_default(),
        });
    }
    rows
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn entry(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn summary_rows_render_fields() {
        let results = vec![entry(json!({
            "id": "rs123",
            "mappings": {"location": "1:100-100"},
            "MAF": 0.1,
            "most_severe_consequence": "intron_variant",
        }))];
        let rows = summary_rows(&results);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "rs123");
        assert_eq!(rows[0].location, "1:100-100");
        assert_eq!(rows[0].maf, "0.1");
        assert_eq!(rows[0].most_severe_consequence, "intron_variant");
    }

    #[test]
    fn summary_rows_skip_idless_and_unmapped_entries() {
        let results = vec![
            entry(json!({"mappings": {"location": "1:100-100"}})),
            entry(json!({"id": "rs456", "MAF": 0.2})),
        ];
        assert!(summary_rows(&results).is_empty());
    }

    #[test]
    fn prefix_from_trait_and_round() {
        let source = SnpSource::List(Utf8PathBuf::from("data/height_round2_hits.txt"));
        assert_eq!(derive_prefix(&source), "height_round2");
    }

    #[test]
    fn prefix_falls_back_to_stem() {
        let source = SnpSource::List(Utf8PathBuf::from("snps.txt"));
        assert_eq!(derive_prefix(&source), "snps");
    }
}
