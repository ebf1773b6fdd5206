use std::fs;

use camino::Utf8Path;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::SnpfetchError;

/// Flattened views over a cohort input file: the subcohort names, every
/// analysis object, and every SNP identifier found inside the analyses.
#[derive(Debug, Clone, Default)]
pub struct CohortDataset {
    pub subcohorts: Vec<String>,
    pub analyses: Vec<Value>,
    pub snp_list: Vec<String>,
}

impl CohortDataset {
    /// Distinguishes the empty degradations; the dataset itself stays
    /// usable whatever this returns.
    pub fn check(&self) -> Result<(), SnpfetchError> {
        if self.subcohorts.is_empty() {
            return Err(SnpfetchError::JsonIsEmpty);
        }
        if self.analyses.is_empty() {
            return Err(SnpfetchError::NoAnalysesFound);
        }
        if self.snp_list.is_empty() {
            return Err(SnpfetchError::NoSnpsToQuery);
        }
        Ok(())
    }
}

/// Reads and flattens a cohort file: a JSON object mapping subcohort names
/// to collections of analysis objects whose values hold SNP identifier
/// strings at any depth. Traversal follows the parsed object's key order.
pub fn load(path: &Utf8Path) -> Result<CohortDataset, SnpfetchError> {
    let content = fs::read_to_string(path).map_err(|err| SnpfetchError::FileRead {
        path: path.to_string(),
        message: err.to_string(),
    })?;
    let parsed: Map<String, Value> =
        serde_json::from_str(&content).map_err(|err| SnpfetchError::JsonFormat(err.to_string()))?;
    Ok(flatten(&parsed))
}

pub fn flatten(parsed: &Map<String, Value>) -> CohortDataset {
    let mut dataset = CohortDataset::default();
    for (subcohort, group) in parsed {
        dataset.subcohorts.push(subcohort.clone());
        let Some(analyses) = group.as_array() else {
            warn!(subcohort = %subcohort, "subcohort value is not a collection, skipping");
            continue;
        };
        for analysis in analyses {
            dataset.analyses.push(analysis.clone());
            let Some(fields) = analysis.as_object() else {
                continue;
            };
            for value in fields.values() {
                collect_snps(value, &mut dataset.snp_list);
            }
        }
    }
    dataset
}

fn collect_snps(value: &Value, snp_list: &mut Vec<String>) {
    match value {
        Value::String(snp) => snp_list.push(snp.clone()),
        Value::Array(items) => {
            for item in items {
                collect_snps(item, snp_list);
            }
        }
        Value::Object(fields) => {
            for item in fields.values() {
                collect_snps(item, snp_list);
            }
        }
        _ => {}
    }
}
