use serde_json::{Map, Value};
use tracing::debug;

use crate::error::SnpfetchError;
use crate::features::{Feature, RequestedFeatures};

/// The batched variation endpoint answers with an object keyed by SNP id.
/// Rebuilds it as a record list, carrying the key into each record as its
/// `"id"` field. An array response passes through unchanged.
pub fn keyed_records(decoded: &Value) -> Result<Vec<Value>, SnpfetchError> {
    match decoded {
        Value::Array(records) => Ok(records.clone()),
        Value::Object(map) => Ok(map
            .iter()
            .map(|(id, record)| {
                let mut record = record.clone();
                if let Value::Object(fields) = &mut record {
                    fields.entry("id").or_insert(Value::String(id.clone()));
                }
                record
            })
            .collect()),
        other => Err(SnpfetchError::DecodedRecordsNotList(other.to_string())),
    }
}

/// Applies a feature specification to decoded records that must form a
/// list; any other shape is a wholesale mismatch.
pub fn extract_value(
    decoded: &Value,
    spec: &RequestedFeatures,
) -> Result<Vec<Map<String, Value>>, SnpfetchError> {
    match decoded.as_array() {
        Some(records) => Ok(extract(records, spec)),
        None => Err(SnpfetchError::DecodedRecordsNotList(decoded.to_string())),
    }
}

/// One extracted result per record, in input order, holding only the
/// requested fields that were actually present.
pub fn extract(records: &[Value], spec: &RequestedFeatures) -> Vec<Map<String, Value>> {
    records
        .iter()
        .map(|record| extract_record(record, spec))
        .collect()
}

fn extract_record(record: &Value, spec: &RequestedFeatures) -> Map<String, Value> {
    let mut result = Map::new();
    for feature in spec.toplevel() {
        match feature {
            Feature::Plain(name) => match record.get(name) {
                Some(value) => {
                    result.insert(name.clone(), value.clone());
                }
                None => not_found(name),
            },
            Feature::Nested { parent, children } => {
                let Some(first) = record.get(parent).and_then(|group| group.get(0)) else {
                    not_found(parent);
                    continue;
                };
                let mut nested = Map::new();
                let mut complete = true;
                for child in children {
                    match first.get(child) {
                        Some(value) => {
                            nested.insert(child.clone(), value.clone());
                        }
                        None => {
                            // one missing child drops the whole group
                            not_found(child);
                            complete = false;
                            break;
                        }
                    }
                }
                if complete {
                    result.insert(parent.clone(), Value::Object(nested));
                }
            }
        }
    }
    result
}

// behaviour triggered by an unfound feature
fn not_found(feature: &str) {
    debug!(feature, "requested feature not present in record");
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use crate::features::Feature;

    use super::*;

    fn summary_spec() -> RequestedFeatures {
        RequestedFeatures::new(vec![
            Feature::plain("MAF"),
            Feature::nested("mappings", vec!["location".to_string()]),
        ])
    }

    #[test]
    fn extracts_plain_and_nested_fields() {
        let records = vec![json!({
            "MAF": 0.1,
            "mappings": [{"location": "1:100-100"}],
        })];
        let results = extract(&records, &summary_spec());
        assert_eq!(results.len(), 1);
        assert_eq!(
            Value::Object(results[0].clone()),
            json!({"MAF": 0.1, "mappings": {"location": "1:100-100"}})
        );
    }

    #[test]
    fn missing_field_is_omitted_not_an_error() {
        let records = vec![json!({
            "mappings": [{"location": "1:100-100"}],
        })];
        let results = extract(&records, &summary_spec());
        assert!(!results[0].contains_key("MAF"));
        assert!(results[0].contains_key("mappings"));
    }

    #[test]
    fn missing_child_drops_whole_group() {
        let spec = RequestedFeatures::new(vec![Feature::nested(
            "mappings",
            vec!["location".to_string(), "assembly_name".to_string()],
        )]);
        let records = vec![json!({"mappings": [{"location": "1:100-100"}]})];
        let results = extract(&records, &spec);
        assert!(!results[0].contains_key("mappings"));
    }

    #[test]
    fn results_mirror_record_order() {
        let records = vec![json!({"MAF": 0.1}), json!({"MAF": 0.2})];
        let results = extract(&records, &summary_spec());
        assert_eq!(results[0].get("MAF"), Some(&json!(0.1)));
        assert_eq!(results[1].get("MAF"), Some(&json!(0.2)));
    }

    #[test]
    fn keyed_records_carries_id() {
        let decoded = json!({
            "rs123": {"MAF": 0.1},
            "rs456": {"MAF": 0.2},
        });
        let records = keyed_records(&decoded).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("id"), Some(&json!("rs123")));
        assert_eq!(records[1].get("id"), Some(&json!("rs456")));
    }

    #[test]
    fn keyed_records_rejects_scalars() {
        let err = keyed_records(&json!("rs123")).unwrap_err();
        assert_matches!(err, SnpfetchError::DecodedRecordsNotList(_));
    }

    #[test]
    fn extract_value_requires_list() {
        let err = extract_value(&json!({"rs123": {}}), &summary_spec()).unwrap_err();
        assert_matches!(err, SnpfetchError::DecodedRecordsNotList(_));
    }
}
