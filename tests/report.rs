use std::fs;

use camino::Utf8PathBuf;
use serde_json::{Map, Value, json};

use snpfetch::report::{
    OverlapBlock, SnpSummary, append_results, write_overlap_report, write_snp_summary,
};

fn entry(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected an object"),
    }
}

#[test]
fn append_results_requires_id_and_skips_without_aborting() {
    let temp = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(temp.path().join("entries.txt")).unwrap();

    let results = vec![
        entry(json!({"id": "rs1", "MAF": 0.2})),
        entry(json!({"MAF": 0.2})),
    ];
    let written = append_results(&path, &results).unwrap();
    assert_eq!(written, 1);

    let content = fs::read_to_string(path.as_std_path()).unwrap();
    assert!(content.starts_with("rs1\n"));
    assert!(content.contains("\"MAF\": 0.2"));
}

#[test]
fn append_results_appends_across_calls() {
    let temp = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(temp.path().join("entries.txt")).unwrap();

    append_results(&path, &[entry(json!({"id": "rs1"}))]).unwrap();
    append_results(&path, &[entry(json!({"id": "rs2"}))]).unwrap();

    let content = fs::read_to_string(path.as_std_path()).unwrap();
    assert!(content.contains("rs1"));
    assert!(content.contains("rs2"));
}

#[test]
fn snp_summary_is_tab_separated() {
    let temp = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(temp.path().join("summary.txt")).unwrap();

    let rows = vec![SnpSummary {
        id: "rs1".to_string(),
        location: "1:100-100".to_string(),
        maf: "0.1".to_string(),
        most_severe_consequence: "intron_variant".to_string(),
    }];
    write_snp_summary(&path, &rows).unwrap();

    let content = fs::read_to_string(path.as_std_path()).unwrap();
    assert_eq!(content, "rs1\t1:100-100\t0.1\tintron_variant\n");
}

#[test]
fn overlap_blocks_are_delimited() {
    let temp = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(temp.path().join("overlap.txt")).unwrap();

    let blocks = vec![
        OverlapBlock {
            location: "1:100-100".to_string(),
            lines: vec!["id: rs1".to_string()],
            attempted_url: None,
        },
        OverlapBlock {
            location: "2:200-200".to_string(),
            lines: Vec::new(),
            attempted_url: Some("https://example.invalid/overlap".to_string()),
        },
    ];
    write_overlap_report(&path, &blocks).unwrap();

    let content = fs::read_to_string(path.as_std_path()).unwrap();
    let delimiter = "=".repeat(80);
    assert_eq!(content.matches(&delimiter).count(), 2);
    assert!(content.contains("id: rs1"));
    assert!(content.contains("Could not retrieve data on: 2:200-200"));
    assert!(content.contains("Attempted url: https://example.invalid/overlap"));
}
