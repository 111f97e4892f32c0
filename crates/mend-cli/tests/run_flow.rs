//! End-to-end run wired the way the binary wires it: CSV catalog, YAML
//! fixtures, replay executor, JSON-lines sink.

use mend_cli::{load_catalog, Config, JsonLinesSink, ReplayExecutor};
use mend_engine::MetricRunner;
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn catalog_to_report_file() {
    let dir = TempDir::new().unwrap();

    let catalog_path = dir.path().join("metrics.csv");
    std::fs::write(
        &catalog_path,
        "id,name,chart_group,variable_name,dialect,raw_expression\n\
         orders,Total Orders,Key Metrics,Total Orders,p21,\n\
         rentals,Open Rentals,Rentals,Open Rentals,por,\n\
         broken,AR Aging,Receivables,AR Aging,p21,\n",
    )
    .unwrap();

    let fixtures_path = dir.path().join("fixtures.yml");
    std::fs::write(
        &fixtures_path,
        r#"
rules:
  - contains: "oe_hdr"
    value: 128
  - contains: "Rentals"
    value: 12
  - contains: "ar_open_items"
    error: "permission denied"
"#,
    )
    .unwrap();

    let config: Config = serde_yaml::from_str("name: test\ndelay_ms: 0").unwrap();
    let metrics = load_catalog(&catalog_path).unwrap();
    assert_eq!(metrics.len(), 3);

    let report_path = dir.path().join("reports.jsonl");
    let runner = MetricRunner::new(
        Arc::new(ReplayExecutor::load(&fixtures_path).unwrap()),
        Arc::new(JsonLinesSink::create(&report_path).unwrap()),
        config.table_map().unwrap(),
        config.runner_options(),
    );

    let summary = runner.run_batch(&metrics).await.unwrap();
    assert_eq!(summary.processed, 3);
    assert_eq!(summary.ok, 2);
    assert_eq!(summary.errors, 1);

    let content = std::fs::read_to_string(&report_path).unwrap();
    let lines: Vec<_> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    for line in lines {
        let parsed: serde_json::Value = serde_json::from_str(line).unwrap();
        assert!(parsed["metric"]["id"].is_string());
        assert!(parsed["final_sql"].is_string());
    }
}
