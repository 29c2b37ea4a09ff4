use anyhow::Result;
use estate_reports::domain::ports::Pipeline;
use estate_reports::{ChartPipeline, Engine, LocalStorage, ReportConfig};
use httpmock::prelude::*;
use tempfile::TempDir;

fn config_for(server: &MockServer, output: &TempDir) -> ReportConfig {
    let mut config = ReportConfig::default();
    config.api.base_url = server.base_url();
    config.load.output_path = output.path().to_str().unwrap().to_string();
    config
}

#[tokio::test]
async fn test_chart_merges_feeds_and_writes_csv() -> Result<()> {
    let server = MockServer::start();
    let output = TempDir::new()?;

    server.mock(|when, then| {
        when.method(GET).path("/investments");
        then.status(200).json_body(serde_json::json!([
            {"date": "2024-11-08", "amount": "1.2k"},
            {"investmentDate": "2024-11-08T15:30:00Z", "value": 800}
        ]));
    });
    server.mock(|when, then| {
        when.method(GET).path("/transactions");
        // Different envelope and different field spellings than the
        // investments feed.
        then.status(200).json_body(serde_json::json!({
            "data": [{"createdAt": "2024-11-09T09:00:00Z", "volume": 500}]
        }));
    });

    let config = config_for(&server, &output);
    let storage = LocalStorage::new(config.load.output_path.clone());
    let pipeline = ChartPipeline::new(storage, config);

    let records = pipeline.extract().await?;
    assert_eq!(records.len(), 3);

    let chart = pipeline.transform(records).await?;
    assert_eq!(chart.points.len(), 2);
    assert_eq!(chart.points[0].date, "Nov 8");
    assert!((chart.points[0].value - 2000.0).abs() < 1e-9);
    assert!((chart.points[0].value2 - 1400.0).abs() < 1e-9);
    assert_eq!(chart.points[0].count, 2);
    assert_eq!(chart.points[1].date, "Nov 9");
    assert_eq!(chart.points[1].count, 1);

    assert!(chart.csv.starts_with("date,value,value2,count\n"));
    assert!(chart.csv.contains("Nov 8,"));

    let path = pipeline.load(chart).await?;
    assert!(path.contains("investment_volume_"));
    let written: Vec<_> = std::fs::read_dir(output.path())?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(written.len(), 1);
    assert!(written[0].ends_with(".csv"));

    Ok(())
}

#[tokio::test]
async fn test_chart_falls_back_to_sample_series_when_feeds_fail() -> Result<()> {
    let server = MockServer::start();
    let output = TempDir::new()?;

    server.mock(|when, then| {
        when.method(GET).path("/investments");
        then.status(500);
    });
    server.mock(|when, then| {
        when.method(GET).path("/transactions");
        then.status(500);
    });

    let config = config_for(&server, &output);
    let storage = LocalStorage::new(config.load.output_path.clone());
    let pipeline = ChartPipeline::new(storage, config);

    let result = Engine::new(pipeline).run().await?;
    assert!(result.contains("investment_volume_"));

    let written: Vec<_> = std::fs::read_dir(output.path())?
        .filter_map(|e| e.ok())
        .collect();
    assert_eq!(written.len(), 1);
    let csv = std::fs::read_to_string(written[0].path())?;
    let lines: Vec<&str> = csv.lines().collect();
    // Header plus the 13 illustrative points.
    assert_eq!(lines.len(), 14);
    assert!(lines[1].starts_with("Oct 15,45000"));
    assert!(lines[13].starts_with("Oct 27,102000"));

    Ok(())
}

#[tokio::test]
async fn test_chart_window_keeps_most_recent_days() -> Result<()> {
    let server = MockServer::start();
    let output = TempDir::new()?;

    server.mock(|when, then| {
        when.method(GET).path("/investments");
        then.status(200).json_body(serde_json::json!([
            {"date": "2024-11-07", "amount": 1},
            {"date": "2024-11-08", "amount": 2},
            {"date": "2024-11-09", "amount": 3}
        ]));
    });
    server.mock(|when, then| {
        when.method(GET).path("/transactions");
        then.status(200).json_body(serde_json::json!([]));
    });

    let mut config = config_for(&server, &output);
    config.chart.window = Some(2);
    let storage = LocalStorage::new(config.load.output_path.clone());
    let pipeline = ChartPipeline::new(storage, config);

    let records = pipeline.extract().await?;
    let chart = pipeline.transform(records).await?;
    assert_eq!(chart.points.len(), 2);
    assert_eq!(chart.points[0].date, "Nov 8");
    assert_eq!(chart.points[1].date, "Nov 9");

    Ok(())
}
