use std::io::Write;

use chrono::NaiveDate;
use funnel_report::{
    Dashboard, DashboardConfig, FetchError, FetchOutcome, FilterState, Granularity, MetricName,
    Tier, TrendMetric,
};

const SHEET: &str = "\
Date,Source,Campaign Name,Impr.,Link Clicks,Amount Spent (PHP),Leads,Booked Calls,Show Ups,Qualified Calls,Deals Closed,Revenue,Cash Collected
2026-01-05,Facebook,Launch,10000,100,\"₱2,000\",10,6,3,2,1,\"₱5,000\",\"₱3,000\"
2026-01-06,Google,Search,5000,50,1000,5,2,1,1,0,0,0
2026-01-12,Facebook,Retarget,8000,200,1500,20,10,8,4,2,12000,8000
,Facebook,Orphan,1,1,1,1,1,1,1,1,1,1
";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn write_sheet(dir: &tempfile::TempDir, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(text.as_bytes()).unwrap();
    path
}

#[tokio::test]
async fn refresh_loads_sheet_with_aliased_headers() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sheet(&dir, "sheet.csv", SHEET);
    let mut dash = Dashboard::default();

    let outcome = dash.refresh_from_path(&path).await.unwrap();
    let report = match outcome {
        FetchOutcome::Applied(report) => report,
        FetchOutcome::Stale => panic!("first fetch cannot be stale"),
    };
    assert_eq!(report.total_records, 4);
    assert_eq!(report.kept_rows, 3);
    assert_eq!(report.rejected_rows, 1);
    assert_eq!(report.first_date, Some(date(2026, 1, 5)));
    assert_eq!(report.last_date, Some(date(2026, 1, 12)));

    let filter = dash.default_filter();
    let totals = dash.get_totals(&filter);
    assert_eq!(totals.spend, 4500.0);
    assert_eq!(totals.clicks, 350.0);
    assert_eq!(totals.deals_closed, 3.0);
    assert_eq!(totals.revenue, 17_000.0);
    assert_eq!(dash.get_channels(), vec!["All", "Facebook", "Google"]);
}

#[tokio::test]
async fn filters_narrow_every_view() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sheet(&dir, "sheet.csv", SHEET);
    let mut dash = Dashboard::default();
    dash.refresh_from_path(&path).await.unwrap();

    let first_week = FilterState {
        start: Some(date(2026, 1, 5)),
        end: Some(date(2026, 1, 6)),
        channel: "All".to_string(),
    };
    let metrics = dash.get_metrics(&first_week);
    assert_eq!(metrics.ctr, 0.01);
    assert_eq!(metrics.cpa, 3000.0);
    assert_eq!(dash.classify(MetricName::Ctr, metrics.ctr), Tier::Good);

    let facebook = dash.default_filter().with_channel("Facebook");
    assert_eq!(dash.filtered(&facebook).len(), 2);

    let nobody = dash.default_filter().with_channel("Reddit");
    let metrics = dash.get_metrics(&nobody);
    assert_eq!(metrics.ctr, 0.0);
    assert_eq!(metrics.cpa, 0.0);
    assert!(dash.get_series(&nobody, TrendMetric::Ctr, Granularity::Day).is_empty());
}

#[tokio::test]
async fn weekly_series_recomputes_each_bucket() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sheet(&dir, "sheet.csv", SHEET);
    let mut dash = Dashboard::default();
    dash.refresh_from_path(&path).await.unwrap();

    let filter = dash.default_filter();
    let weekly = dash.get_series(&filter, TrendMetric::Cpc, Granularity::Week);
    assert_eq!(weekly.len(), 2);
    assert_eq!(weekly[0].bucket_start, date(2026, 1, 5));
    assert_eq!(weekly[0].value, 20.0);
    assert_eq!(weekly[1].bucket_start, date(2026, 1, 12));
    assert_eq!(weekly[1].value, 7.5);

    let daily = dash.get_series(&filter, TrendMetric::Cpc, Granularity::Day);
    assert_eq!(daily.len(), 3);
    assert_eq!(daily[0].label, "1/5");
}

#[tokio::test]
async fn missing_file_keeps_last_good_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sheet(&dir, "sheet.csv", SHEET);
    let mut dash = Dashboard::default();
    dash.refresh_from_path(&path).await.unwrap();

    let missing = dir.path().join("gone.csv");
    let err = dash.refresh_from_path(&missing).await.unwrap_err();
    assert!(matches!(err, FetchError::Read { .. }));
    assert_eq!(dash.filtered(&dash.default_filter()).len(), 3);

    let empty = write_sheet(&dir, "empty.csv", "Date,Clicks\n");
    let err = dash.refresh_from_path(&empty).await.unwrap_err();
    assert!(matches!(err, FetchError::NoRows));
    assert_eq!(dash.get_totals(&dash.default_filter()).clicks, 350.0);
}

#[tokio::test]
async fn config_thresholds_change_tiers() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sheet(&dir, "sheet.csv", SHEET);
    let config = DashboardConfig::from_toml_str(
        r#"
[thresholds.ctr]
direction = "higher"
excellent = 0.05
good = 0.04
fair = 0.03
"#,
    )
    .unwrap();
    let mut dash = Dashboard::new(config);
    dash.refresh_from_path(&path).await.unwrap();

    let summary = dash.summarize(&dash.default_filter());
    let ctr = summary
        .classified
        .iter()
        .find(|c| c.metric == MetricName::Ctr)
        .unwrap();
    assert_eq!(ctr.tier, Tier::Risky);
    assert!(summary.focus.risky.iter().any(|c| c.metric == MetricName::Ctr));
}

#[tokio::test]
async fn sheet_without_booked_column_does_not_flag_book_rate() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sheet(
        &dir,
        "no_booked.csv",
        "\
Date,Channel,Impressions,Clicks,Spend,Leads,Show Ups,Qualified Calls,Deals Closed,Revenue,Cash Collected
2026-01-05,Facebook,10000,200,2000,50,40,30,10,50000,50000
",
    );
    let mut dash = Dashboard::default();
    dash.refresh_from_path(&path).await.unwrap();

    let metrics = dash.get_metrics(&dash.default_filter());
    assert_eq!(metrics.book_rate, 0.0);
    let focus = dash.get_focus_list(&metrics);
    assert!(focus.risky.iter().all(|c| c.metric != MetricName::BookRate));
    assert!(focus.fair.iter().all(|c| c.metric != MetricName::BookRate));
}
