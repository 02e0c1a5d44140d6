use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::metrics::{compute_totals, FormulaSet};
use crate::types::{FactRow, Granularity, SeriesPoint, Totals, TrendMetric};
use crate::util::{short_date, week_start};

pub fn bucket_start(date: NaiveDate, granularity: Granularity) -> NaiveDate {
    match granularity {
        Granularity::Day => date,
        Granularity::Week => week_start(date),
    }
}

/// `1/5` for days, ISO week (`2026-W02`) for weeks.
pub fn bucket_label(start: NaiveDate, granularity: Granularity) -> String {
    match granularity {
        Granularity::Day => short_date(start),
        Granularity::Week => start.format("%G-W%V").to_string(),
    }
}

/// One point per non-empty bucket, oldest first. Each bucket's value is
/// recomputed from that bucket's own totals.
pub fn build_series<'a, I>(
    rows: I,
    metric: TrendMetric,
    granularity: Granularity,
    formulas: &FormulaSet,
) -> Vec<SeriesPoint>
where
    I: IntoIterator<Item = &'a FactRow>,
{
    let mut buckets: BTreeMap<NaiveDate, Vec<&FactRow>> = BTreeMap::new();
    for row in rows {
        buckets
            .entry(bucket_start(row.date, granularity))
            .or_default()
            .push(row);
    }

    let ratio = formulas.ratio(metric.metric());
    let series: Vec<SeriesPoint> = buckets
        .into_iter()
        .map(|(start, group)| {
            let totals: Totals = compute_totals(group);
            SeriesPoint {
                bucket_start: start,
                label: bucket_label(start, granularity),
                value: ratio.eval(&totals),
            }
        })
        .collect();
    debug!(points = series.len(), ?metric, ?granularity, "built trend series");
    series
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(date: NaiveDate, clicks: f64, impressions: f64, spend: f64) -> FactRow {
        let mut r = FactRow::empty(date);
        r.clicks = clicks;
        r.impressions = impressions;
        r.spend = spend;
        r
    }

    #[test]
    fn daily_buckets_compute_their_own_ctr() {
        let rows = vec![
            row(ymd(2026, 1, 1), 100.0, 10_000.0, 2000.0),
            row(ymd(2026, 1, 2), 50.0, 5000.0, 1000.0),
        ];
        let series = build_series(&rows, TrendMetric::Ctr, Granularity::Day, &FormulaSet::default());
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].label, "1/1");
        assert_eq!(series[1].label, "1/2");
        assert!((series[0].value - 0.01).abs() < 1e-12);
        assert!((series[1].value - 0.01).abs() < 1e-12);
    }

    #[test]
    fn same_iso_week_collapses_to_one_bucket() {
        // Monday and Wednesday of the same week.
        let rows = vec![
            row(ymd(2026, 1, 5), 10.0, 1000.0, 100.0),
            row(ymd(2026, 1, 7), 30.0, 1000.0, 300.0),
        ];
        let series = build_series(&rows, TrendMetric::Cpc, Granularity::Week, &FormulaSet::default());
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].bucket_start, ymd(2026, 1, 5));
        assert_eq!(series[0].label, "2026-W02");
        // (100 + 300) / (10 + 30), not the mean of the two daily CPCs.
        assert_eq!(series[0].value, 10.0);
    }

    #[test]
    fn buckets_are_sorted_and_sparse() {
        let rows = vec![
            row(ymd(2026, 1, 9), 1.0, 100.0, 0.0),
            row(ymd(2026, 1, 1), 1.0, 100.0, 0.0),
            row(ymd(2026, 1, 1), 1.0, 100.0, 0.0),
        ];
        let series = build_series(&rows, TrendMetric::Ctr, Granularity::Day, &FormulaSet::default());
        let starts: Vec<NaiveDate> = series.iter().map(|p| p.bucket_start).collect();
        assert_eq!(starts, vec![ymd(2026, 1, 1), ymd(2026, 1, 9)]);
    }

    #[test]
    fn week_spanning_new_year_uses_iso_year() {
        let rows = vec![row(ymd(2026, 1, 1), 0.0, 0.0, 50.0), row(ymd(2025, 12, 30), 0.0, 0.0, 50.0)];
        let series = build_series(&rows, TrendMetric::Cpl, Granularity::Week, &FormulaSet::default());
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].bucket_start, ymd(2025, 12, 29));
        assert_eq!(series[0].label, "2026-W01");
        assert_eq!(series[0].value, 0.0);
    }

    #[test]
    fn empty_input_gives_empty_series() {
        let rows: Vec<FactRow> = Vec::new();
        let series = build_series(&rows, TrendMetric::Mer, Granularity::Week, &FormulaSet::default());
        assert!(series.is_empty());
    }
}
