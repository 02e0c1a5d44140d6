//! The dashboard pipeline: owns the current dataset and answers every query
//! the presentation layer makes against it.

use std::path::Path;

use tracing::{info, warn};

use crate::classify::focus_from;
use crate::config::DashboardConfig;
use crate::error::FetchResult;
use crate::filter::{channels, filter_rows};
use crate::loader::{build_dataset, Dataset, LoadReport, RawTable};
use crate::metrics::{aggregate, compute_totals};
use crate::series::build_series;
use crate::types::{
    DashboardSummary, FactRow, FilterState, FocusList, Granularity, MetricName, Metrics,
    SeriesPoint, Tier, Totals, TrendMetric,
};

/// Handle for one in-flight fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket {
    generation: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The fetched data replaced the dataset.
    Applied(LoadReport),
    /// A newer fetch already completed; this payload was discarded.
    Stale,
}

#[derive(Debug)]
pub struct Dashboard {
    config: DashboardConfig,
    dataset: Option<Dataset>,
    issued: u64,
    applied: u64,
}

impl Dashboard {
    pub fn new(config: DashboardConfig) -> Self {
        Dashboard {
            config,
            dataset: None,
            issued: 0,
            applied: 0,
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    fn rows(&self) -> &[FactRow] {
        self.dataset.as_ref().map(Dataset::rows).unwrap_or(&[])
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.issued += 1;
        FetchTicket {
            generation: self.issued,
        }
    }

    /// Apply the result of the fetch identified by `ticket`.
    ///
    /// Errors leave the current dataset in place. A successful payload whose
    /// ticket is older than the last applied one is dropped, so the most
    /// recently started successful fetch always wins.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: FetchResult<RawTable>,
    ) -> FetchResult<FetchOutcome> {
        let table = match result {
            Ok(table) => table,
            Err(e) => {
                warn!(
                    generation = ticket.generation,
                    error = %e,
                    "fetch failed; keeping previous dataset"
                );
                return Err(e);
            }
        };
        if ticket.generation <= self.applied {
            warn!(
                generation = ticket.generation,
                applied = self.applied,
                "discarding stale fetch result"
            );
            return Ok(FetchOutcome::Stale);
        }

        let (dataset, report) = build_dataset(&table, &self.config.aliases)?;
        self.install(ticket, dataset, &report);
        Ok(FetchOutcome::Applied(report))
    }

    fn install(&mut self, ticket: FetchTicket, dataset: Dataset, report: &LoadReport) {
        self.dataset = Some(dataset);
        self.applied = ticket.generation;
        info!(generation = ticket.generation, rows = report.kept_rows, "dataset replaced");
    }

    /// Fetch, normalize and swap in a CSV export from disk.
    pub async fn refresh_from_path(&mut self, path: &Path) -> FetchResult<FetchOutcome> {
        let ticket = self.begin_fetch();
        let result = RawTable::from_path(path).await;
        self.complete_fetch(ticket, result)
    }

    /// Load an already-fetched table synchronously. Any fetch still in flight
    /// becomes stale.
    pub fn load_table(&mut self, table: RawTable) -> FetchResult<LoadReport> {
        let ticket = self.begin_fetch();
        let (dataset, report) = build_dataset(&table, &self.config.aliases)?;
        self.install(ticket, dataset, &report);
        Ok(report)
    }

    /// Full span and all channels for the loaded dataset; unbounded when empty.
    pub fn default_filter(&self) -> FilterState {
        self.dataset
            .as_ref()
            .map(FilterState::full_range)
            .unwrap_or_default()
    }

    pub fn filtered(&self, filter: &FilterState) -> Vec<&FactRow> {
        filter_rows(self.rows(), filter)
    }

    pub fn get_totals(&self, filter: &FilterState) -> Totals {
        compute_totals(self.filtered(filter))
    }

    pub fn get_metrics(&self, filter: &FilterState) -> Metrics {
        aggregate(self.filtered(filter), &self.config.formulas).1
    }

    pub fn classify(&self, metric: MetricName, value: f64) -> Tier {
        self.config.thresholds.classify(metric, value)
    }

    pub fn get_focus_list(&self, metrics: &Metrics) -> FocusList {
        self.config.thresholds.focus_list(metrics)
    }

    pub fn get_series(
        &self,
        filter: &FilterState,
        metric: TrendMetric,
        granularity: Granularity,
    ) -> Vec<SeriesPoint> {
        build_series(self.filtered(filter), metric, granularity, &self.config.formulas)
    }

    pub fn get_channels(&self) -> Vec<String> {
        channels(self.rows())
    }

    /// Totals, metrics, tiers and focus list for one filter in a single pass.
    pub fn summarize(&self, filter: &FilterState) -> DashboardSummary {
        let rows = self.filtered(filter);
        let row_count = rows.len();
        let (totals, metrics) = aggregate(rows, &self.config.formulas);
        let classified = self.config.thresholds.classify_all(&metrics);
        let focus = focus_from(&classified);
        DashboardSummary {
            filter: filter.clone(),
            row_count,
            totals,
            metrics,
            classified,
            focus,
        }
    }
}

impl Default for Dashboard {
    fn default() -> Self {
        Dashboard::new(DashboardConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::BENCHMARKED;
    use crate::error::FetchError;
    use chrono::NaiveDate;

    const FIRST: &str = "\
Date,Channel,Impressions,Clicks,Ad Spend,Leads,Deals Closed,Revenue,Cash Collected
2026-01-01,Facebook,10000,100,2000,10,1,5000,3000
2026-01-02,Google,5000,50,1000,5,0,0,0
";

    const SECOND: &str = "\
Date,Channel,Clicks
2026-02-01,TikTok,7
";

    fn table(text: &str) -> RawTable {
        RawTable::from_reader(text.as_bytes()).unwrap()
    }

    #[test]
    fn queries_before_load_are_empty() {
        let dash = Dashboard::default();
        assert_eq!(dash.get_totals(&FilterState::default()), Totals::default());
        assert_eq!(dash.get_channels(), vec!["All"]);
        assert_eq!(dash.default_filter(), FilterState::default());
    }

    #[test]
    fn scenario_totals_and_tiers() {
        let mut dash = Dashboard::default();
        dash.load_table(table(FIRST)).unwrap();
        let filter = dash.default_filter();
        assert_eq!(filter.start, NaiveDate::from_ymd_opt(2026, 1, 1));
        assert_eq!(filter.end, NaiveDate::from_ymd_opt(2026, 1, 2));

        let totals = dash.get_totals(&filter);
        assert_eq!(totals.clicks, 150.0);
        assert_eq!(totals.impressions, 15_000.0);
        let metrics = dash.get_metrics(&filter);
        assert_eq!(dash.classify(MetricName::Ctr, metrics.ctr), Tier::Good);
        assert_eq!(metrics.cpa, 3000.0);
        assert_eq!(dash.get_channels(), vec!["All", "Facebook", "Google"]);
    }

    #[test]
    fn failed_fetch_keeps_last_good_dataset() {
        let mut dash = Dashboard::default();
        dash.load_table(table(FIRST)).unwrap();
        let ticket = dash.begin_fetch();
        let err = dash.complete_fetch(ticket, Err(FetchError::NoRows)).unwrap_err();
        assert!(matches!(err, FetchError::NoRows));
        assert_eq!(dash.dataset().map(Dataset::len), Some(2));
    }

    #[test]
    fn unusable_payload_keeps_last_good_dataset() {
        let mut dash = Dashboard::default();
        dash.load_table(table(FIRST)).unwrap();
        let err = dash.load_table(table("Date,Clicks\nsoon,5\n")).unwrap_err();
        assert!(matches!(err, FetchError::NoUsableRows { rejected: 1 }));
        assert_eq!(dash.dataset().map(Dataset::len), Some(2));
    }

    #[test]
    fn stale_completion_is_discarded() {
        let mut dash = Dashboard::default();
        let older = dash.begin_fetch();
        let newer = dash.begin_fetch();
        assert!(matches!(
            dash.complete_fetch(newer, Ok(table(SECOND))).unwrap(),
            FetchOutcome::Applied(_)
        ));
        assert_eq!(dash.complete_fetch(older, Ok(table(FIRST))).unwrap(), FetchOutcome::Stale);
        assert_eq!(dash.get_channels(), vec!["All", "TikTok"]);
    }

    #[test]
    fn summary_matches_individual_queries() {
        let mut dash = Dashboard::default();
        dash.load_table(table(FIRST)).unwrap();
        let filter = dash.default_filter().with_channel("Facebook");
        let summary = dash.summarize(&filter);
        assert_eq!(summary.row_count, 1);
        assert_eq!(summary.totals, dash.get_totals(&filter));
        assert_eq!(summary.metrics, dash.get_metrics(&filter));
        assert_eq!(summary.focus, dash.get_focus_list(&summary.metrics));
        assert_eq!(summary.classified.len(), BENCHMARKED.len());
    }

    #[test]
    fn series_uses_filtered_rows() {
        let mut dash = Dashboard::default();
        dash.load_table(table(FIRST)).unwrap();
        let filter = FilterState::default().with_channel("Google");
        let series = dash.get_series(&filter, TrendMetric::Cpc, Granularity::Day);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].value, 20.0);
    }
}
