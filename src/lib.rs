//! Marketing-funnel KPIs from a spreadsheet export.
//!
//! Raw CSV records go through header resolution and row normalization once per
//! load; every query after that (totals, metrics, tiers, trend series) is a pure
//! function of the loaded dataset and the caller's [`FilterState`].

pub mod classify;
pub mod config;
pub mod error;
pub mod filter;
pub mod headers;
pub mod loader;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod reports;
pub mod series;
pub mod types;
pub mod util;

pub use config::DashboardConfig;
pub use error::{ConfigError, FetchError};
pub use loader::{Dataset, LoadReport, RawTable};
pub use pipeline::{Dashboard, FetchOutcome, FetchTicket};
pub use types::{
    FactRow, Field, FilterState, Granularity, MetricName, Metrics, SeriesPoint, Tier, Totals,
    TrendMetric,
};
