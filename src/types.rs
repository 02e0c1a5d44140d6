use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Channel selector value that disables channel filtering.
pub const ALL_CHANNELS: &str = "All";

/// Channel assigned to rows whose channel column is blank or missing.
pub const UNKNOWN_CHANNEL: &str = "Unknown";

/// Canonical semantic column of the source sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Date,
    Channel,
    Campaign,
    Spend,
    Impressions,
    Clicks,
    Leads,
    Booked,
    ShowUps,
    QualifiedCalls,
    DealsClosed,
    Revenue,
    CashIn,
}

impl Field {
    pub const COUNT: usize = 13;

    pub const ALL: [Field; Field::COUNT] = [
        Field::Date,
        Field::Channel,
        Field::Campaign,
        Field::Spend,
        Field::Impressions,
        Field::Clicks,
        Field::Leads,
        Field::Booked,
        Field::ShowUps,
        Field::QualifiedCalls,
        Field::DealsClosed,
        Field::Revenue,
        Field::CashIn,
    ];

    pub const NUMERIC: [Field; 10] = [
        Field::Spend,
        Field::Impressions,
        Field::Clicks,
        Field::Leads,
        Field::Booked,
        Field::ShowUps,
        Field::QualifiedCalls,
        Field::DealsClosed,
        Field::Revenue,
        Field::CashIn,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Field::Date => "date",
            Field::Channel => "channel",
            Field::Campaign => "campaign",
            Field::Spend => "spend",
            Field::Impressions => "impressions",
            Field::Clicks => "clicks",
            Field::Leads => "leads",
            Field::Booked => "booked",
            Field::ShowUps => "show_ups",
            Field::QualifiedCalls => "qualified_calls",
            Field::DealsClosed => "deals_closed",
            Field::Revenue => "revenue",
            Field::CashIn => "cash_in",
        }
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, Field::Date | Field::Channel | Field::Campaign)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Field::ALL
            .iter()
            .copied()
            .find(|f| f.name() == wanted)
            .ok_or_else(|| format!("unknown field '{}'", s))
    }
}

/// One normalized spreadsheet record. Built once during load and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactRow {
    pub date: NaiveDate,
    pub channel: String,
    pub campaign: String,
    pub spend: f64,
    pub impressions: f64,
    pub clicks: f64,
    pub leads: f64,
    pub booked: f64,
    pub show_ups: f64,
    pub qualified_calls: f64,
    pub deals_closed: f64,
    pub revenue: f64,
    pub cash_in: f64,
}

impl FactRow {
    /// A row dated `date` with channel "Unknown" and every measure at zero.
    pub fn empty(date: NaiveDate) -> Self {
        FactRow {
            date,
            channel: UNKNOWN_CHANNEL.to_string(),
            campaign: String::new(),
            spend: 0.0,
            impressions: 0.0,
            clicks: 0.0,
            leads: 0.0,
            booked: 0.0,
            show_ups: 0.0,
            qualified_calls: 0.0,
            deals_closed: 0.0,
            revenue: 0.0,
            cash_in: 0.0,
        }
    }

    pub(crate) fn set_value(&mut self, field: Field, value: f64) {
        match field {
            Field::Spend => self.spend = value,
            Field::Impressions => self.impressions = value,
            Field::Clicks => self.clicks = value,
            Field::Leads => self.leads = value,
            Field::Booked => self.booked = value,
            Field::ShowUps => self.show_ups = value,
            Field::QualifiedCalls => self.qualified_calls = value,
            Field::DealsClosed => self.deals_closed = value,
            Field::Revenue => self.revenue = value,
            Field::CashIn => self.cash_in = value,
            Field::Date | Field::Channel | Field::Campaign => {}
        }
    }
}

/// Field-wise sum of the ten measures over a row collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    pub spend: f64,
    pub impressions: f64,
    pub clicks: f64,
    pub leads: f64,
    pub booked: f64,
    pub show_ups: f64,
    pub qualified_calls: f64,
    pub deals_closed: f64,
    pub revenue: f64,
    pub cash_in: f64,
}

impl Totals {
    pub fn add(&mut self, row: &FactRow) {
        self.spend += row.spend;
        self.impressions += row.impressions;
        self.clicks += row.clicks;
        self.leads += row.leads;
        self.booked += row.booked;
        self.show_ups += row.show_ups;
        self.qualified_calls += row.qualified_calls;
        self.deals_closed += row.deals_closed;
        self.revenue += row.revenue;
        self.cash_in += row.cash_in;
    }

    pub fn get(&self, field: Field) -> f64 {
        match field {
            Field::Spend => self.spend,
            Field::Impressions => self.impressions,
            Field::Clicks => self.clicks,
            Field::Leads => self.leads,
            Field::Booked => self.booked,
            Field::ShowUps => self.show_ups,
            Field::QualifiedCalls => self.qualified_calls,
            Field::DealsClosed => self.deals_closed,
            Field::Revenue => self.revenue,
            Field::CashIn => self.cash_in,
            Field::Date | Field::Channel | Field::Campaign => 0.0,
        }
    }
}

/// How a metric value is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// Fraction shown as a percentage with the given number of decimals.
    Percent(usize),
    Currency,
    /// Ratio shown as `2.50x`.
    Multiple,
}

/// The eleven derived funnel metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricName {
    Ctr,
    Cpc,
    LeadConv,
    Cpl,
    BookRate,
    ShowRate,
    QualCallRate,
    CloseRate,
    Cpa,
    Roas,
    Mer,
}

impl MetricName {
    pub const COUNT: usize = 11;

    pub const ALL: [MetricName; MetricName::COUNT] = [
        MetricName::Ctr,
        MetricName::Cpc,
        MetricName::LeadConv,
        MetricName::Cpl,
        MetricName::BookRate,
        MetricName::ShowRate,
        MetricName::QualCallRate,
        MetricName::CloseRate,
        MetricName::Cpa,
        MetricName::Roas,
        MetricName::Mer,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn key(self) -> &'static str {
        match self {
            MetricName::Ctr => "ctr",
            MetricName::Cpc => "cpc",
            MetricName::LeadConv => "lead_conv",
            MetricName::Cpl => "cpl",
            MetricName::BookRate => "book_rate",
            MetricName::ShowRate => "show_rate",
            MetricName::QualCallRate => "qual_call_rate",
            MetricName::CloseRate => "close_rate",
            MetricName::Cpa => "cpa",
            MetricName::Roas => "roas",
            MetricName::Mer => "mer",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MetricName::Ctr => "Click-Through Rate (CTR)",
            MetricName::Cpc => "Cost per Click (CPC)",
            MetricName::LeadConv => "Lead Conversion Rate (Clicks → Leads)",
            MetricName::Cpl => "Cost per Lead (CPL)",
            MetricName::BookRate => "Booking Rate (Leads → Booked)",
            MetricName::ShowRate => "Show-Up Rate (Booked → Show-Ups)",
            MetricName::QualCallRate => "Qualified Call Rate (Show-Ups → Qualified Calls)",
            MetricName::CloseRate => "Close Rate (Qualified Calls → Deals Closed)",
            MetricName::Cpa => "Cost per Acquisition (CPA)",
            MetricName::Roas => "Return on Ad Spend (ROAS)",
            MetricName::Mer => "Marketing Efficiency Ratio (MER)",
        }
    }

    pub fn unit(self) -> Unit {
        match self {
            MetricName::Ctr => Unit::Percent(1),
            MetricName::LeadConv
            | MetricName::BookRate
            | MetricName::ShowRate
            | MetricName::QualCallRate
            | MetricName::CloseRate => Unit::Percent(2),
            MetricName::Cpc | MetricName::Cpl | MetricName::Cpa => Unit::Currency,
            MetricName::Roas | MetricName::Mer => Unit::Multiple,
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for MetricName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        MetricName::ALL
            .iter()
            .copied()
            .find(|m| m.key() == wanted)
            .ok_or_else(|| format!("unknown metric '{}'", s))
    }
}

/// Derived scalar set. Every value is finite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Metrics {
    pub ctr: f64,
    pub cpc: f64,
    pub lead_conv: f64,
    pub cpl: f64,
    pub book_rate: f64,
    pub show_rate: f64,
    pub qual_call_rate: f64,
    pub close_rate: f64,
    pub cpa: f64,
    pub roas: f64,
    pub mer: f64,
}

impl Metrics {
    pub fn get(&self, metric: MetricName) -> f64 {
        match metric {
            MetricName::Ctr => self.ctr,
            MetricName::Cpc => self.cpc,
            MetricName::LeadConv => self.lead_conv,
            MetricName::Cpl => self.cpl,
            MetricName::BookRate => self.book_rate,
            MetricName::ShowRate => self.show_rate,
            MetricName::QualCallRate => self.qual_call_rate,
            MetricName::CloseRate => self.close_rate,
            MetricName::Cpa => self.cpa,
            MetricName::Roas => self.roas,
            MetricName::Mer => self.mer,
        }
    }

    pub(crate) fn set(&mut self, metric: MetricName, value: f64) {
        match metric {
            MetricName::Ctr => self.ctr = value,
            MetricName::Cpc => self.cpc = value,
            MetricName::LeadConv => self.lead_conv = value,
            MetricName::Cpl => self.cpl = value,
            MetricName::BookRate => self.book_rate = value,
            MetricName::ShowRate => self.show_rate = value,
            MetricName::QualCallRate => self.qual_call_rate = value,
            MetricName::CloseRate => self.close_rate = value,
            MetricName::Cpa => self.cpa = value,
            MetricName::Roas => self.roas = value,
            MetricName::Mer => self.mer = value,
        }
    }
}

/// Qualitative bucket for a metric value. Ordered `Risky < Fair < Good < Excellent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    Risky,
    Fair,
    Good,
    Excellent,
}

impl Tier {
    pub fn needs_attention(self) -> bool {
        matches!(self, Tier::Fair | Tier::Risky)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Excellent => "Excellent",
            Tier::Good => "Good",
            Tier::Fair => "Fair",
            Tier::Risky => "Risky",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Date range and channel selection supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub channel: String,
}

impl Default for FilterState {
    fn default() -> Self {
        FilterState {
            start: None,
            end: None,
            channel: ALL_CHANNELS.to_string(),
        }
    }
}

/// Time bucket size for trend series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Day,
    Week,
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" | "daily" => Ok(Granularity::Day),
            "week" | "weekly" => Ok(Granularity::Week),
            other => Err(format!("unknown granularity '{}' (expected day or week)", other)),
        }
    }
}

/// Metrics that can be plotted as a trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendMetric {
    #[default]
    Ctr,
    Cpc,
    Cpl,
    Mer,
}

impl TrendMetric {
    pub fn metric(self) -> MetricName {
        match self {
            TrendMetric::Ctr => MetricName::Ctr,
            TrendMetric::Cpc => MetricName::Cpc,
            TrendMetric::Cpl => MetricName::Cpl,
            TrendMetric::Mer => MetricName::Mer,
        }
    }
}

impl FromStr for TrendMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ctr" => Ok(TrendMetric::Ctr),
            "cpc" => Ok(TrendMetric::Cpc),
            "cpl" => Ok(TrendMetric::Cpl),
            "mer" => Ok(TrendMetric::Mer),
            other => Err(format!("unknown trend metric '{}' (expected ctr, cpc, cpl or mer)", other)),
        }
    }
}

/// One point of a trend series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub bucket_start: NaiveDate,
    pub label: String,
    pub value: f64,
}

/// A metric together with its tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassifiedMetric {
    pub metric: MetricName,
    pub value: f64,
    pub tier: Tier,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierCounts {
    pub excellent: usize,
    pub good: usize,
    pub fair: usize,
    pub risky: usize,
}

/// Metrics classified Fair or Risky, plus the count of every tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FocusList {
    pub risky: Vec<ClassifiedMetric>,
    pub fair: Vec<ClassifiedMetric>,
    pub counts: TierCounts,
}

impl FocusList {
    pub fn is_empty(&self) -> bool {
        self.risky.is_empty() && self.fair.is_empty()
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct KpiCardRow {
    #[serde(rename = "Kpi")]
    #[tabled(rename = "KPI")]
    pub label: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
    #[serde(rename = "Status")]
    #[tabled(rename = "Status")]
    pub status: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct FunnelStepRow {
    #[serde(rename = "Step")]
    #[tabled(rename = "Step")]
    pub step: String,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: String,
    #[serde(rename = "StepRate")]
    #[tabled(rename = "Step Rate")]
    pub rate: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct BenchmarkRow {
    #[serde(rename = "Metric")]
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
    #[serde(rename = "Tier")]
    #[tabled(rename = "Tier")]
    pub tier: Tier,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct FactTableRow {
    #[serde(rename = "Date")]
    #[tabled(rename = "DATE")]
    pub date: String,
    #[serde(rename = "Channel")]
    #[tabled(rename = "CHAN")]
    pub channel: String,
    #[serde(rename = "Spend")]
    #[tabled(rename = "SPEND")]
    pub spend: String,
    #[serde(rename = "Clicks")]
    #[tabled(rename = "CLICK")]
    pub clicks: String,
    #[serde(rename = "Leads")]
    #[tabled(rename = "LEAD")]
    pub leads: String,
    #[serde(rename = "QualifiedCalls")]
    #[tabled(rename = "QUAL CALLS")]
    pub qualified_calls: String,
    #[serde(rename = "Booked")]
    #[tabled(rename = "BOOK")]
    pub booked: String,
    #[serde(rename = "ShowUps")]
    #[tabled(rename = "SHOW")]
    pub show_ups: String,
    #[serde(rename = "DealsClosed")]
    #[tabled(rename = "DEALS")]
    pub deals_closed: String,
    #[serde(rename = "Revenue")]
    #[tabled(rename = "REV")]
    pub revenue: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SeriesRow {
    #[serde(rename = "Bucket")]
    #[tabled(rename = "Bucket")]
    pub label: String,
    #[serde(rename = "BucketStart")]
    #[tabled(rename = "Start")]
    pub bucket_start: NaiveDate,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
}

/// Everything the summary view shows, in a JSON-friendly shape.
#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub filter: FilterState,
    pub row_count: usize,
    pub totals: Totals,
    pub metrics: Metrics,
    pub classified: Vec<ClassifiedMetric>,
    pub focus: FocusList,
}
