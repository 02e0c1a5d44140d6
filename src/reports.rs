use crate::classify::ThresholdSet;
use crate::types::{
    BenchmarkRow, ClassifiedMetric, FactRow, FactTableRow, FocusList, FunnelStepRow, KpiCardRow,
    MetricName, Metrics, SeriesPoint, SeriesRow, Totals, TrendMetric, Unit,
};
use crate::util::{
    format_currency, format_int, format_multiple, format_number, format_percent, safe_div,
    short_date,
};

pub const DEFAULT_ROW_LIMIT: usize = 10;

/// Render a metric value the way the dashboard shows it.
pub fn format_metric(metric: MetricName, value: f64, currency: &str) -> String {
    match metric.unit() {
        Unit::Percent(decimals) => format_percent(value, decimals),
        Unit::Currency => format_currency(value, currency),
        Unit::Multiple => format_multiple(value),
    }
}

fn format_count(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        format_int(n as i64)
    } else {
        format_number(n, 2)
    }
}

pub fn kpi_cards(
    totals: &Totals,
    metrics: &Metrics,
    thresholds: &ThresholdSet,
    currency: &str,
) -> Vec<KpiCardRow> {
    let card = |label: &str, value: String, status: String| KpiCardRow {
        label: label.to_string(),
        value,
        status,
    };
    vec![
        card("Ad Spend", format_currency(totals.spend, currency), String::new()),
        card("Revenue (Booked)", format_currency(totals.revenue, currency), String::new()),
        card("Cash Collected", format_currency(totals.cash_in, currency), String::new()),
        card("Qualified Calls", format_count(totals.qualified_calls), String::new()),
        card("Deals Closed", format_count(totals.deals_closed), String::new()),
        card("Return on Ad Spend (ROAS)", format_multiple(metrics.roas), String::new()),
        card("Marketing Efficiency Ratio (MER)", format_multiple(metrics.mer), String::new()),
        card(
            "Cost per Acquisition (CPA)",
            format_currency(metrics.cpa, currency),
            thresholds.classify(MetricName::Cpa, metrics.cpa).to_string(),
        ),
    ]
}

/// Impressions down to deals, each step with its conversion from the one above.
pub fn funnel_steps(totals: &Totals, metrics: &Metrics) -> Vec<FunnelStepRow> {
    let steps = [
        ("Impressions", totals.impressions, None),
        ("Clicks", totals.clicks, Some(metrics.ctr)),
        ("Leads", totals.leads, Some(metrics.lead_conv)),
        ("Booked", totals.booked, Some(safe_div(totals.booked, totals.leads))),
        ("Show-Ups", totals.show_ups, Some(metrics.show_rate)),
        ("Qualified Calls", totals.qualified_calls, Some(metrics.qual_call_rate)),
        ("Deals Closed", totals.deals_closed, Some(metrics.close_rate)),
    ];
    steps
        .iter()
        .map(|(name, count, rate)| FunnelStepRow {
            step: name.to_string(),
            count: format_count(*count),
            rate: rate.map(|r| format_percent(r, 1)).unwrap_or_default(),
        })
        .collect()
}

pub fn benchmark_rows(classified: &[ClassifiedMetric], currency: &str) -> Vec<BenchmarkRow> {
    classified
        .iter()
        .map(|c| BenchmarkRow {
            metric: c.metric.label().to_string(),
            value: format_metric(c.metric, c.value, currency),
            tier: c.tier,
        })
        .collect()
}

/// "Needs Attention: 1 Risky · 2 Fair" followed by one line per flagged metric.
pub fn focus_lines(focus: &FocusList, currency: &str) -> Vec<String> {
    let mut lines = vec![format!(
        "Needs Attention: {} Risky · {} Fair",
        focus.counts.risky, focus.counts.fair
    )];
    if focus.is_empty() {
        lines.push("All good, no Fair/Risky signals right now.".to_string());
        return lines;
    }
    for item in focus.risky.iter().chain(focus.fair.iter()) {
        lines.push(format!(
            "{}: {} ({})",
            item.tier,
            item.metric.label(),
            format_metric(item.metric, item.value, currency)
        ));
    }
    lines
}

/// Case-insensitive match against the row's short date, channel and campaign.
pub fn row_matches_search(row: &FactRow, search: &str) -> bool {
    let needle = search.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    let haystack =
        format!("{} {} {}", short_date(row.date), row.channel, row.campaign).to_lowercase();
    haystack.contains(&needle)
}

pub fn row_table(
    rows: &[&FactRow],
    search: &str,
    limit: usize,
    currency: &str,
) -> Vec<FactTableRow> {
    rows.iter()
        .filter(|r| row_matches_search(r, search))
        .take(limit)
        .map(|r| FactTableRow {
            date: short_date(r.date),
            channel: r.channel.clone(),
            spend: format_currency(r.spend, currency),
            clicks: format_count(r.clicks),
            leads: format_count(r.leads),
            qualified_calls: format_count(r.qualified_calls),
            booked: format_count(r.booked),
            show_ups: format_count(r.show_ups),
            deals_closed: format_count(r.deals_closed),
            revenue: format_currency(r.revenue, currency),
        })
        .collect()
}

pub fn series_rows(series: &[SeriesPoint], metric: TrendMetric, currency: &str) -> Vec<SeriesRow> {
    series
        .iter()
        .map(|p| SeriesRow {
            label: p.label.clone(),
            bucket_start: p.bucket_start,
            value: format_metric(metric.metric(), p.value, currency),
        })
        .collect()
}
