//! Totals and derived funnel metrics.

use serde::{Deserialize, Serialize};

use crate::types::{FactRow, Field, MetricName, Metrics, Totals};
use crate::util::safe_div;

/// `numerator / denominator` over two canonical measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ratio {
    pub numerator: Field,
    pub denominator: Field,
}

impl Ratio {
    pub const fn new(numerator: Field, denominator: Field) -> Self {
        Ratio {
            numerator,
            denominator,
        }
    }

    pub fn eval(&self, totals: &Totals) -> f64 {
        safe_div(totals.get(self.numerator), totals.get(self.denominator))
    }
}

/// Formula for every metric. Deployments may override individual entries.
#[derive(Debug, Clone, PartialEq)]
pub struct FormulaSet {
    ratios: [Ratio; MetricName::COUNT],
}

impl Default for FormulaSet {
    fn default() -> Self {
        let mut ratios = [Ratio::new(Field::Clicks, Field::Impressions); MetricName::COUNT];
        for metric in MetricName::ALL {
            ratios[metric.index()] = canonical_ratio(metric);
        }
        FormulaSet { ratios }
    }
}

impl FormulaSet {
    pub fn ratio(&self, metric: MetricName) -> Ratio {
        self.ratios[metric.index()]
    }

    pub fn with_ratio(mut self, metric: MetricName, ratio: Ratio) -> Self {
        self.ratios[metric.index()] = ratio;
        self
    }
}

fn canonical_ratio(metric: MetricName) -> Ratio {
    use Field::*;
    match metric {
        MetricName::Ctr => Ratio::new(Clicks, Impressions),
        MetricName::Cpc => Ratio::new(Spend, Clicks),
        MetricName::LeadConv => Ratio::new(Leads, Clicks),
        MetricName::Cpl => Ratio::new(Spend, Leads),
        MetricName::BookRate => Ratio::new(Booked, Leads),
        MetricName::ShowRate => Ratio::new(ShowUps, Booked),
        MetricName::QualCallRate => Ratio::new(QualifiedCalls, ShowUps),
        MetricName::CloseRate => Ratio::new(DealsClosed, QualifiedCalls),
        MetricName::Cpa => Ratio::new(Spend, DealsClosed),
        MetricName::Roas => Ratio::new(Revenue, Spend),
        MetricName::Mer => Ratio::new(CashIn, Spend),
    }
}

pub fn compute_totals<'a, I>(rows: I) -> Totals
where
    I: IntoIterator<Item = &'a FactRow>,
{
    let mut totals = Totals::default();
    for row in rows {
        totals.add(row);
    }
    totals
}

pub fn compute_metrics(totals: &Totals, formulas: &FormulaSet) -> Metrics {
    let mut metrics = Metrics::default();
    for metric in MetricName::ALL {
        metrics.set(metric, formulas.ratio(metric).eval(totals));
    }
    metrics
}

pub fn aggregate<'a, I>(rows: I, formulas: &FormulaSet) -> (Totals, Metrics)
where
    I: IntoIterator<Item = &'a FactRow>,
{
    let totals = compute_totals(rows);
    let metrics = compute_metrics(&totals, formulas);
    (totals, metrics)
}
