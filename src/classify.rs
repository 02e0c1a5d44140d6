//! Tier classification of metric values and the attention ("focus") list.

use serde::{Deserialize, Serialize};

use crate::types::{ClassifiedMetric, FocusList, MetricName, Metrics, Tier, TierCounts};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Rates and efficiency ratios: bigger is better.
    Higher,
    /// Costs: smaller is better.
    Lower,
}

/// Three inclusive cutoffs; values failing all of them are Risky.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ladder {
    pub direction: Direction,
    pub excellent: f64,
    pub good: f64,
    pub fair: f64,
}

impl Ladder {
    pub const fn higher(excellent: f64, good: f64, fair: f64) -> Self {
        Ladder {
            direction: Direction::Higher,
            excellent,
            good,
            fair,
        }
    }

    pub const fn lower(excellent: f64, good: f64, fair: f64) -> Self {
        Ladder {
            direction: Direction::Lower,
            excellent,
            good,
            fair,
        }
    }

    pub fn classify(&self, value: f64) -> Tier {
        let passes = |cutoff: f64| match self.direction {
            Direction::Higher => value >= cutoff,
            Direction::Lower => value <= cutoff,
        };
        if passes(self.excellent) {
            Tier::Excellent
        } else if passes(self.good) {
            Tier::Good
        } else if passes(self.fair) {
            Tier::Fair
        } else {
            Tier::Risky
        }
    }

    /// Cutoffs must not get stricter going down the ladder.
    pub fn is_monotonic(&self) -> bool {
        let finite = self.excellent.is_finite() && self.good.is_finite() && self.fair.is_finite();
        finite
            && match self.direction {
                Direction::Higher => self.excellent >= self.good && self.good >= self.fair,
                Direction::Lower => self.excellent <= self.good && self.good <= self.fair,
            }
    }
}

/// Metrics that appear in the benchmark table and the focus list by default.
/// Book rate has no reference ladder and only joins once configured.
pub const BENCHMARKED: [MetricName; 10] = [
    MetricName::Ctr,
    MetricName::Cpc,
    MetricName::LeadConv,
    MetricName::Cpl,
    MetricName::ShowRate,
    MetricName::QualCallRate,
    MetricName::CloseRate,
    MetricName::Cpa,
    MetricName::Roas,
    MetricName::Mer,
];

/// One ladder per metric, plus which metrics are benchmarked.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdSet {
    ladders: [Ladder; MetricName::COUNT],
    benchmarked: [bool; MetricName::COUNT],
}

impl Default for ThresholdSet {
    fn default() -> Self {
        let mut ladders = [Ladder::higher(0.0, 0.0, 0.0); MetricName::COUNT];
        for metric in MetricName::ALL {
            ladders[metric.index()] = default_ladder(metric);
        }
        let mut benchmarked = [false; MetricName::COUNT];
        for metric in BENCHMARKED {
            benchmarked[metric.index()] = true;
        }
        ThresholdSet {
            ladders,
            benchmarked,
        }
    }
}

fn default_ladder(metric: MetricName) -> Ladder {
    match metric {
        MetricName::Ctr => Ladder::higher(0.015, 0.010, 0.007),
        MetricName::Cpc => Ladder::lower(20.0, 40.0, 70.0),
        MetricName::LeadConv => Ladder::higher(0.20, 0.10, 0.05),
        MetricName::Cpl => Ladder::lower(150.0, 300.0, 600.0),
        MetricName::BookRate => Ladder::higher(0.50, 0.35, 0.20),
        MetricName::ShowRate => Ladder::higher(0.70, 0.60, 0.50),
        MetricName::QualCallRate => Ladder::higher(0.20, 0.10, 0.05),
        MetricName::CloseRate => Ladder::higher(0.25, 0.15, 0.10),
        MetricName::Cpa => Ladder::lower(30_000.0, 45_000.0, 60_000.0),
        MetricName::Roas => Ladder::higher(4.0, 3.0, 2.0),
        MetricName::Mer => Ladder::higher(4.0, 3.0, 2.0),
    }
}

impl ThresholdSet {
    pub fn ladder(&self, metric: MetricName) -> Ladder {
        self.ladders[metric.index()]
    }

    /// Replace a ladder. The metric is benchmarked from then on.
    pub fn with_ladder(mut self, metric: MetricName, ladder: Ladder) -> Self {
        self.ladders[metric.index()] = ladder;
        self.benchmarked[metric.index()] = true;
        self
    }

    pub fn is_benchmarked(&self, metric: MetricName) -> bool {
        self.benchmarked[metric.index()]
    }

    pub fn classify(&self, metric: MetricName, value: f64) -> Tier {
        self.ladder(metric).classify(value)
    }

    /// Every benchmarked metric with its tier, in canonical metric order.
    pub fn classify_all(&self, metrics: &Metrics) -> Vec<ClassifiedMetric> {
        MetricName::ALL
            .iter()
            .filter(|&&metric| self.is_benchmarked(metric))
            .map(|&metric| {
                let value = metrics.get(metric);
                ClassifiedMetric {
                    metric,
                    value,
                    tier: self.classify(metric, value),
                }
            })
            .collect()
    }

    pub fn focus_list(&self, metrics: &Metrics) -> FocusList {
        focus_from(&self.classify_all(metrics))
    }
}

/// Split classified metrics into the Risky and Fair attention lists.
pub fn focus_from(classified: &[ClassifiedMetric]) -> FocusList {
    let mut focus = FocusList::default();
    let mut counts = TierCounts::default();
    for item in classified {
        match item.tier {
            Tier::Excellent => counts.excellent += 1,
            Tier::Good => counts.good += 1,
            Tier::Fair => {
                counts.fair += 1;
                focus.fair.push(*item);
            }
            Tier::Risky => {
                counts.risky += 1;
                focus.risky.push(*item);
            }
        }
    }
    focus.counts = counts;
    focus
}
