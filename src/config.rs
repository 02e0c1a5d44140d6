//! Deployment configuration: currency, header aliases, metric formulas and
//! tier thresholds. Loaded from TOML; every section is optional and only the
//! entries present override the built-in defaults.
//!
//! ```toml
//! currency_symbol = "₱"
//!
//! [aliases]
//! spend = ["ad spend", "spend", "media cost"]
//!
//! [formulas]
//! close_rate = { numerator = "deals_closed", denominator = "show_ups" }
//!
//! [thresholds.cpa]
//! direction = "lower"
//! excellent = 3000
//! good = 4500
//! fair = 6000
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::classify::{Ladder, ThresholdSet};
use crate::error::ConfigError;
use crate::headers::AliasTable;
use crate::metrics::{FormulaSet, Ratio};
use crate::types::{Field, MetricName};

/// On-disk shape of the config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub currency_symbol: Option<String>,
    pub aliases: BTreeMap<String, Vec<String>>,
    pub formulas: BTreeMap<String, Ratio>,
    pub thresholds: BTreeMap<String, Ladder>,
}

/// Validated settings the pipeline runs with.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub currency_symbol: String,
    pub aliases: AliasTable,
    pub formulas: FormulaSet,
    pub thresholds: ThresholdSet,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            currency_symbol: "₱".to_string(),
            aliases: AliasTable::default(),
            formulas: FormulaSet::default(),
            thresholds: ThresholdSet::default(),
        }
    }
}

impl DashboardConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        info!(path = %path.display(), "loaded dashboard config");
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(text)?;
        Self::from_file(file)
    }

    pub fn from_file(file: ConfigFile) -> Result<Self, ConfigError> {
        let mut config = DashboardConfig::default();

        if let Some(symbol) = file.currency_symbol {
            config.currency_symbol = symbol;
        }

        for (name, list) in file.aliases {
            let field: Field = name.parse().map_err(|_| ConfigError::UnknownField(name.clone()))?;
            if list.iter().all(|a| a.trim().is_empty()) {
                return Err(ConfigError::EmptyAliasList(name));
            }
            config.aliases = config.aliases.with_aliases(field, list);
        }

        for (name, ratio) in file.formulas {
            let metric: MetricName = name.parse().map_err(|_| ConfigError::UnknownMetric(name.clone()))?;
            for field in [ratio.numerator, ratio.denominator] {
                if !field.is_numeric() {
                    return Err(ConfigError::NonNumericField {
                        metric: name,
                        field: field.to_string(),
                    });
                }
            }
            if ratio.numerator == ratio.denominator {
                return Err(ConfigError::DegenerateFormula {
                    metric: name,
                    field: ratio.numerator.to_string(),
                });
            }
            config.formulas = config.formulas.with_ratio(metric, ratio);
        }

        for (name, ladder) in file.thresholds {
            let metric: MetricName = name.parse().map_err(|_| ConfigError::UnknownMetric(name.clone()))?;
            if !ladder.is_monotonic() {
                return Err(ConfigError::NonMonotonicLadder {
                    metric: name,
                    excellent: ladder.excellent,
                    good: ladder.good,
                    fair: ladder.fair,
                });
            }
            config.thresholds = config.thresholds.with_ladder(metric, ladder);
        }

        Ok(config)
    }
}
