use thiserror::Error;

/// Failure to obtain a usable dataset from the source. The dashboard keeps its
/// previous dataset whenever one of these is returned.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV parse failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("No rows found in CSV.")]
    NoRows,

    #[error("no usable rows: all {rejected} records had a missing or unparsable date")]
    NoUsableRows { rejected: usize },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown field '{0}' in [aliases]")]
    UnknownField(String),

    #[error("unknown metric '{0}'")]
    UnknownMetric(String),

    #[error("formula for {metric} uses non-numeric field {field}")]
    NonNumericField { metric: String, field: String },

    #[error("formula for {metric} divides {field} by itself")]
    DegenerateFormula { metric: String, field: String },

    #[error("thresholds for {metric} are not monotonic: excellent {excellent}, good {good}, fair {fair}")]
    NonMonotonicLadder {
        metric: String,
        excellent: f64,
        good: f64,
        fair: f64,
    },

    #[error("alias list for {0} is empty")]
    EmptyAliasList(String),
}

pub type FetchResult<T> = Result<T, FetchError>;
