use std::collections::BTreeSet;

use crate::loader::Dataset;
use crate::types::{FactRow, FilterState, ALL_CHANNELS};

impl FilterState {
    /// Default view for a freshly loaded dataset: its full date span, all channels.
    pub fn full_range(dataset: &Dataset) -> Self {
        let span = dataset.date_span();
        FilterState {
            start: span.map(|(first, _)| first),
            end: span.map(|(_, last)| last),
            channel: ALL_CHANNELS.to_string(),
        }
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    /// Rows carry calendar dates, so comparing against `end` directly already
    /// includes the whole end day.
    pub fn matches(&self, row: &FactRow) -> bool {
        let after_start = self.start.map_or(true, |s| row.date >= s);
        let before_end = self.end.map_or(true, |e| row.date <= e);
        let channel_ok = self.channel == ALL_CHANNELS || row.channel == self.channel;
        after_start && before_end && channel_ok
    }
}

/// Rows passing `filter`, in input order.
pub fn filter_rows<'a, I>(rows: I, filter: &FilterState) -> Vec<&'a FactRow>
where
    I: IntoIterator<Item = &'a FactRow>,
{
    rows.into_iter().filter(|row| filter.matches(row)).collect()
}

/// "All" followed by the distinct non-empty channels in sorted order.
pub fn channels<'a, I>(rows: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a FactRow>,
{
    let distinct: BTreeSet<&str> = rows
        .into_iter()
        .map(|r| r.channel.as_str())
        .filter(|c| !c.is_empty())
        .collect();
    std::iter::once(ALL_CHANNELS)
        .chain(distinct)
        .map(str::to_string)
        .collect()
}
