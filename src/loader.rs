use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{FetchError, FetchResult};
use crate::headers::{AliasTable, HeaderMap};
use crate::types::{FactRow, Field, UNKNOWN_CHANNEL};
use crate::util::{parse_date_any, parse_number};

/// Header row plus data records exactly as the source delivered them.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub records: Vec<StringRecord>,
}

impl RawTable {
    pub fn from_reader<R: Read>(reader: R) -> FetchResult<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let header_bytes = rdr.byte_headers()?.clone();
        let headers: Vec<String> = StringRecord::from_byte_record_lossy(header_bytes)
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        let mut records = Vec::new();
        let mut lossy = 0usize;
        for result in rdr.byte_records() {
            let bytes = result?;
            let record = match StringRecord::from_byte_record(bytes) {
                Ok(record) => record,
                Err(e) => {
                    lossy += 1;
                    StringRecord::from_byte_record_lossy(e.into_byte_record())
                }
            };
            if record.iter().all(|v| v.trim().is_empty()) {
                continue;
            }
            records.push(record);
        }
        if lossy > 0 {
            warn!(records = lossy, "replaced invalid UTF-8 in records");
        }
        if records.is_empty() {
            return Err(FetchError::NoRows);
        }
        Ok(RawTable { headers, records })
    }

    /// Read a CSV export from disk without blocking the runtime.
    pub async fn from_path(path: &Path) -> FetchResult<Self> {
        let bytes = tokio::fs::read(path).await.map_err(|source| FetchError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_reader(bytes.as_slice())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub total_records: usize,
    pub kept_rows: usize,
    pub rejected_rows: usize,
    /// Canonical field and the source header it was read from.
    pub resolved_columns: Vec<(Field, String)>,
    pub unresolved_fields: Vec<Field>,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

/// The normalized rows of one successful load.
#[derive(Debug, Clone)]
pub struct Dataset {
    rows: Vec<FactRow>,
}

impl Dataset {
    pub fn from_rows(rows: Vec<FactRow>) -> Self {
        Dataset { rows }
    }

    pub fn rows(&self) -> &[FactRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Earliest and latest row date.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.rows.iter().map(|r| r.date).min()?;
        let last = self.rows.iter().map(|r| r.date).max()?;
        Some((first, last))
    }
}

/// Turn one raw record into a [`FactRow`]. Returns `None` when the date is
/// missing or unparsable; every other anomaly degrades to a default.
pub fn normalize_record(record: &StringRecord, map: &HeaderMap) -> Option<FactRow> {
    let date = parse_date_any(map.get(record, Field::Date)?)?;
    let mut row = FactRow::empty(date);

    let channel = map.get(record, Field::Channel).map(str::trim).unwrap_or("");
    if !channel.is_empty() {
        row.channel = channel.to_string();
    }
    row.campaign = map
        .get(record, Field::Campaign)
        .map(|c| c.trim().to_string())
        .unwrap_or_default();

    for field in Field::NUMERIC {
        if let Some(raw) = map.get(record, field) {
            row.set_value(field, parse_number(raw));
        }
    }
    Some(row)
}

/// Resolve headers once, then normalize every record.
pub fn build_dataset(table: &RawTable, aliases: &AliasTable) -> FetchResult<(Dataset, LoadReport)> {
    let header_map = HeaderMap::resolve(&table.headers, aliases);
    let unresolved = header_map.unresolved();
    let resolved_columns: Vec<(Field, String)> = Field::ALL
        .iter()
        .filter_map(|&f| header_map.header(f).map(|h| (f, h.to_string())))
        .collect();
    if !unresolved.is_empty() {
        let names: Vec<&str> = unresolved.iter().map(|f| f.name()).collect();
        warn!(fields = ?names, "no matching column; treating as absent");
    }
    if header_map.column(Field::Channel).is_none() {
        debug!("channel column missing; every row will use '{}'", UNKNOWN_CHANNEL);
    }

    let mut rows = Vec::with_capacity(table.records.len());
    let mut rejected = 0usize;
    for (idx, record) in table.records.iter().enumerate() {
        match normalize_record(record, &header_map) {
            Some(row) => rows.push(row),
            None => {
                rejected += 1;
                debug!(
                    record = idx + 1,
                    date = header_map.get(record, Field::Date).unwrap_or(""),
                    "dropping row without a usable date"
                );
            }
        }
    }

    if rejected > 0 {
        warn!(rejected, "rows skipped due to missing or unparsable dates");
    }
    if rows.is_empty() {
        return Err(FetchError::NoUsableRows { rejected });
    }

    let dataset = Dataset::from_rows(rows);
    let span = dataset.date_span();
    let report = LoadReport {
        total_records: table.records.len(),
        kept_rows: dataset.len(),
        rejected_rows: rejected,
        resolved_columns,
        unresolved_fields: unresolved,
        first_date: span.map(|(first, _)| first),
        last_date: span.map(|(_, last)| last),
    };
    info!(
        total = report.total_records,
        kept = report.kept_rows,
        rejected = report.rejected_rows,
        "dataset loaded"
    );
    Ok((dataset, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = "\
Date,Channel,Campaign,Ad Spend,Impressions,Clicks,Leads
2026-01-01,Facebook,Launch,\"₱1,234\",10000,100,10
not a date,Facebook,Launch,500,1,1,1
1/2/2026,, ,—,5000,50,5
,,,,,,
\"January 3, 2026\",Google,Search,-,0,0,0
";

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn reader_skips_blank_records() {
        let table = RawTable::from_reader(SHEET.as_bytes()).unwrap();
        assert_eq!(table.headers.len(), 7);
        assert_eq!(table.records.len(), 4);
    }

    #[test]
    fn header_only_source_is_a_fetch_failure() {
        let err = RawTable::from_reader("Date,Spend\n".as_bytes()).unwrap_err();
        assert!(matches!(err, FetchError::NoRows));
    }

    #[test]
    fn spend_text_normalizes_to_numbers() {
        let table = RawTable::from_reader(SHEET.as_bytes()).unwrap();
        let (dataset, _) = build_dataset(&table, &AliasTable::default()).unwrap();
        assert_eq!(dataset.rows()[0].spend, 1234.0);
        assert_eq!(dataset.rows()[1].spend, 0.0);
    }

    #[test]
    fn bad_dates_are_dropped_and_counted() {
        crate::logging::init_test();
        let table = RawTable::from_reader(SHEET.as_bytes()).unwrap();
        let (dataset, report) = build_dataset(&table, &AliasTable::default()).unwrap();
        assert_eq!(report.total_records, 4);
        assert_eq!(report.kept_rows, 3);
        assert_eq!(report.rejected_rows, 1);
        assert_eq!(report.first_date, Some(ymd(2026, 1, 1)));
        assert_eq!(report.last_date, Some(ymd(2026, 1, 3)));
        let dates: Vec<NaiveDate> = dataset.rows().iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![ymd(2026, 1, 1), ymd(2026, 1, 2), ymd(2026, 1, 3)]);
    }

    #[test]
    fn blank_channel_becomes_unknown() {
        let table = RawTable::from_reader(SHEET.as_bytes()).unwrap();
        let (dataset, _) = build_dataset(&table, &AliasTable::default()).unwrap();
        let row = &dataset.rows()[1];
        assert_eq!(row.channel, UNKNOWN_CHANNEL);
        assert_eq!(row.campaign, "");
        assert_eq!(row.clicks, 50.0);
    }

    #[test]
    fn missing_columns_read_as_zero() {
        let table = RawTable::from_reader(SHEET.as_bytes()).unwrap();
        let (dataset, report) = build_dataset(&table, &AliasTable::default()).unwrap();
        assert!(report.unresolved_fields.contains(&Field::Revenue));
        assert!(dataset.rows().iter().all(|r| r.revenue == 0.0 && r.cash_in == 0.0));
    }

    #[test]
    fn sheet_without_date_column_has_no_usable_rows() {
        let table = RawTable::from_reader("Channel,Spend\nFacebook,10\n".as_bytes()).unwrap();
        let err = build_dataset(&table, &AliasTable::default()).unwrap_err();
        assert!(matches!(err, FetchError::NoUsableRows { rejected: 1 }));
    }

    #[test]
    fn invalid_utf8_cell_does_not_abort_the_load() {
        let bytes = b"Date,Channel,Clicks\n2026-01-01,Face\xffbook,5\n2026-01-02,Google,7\n";
        let table = RawTable::from_reader(&bytes[..]).unwrap();
        assert_eq!(table.records.len(), 2);
        let (dataset, report) = build_dataset(&table, &AliasTable::default()).unwrap();
        assert_eq!(report.kept_rows, 2);
        assert_eq!(dataset.rows()[0].channel, "Face\u{FFFD}book");
        assert_eq!(dataset.rows()[1].clicks, 7.0);
    }

    #[test]
    fn report_lists_source_headers() {
        let table = RawTable::from_reader(SHEET.as_bytes()).unwrap();
        let (_, report) = build_dataset(&table, &AliasTable::default()).unwrap();
        assert!(report
            .resolved_columns
            .contains(&(Field::Spend, "Ad Spend".to_string())));
        assert_eq!(report.resolved_columns.len() + report.unresolved_fields.len(), Field::COUNT);
    }

    #[test]
    fn short_records_are_tolerated() {
        let table = RawTable::from_reader("Date,Channel,Clicks\n2026-01-01\n".as_bytes()).unwrap();
        let (dataset, _) = build_dataset(&table, &AliasTable::default()).unwrap();
        assert_eq!(dataset.rows()[0].channel, UNKNOWN_CHANNEL);
        assert_eq!(dataset.rows()[0].clicks, 0.0);
    }
}
