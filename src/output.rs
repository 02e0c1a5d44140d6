use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Print a markdown table with an optional title, or `(no rows)`.
pub fn preview_table<T>(title: Option<&str>, rows: &[T])
where
    T: Tabled + Clone,
{
    if let Some(t) = title {
        println!("{}\n", t);
    }
    if rows.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(rows.to_vec()).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

#[cfg(test)]
mod tests {
    use super::*;
    use funnel_report::types::{SeriesRow, Tier};

    #[test]
    fn csv_export_has_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.csv");
        let rows = vec![SeriesRow {
            label: "1/1".to_string(),
            bucket_start: chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            value: "1.0%".to_string(),
        }];
        write_csv(&path, &rows).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Bucket,BucketStart,Value"));
        assert_eq!(lines.next(), Some("1/1,2026-01-01,1.0%"));
    }

    #[test]
    fn json_export_round_trips_through_serde_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tier.json");
        write_json(&path, &vec![Tier::Good, Tier::Risky]).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value, serde_json::json!(["Good", "Risky"]));
    }
}
