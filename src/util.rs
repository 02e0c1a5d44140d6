// Cell coercion for sheet exports (money and count text to f64, the handful of
// date layouts marketers type by hand) and the number/currency/percent strings
// the reports print.
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

const CURRENCY_SYMBOLS: [char; 9] = ['₱', '$', '€', '£', '¥', '₹', '₩', '₽', '¢'];

const DATE_FORMATS: [&str; 10] = [
    "%Y-%m-%d",
    // %Y also accepts two digits, so the short year has to be tried first.
    "%m/%d/%y",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d-%b-%Y",
    "%A, %B %d, %Y",
    "%a, %B %d, %Y",
];

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%m/%d/%y %H:%M:%S",
    "%m/%d/%y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Coerce a spreadsheet cell into a finite number.
///
/// - Strips currency symbols, thousands separators, percent signs and spaces.
/// - Treats blank cells and the dash placeholders (`-`, `–`, `—`) as zero.
/// - Anything that still fails to parse, or parses to a non-finite value,
///   becomes zero. This never fails.
pub fn parse_number(raw: &str) -> f64 {
    let s = raw.trim();
    if matches!(s, "" | "-" | "–" | "—") {
        return 0.0;
    }
    let cleaned: String = s
        .chars()
        .filter(|c| !(*c == ',' || *c == '%' || c.is_whitespace() || CURRENCY_SYMBOLS.contains(c)))
        .collect();
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Parse the date formats that show up in exported marketing sheets:
/// ISO (`2026-01-01`), US slash (`1/1/2026`) and long form (`January 1, 2026`),
/// plus a few close relatives. Time-of-day suffixes are dropped.
pub fn parse_date_any(raw: &str) -> Option<NaiveDate> {
    let s = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(&s, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Division that yields 0 instead of NaN or infinity.
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !numerator.is_finite() || !denominator.is_finite() {
        return 0.0;
    }
    let q = numerator / denominator;
    if q.is_finite() {
        q
    } else {
        0.0
    }
}

/// Monday of the ISO week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Trim, lowercase and collapse internal whitespace.
pub fn normalize_header(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// `M/D`, the compact label used in tables and daily trend buckets.
pub fn short_date(date: NaiveDate) -> String {
    format!("{}/{}", date.month(), date.day())
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus locale-aware thousands separators (`1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg && res.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

/// Whole-unit currency amount, e.g. `₱12,345`.
pub fn format_currency(n: f64, symbol: &str) -> String {
    format!("{}{}", symbol, format_number(n, 0))
}

/// Fraction rendered as a percentage, e.g. `0.0125` → `1.25%`.
pub fn format_percent(fraction: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, fraction * 100.0)
}

pub fn format_multiple(n: f64) -> String {
    format!("{:.2}x", n)
}
