//! Record normalizer: raw spreadsheet-ish rows -> canonical [`Record`]s.
//!
//! - Column labels are matched case-insensitively, ignoring whitespace and underscores.
//! - Dates may arrive as native dates, spreadsheet serial numbers (epoch `1899-12-30`)
//!   or free text; every accepted shape yields the same `YYYY-MM-DD` string.
//! - A row whose date cannot be derived is rejected with a [`RejectReason`]; other rows
//!   are unaffected.

use crate::models::{RawRow, RawValue, Record, UNKNOWN};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use log::{debug, warn};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use thiserror::Error;

/// Accepted column aliases per field, already in normalized form.
const DATE_KEYS: &[&str] = &["date", "appointmentdate", "apptdate"];
const LOCATION_KEYS: &[&str] = &["location", "locationname", "city"];
const SOURCE_KEYS: &[&str] = &[
    "source",
    "apptsource",
    "appointmentsource",
    "referralsource",
    "sourcename",
];
const SERVICE_KEYS: &[&str] = &[
    "service",
    "servicename",
    "apptservice",
    "appointmentservice",
];

/// Largest serial a spreadsheet can represent (9999-12-31).
const MAX_SERIAL: f64 = 2_958_465.0;

/// Why a raw row was not turned into a record.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum RejectReason {
    #[error("no date column or the date cell is empty")]
    MissingDate,
    #[error("unparseable date `{0}`")]
    UnparseableDate(String),
    #[error("date serial {0} is outside the supported range")]
    SerialOutOfRange(f64),
}

/// A rejected row and its zero-based position in the input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    pub row: usize,
    pub reason: RejectReason,
}

/// Result of normalizing a batch of rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub records: Vec<Record>,
    pub rejected: Vec<Rejection>,
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"))
}

fn ordinal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(\d{1,2})(st|nd|rd|th)\b").expect("valid ordinal regex"))
}

/// Normalize a column label: lower-case, strip whitespace and underscores.
pub fn normalize_key(key: &str) -> String {
    whitespace_re()
        .replace_all(&key.to_lowercase(), "")
        .replace('_', "")
}

fn excel_epoch() -> NaiveDate {
    // 1899-12-30 always exists; keep the fallback total anyway.
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or(NaiveDate::MIN)
}

/// Convert a spreadsheet serial day count into a date. Fractions (time of day) are dropped.
pub fn date_from_serial(serial: f64) -> Result<NaiveDate, RejectReason> {
    if !serial.is_finite() || serial < 1.0 || serial > MAX_SERIAL {
        return Err(RejectReason::SerialOutOfRange(serial));
    }
    excel_epoch()
        .checked_add_signed(Duration::days(serial.floor() as i64))
        .ok_or(RejectReason::SerialOutOfRange(serial))
}

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%a %b %d %Y",
    "%A, %B %d, %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parse free text into a date, trying ISO first, then common spreadsheet renderings.
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.date_naive());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.date());
        }
    }
    // "March 3rd, 2024" -> "March 3, 2024"
    let cleaned = ordinal_re().replace_all(trimmed, "$1");
    let cleaned = whitespace_re().replace_all(&cleaned, " ");
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&cleaned, fmt).ok())
}

/// Coerce any supported cell shape into a calendar date.
///
/// Numeric text is treated as a serial, since spreadsheet exports often stringify
/// date cells that way. Four bare digits are a year and mean January 1st of it.
pub fn coerce_date(value: &RawValue) -> Result<NaiveDate, RejectReason> {
    match value {
        RawValue::Empty => Err(RejectReason::MissingDate),
        RawValue::Date(d) => Ok(*d),
        RawValue::Number(n) => date_from_serial(*n),
        RawValue::Text(s) => {
            let t = s.trim();
            if t.is_empty() {
                return Err(RejectReason::MissingDate);
            }
            if t.len() == 4 && t.bytes().all(|b| b.is_ascii_digit()) {
                return t
                    .parse::<i32>()
                    .ok()
                    .and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1))
                    .ok_or_else(|| RejectReason::UnparseableDate(t.to_string()));
            }
            if let Ok(n) = t.parse::<f64>() {
                return date_from_serial(n);
            }
            parse_date_text(t).ok_or_else(|| RejectReason::UnparseableDate(t.to_string()))
        }
    }
}

/// Render a cell as a trimmed, non-empty string.
fn cell_text(value: &RawValue) -> Option<String> {
    let s = match value {
        RawValue::Empty => return None,
        RawValue::Text(s) => s.trim().to_string(),
        RawValue::Number(n) if !n.is_finite() => return None,
        RawValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
        RawValue::Number(n) => n.to_string(),
        RawValue::Date(d) => d.format("%Y-%m-%d").to_string(),
    };
    if s.is_empty() { None } else { Some(s) }
}

/// First non-blank cell whose normalized label matches one of `aliases` (in alias order).
/// Later duplicate columns win over earlier ones.
fn lookup<'a>(normalized: &[(String, &'a RawValue)], aliases: &[&str]) -> Option<&'a RawValue> {
    aliases.iter().find_map(|alias| {
        normalized
            .iter()
            .rev()
            .find(|(k, _)| k == alias)
            .map(|(_, v)| *v)
            .filter(|v| !v.is_blank())
    })
}

/// Normalize one raw row.
pub fn normalize_row(row: &RawRow) -> Result<Record, RejectReason> {
    let normalized: Vec<(String, &RawValue)> = row
        .cells
        .iter()
        .map(|(k, v)| (normalize_key(k), v))
        .collect();

    let date = lookup(&normalized, DATE_KEYS)
        .ok_or(RejectReason::MissingDate)
        .and_then(coerce_date)?;

    let text_or = |aliases: &[&str], fallback: &str| {
        lookup(&normalized, aliases)
            .and_then(cell_text)
            .unwrap_or_else(|| fallback.to_string())
    };

    Ok(Record {
        date: date.format("%Y-%m-%d").to_string(),
        location: text_or(LOCATION_KEYS, UNKNOWN),
        source: text_or(SOURCE_KEYS, UNKNOWN),
        service: lookup(&normalized, SERVICE_KEYS).and_then(cell_text),
    })
}

/// Normalize a batch. Each row is handled independently; rejections are collected.
pub fn normalize_rows(rows: &[RawRow]) -> Normalized {
    let mut out = Normalized::default();
    for (idx, row) in rows.iter().enumerate() {
        match normalize_row(row) {
            Ok(rec) => out.records.push(rec),
            Err(reason) => {
                warn!("dropping row {}: {}", idx, reason);
                out.rejected.push(Rejection { row: idx, reason });
            }
        }
    }
    debug!(
        "normalized {} rows: {} accepted, {} rejected",
        rows.len(),
        out.records.len(),
        out.rejected.len()
    );
    out
}
