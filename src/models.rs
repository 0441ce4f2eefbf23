use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Placeholder label shown when a KPI has no data to rank.
pub const EMPTY_LABEL: &str = "—";

/// Default for `location`/`source` when the raw row leaves them blank.
pub const UNKNOWN: &str = "Unknown";

/// One normalized appointment (one row = one appointment).
///
/// `date` is always a valid `YYYY-MM-DD` string; the normalizer drops rows
/// that cannot produce one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Record {
    pub date: String,
    pub location: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

impl Record {
    pub fn new(date: &str, location: &str, source: &str) -> Self {
        Self {
            date: date.into(),
            location: location.into(),
            source: source.into(),
            service: None,
        }
    }

    pub fn with_service(mut self, service: &str) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Parsed calendar date. `None` only for records that bypassed the normalizer.
    pub fn naive_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()
    }

    pub fn year(&self) -> Option<i32> {
        self.naive_date().map(|d| d.year())
    }

    /// Value of one dimension; `None` only for an absent service.
    pub fn dimension(&self, dim: Dimension) -> Option<&str> {
        match dim {
            Dimension::Source => Some(self.source.as_str()),
            Dimension::Location => Some(self.location.as_str()),
            Dimension::Service => self.service.as_deref(),
        }
    }
}

/// A single untyped cell as delivered by a spreadsheet or file decoder.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl RawValue {
    pub fn is_blank(&self) -> bool {
        match self {
            RawValue::Empty => true,
            RawValue::Text(s) => s.trim().is_empty(),
            RawValue::Number(n) => !n.is_finite(),
            RawValue::Date(_) => false,
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        RawValue::Number(n)
    }
}

impl From<NaiveDate> for RawValue {
    fn from(d: NaiveDate) -> Self {
        RawValue::Date(d)
    }
}

impl From<serde_json::Value> for RawValue {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value;
        match v {
            Value::Null => RawValue::Empty,
            Value::String(s) => RawValue::Text(s),
            Value::Number(n) => n.as_f64().map(RawValue::Number).unwrap_or(RawValue::Empty),
            Value::Bool(b) => RawValue::Text(b.to_string()),
            other => RawValue::Text(other.to_string()),
        }
    }
}

/// One raw ingested row: column label -> cell, in source column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    pub cells: Vec<(String, RawValue)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, value: impl Into<RawValue>) -> Self {
        self.cells.push((column.to_string(), value.into()));
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: RawValue) {
        self.cells.push((column.into(), value));
    }
}

impl From<&Record> for RawRow {
    fn from(r: &Record) -> Self {
        let row = RawRow::new()
            .with("date", r.date.as_str())
            .with("location", r.location.as_str())
            .with("source", r.source.as_str());
        match &r.service {
            Some(s) => row.with("service", s.as_str()),
            None => row,
        }
    }
}

/// Filterable record dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    Source,
    Location,
    Service,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Source, Dimension::Location, Dimension::Service];

    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Source => "source",
            Dimension::Location => "location",
            Dimension::Service => "service",
        }
    }
}

/// A query over the record set.
///
/// Empty accepted-sets mean "accept all". Date bounds are inclusive; `None`
/// leaves that side open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub sources: BTreeSet<String>,
    pub locations: BTreeSet<String>,
    pub services: BTreeSet<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sources<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources.extend(values.into_iter().map(Into::into));
        self
    }

    pub fn locations<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locations.extend(values.into_iter().map(Into::into));
        self
    }

    pub fn services<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.services.extend(values.into_iter().map(Into::into));
        self
    }

    pub fn between(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    /// Restrict to one calendar year (`y-01-01..=y-12-31`).
    pub fn for_year(self, year: i32) -> Self {
        let from = NaiveDate::from_ymd_opt(year, 1, 1);
        let to = NaiveDate::from_ymd_opt(year, 12, 31);
        self.between(from, to)
    }

    pub fn accepted(&self, dim: Dimension) -> &BTreeSet<String> {
        match dim {
            Dimension::Source => &self.sources,
            Dimension::Location => &self.locations,
            Dimension::Service => &self.services,
        }
    }

    /// Same dimension sets, different date range.
    pub fn with_range(&self, range: DateRange) -> Self {
        let mut spec = self.clone();
        spec.from = Some(range.from);
        spec.to = Some(range.to);
        spec
    }
}

/// Inclusive, fully bounded date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// One labeled count. Serializes as `{ "name": .., "value": .. }` for chart consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    #[serde(rename = "name")]
    pub key: String,
    #[serde(rename = "value")]
    pub count: usize,
}

impl Bucket {
    pub fn new(key: impl Into<String>, count: usize) -> Self {
        Self {
            key: key.into(),
            count,
        }
    }
}

/// Time granularity for bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Granularity {
    Year,
    Quarter,
    Month,
    Week,
    Day,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown granularity `{0}` (expected year, quarter, month, week or day)")]
pub struct ParseGranularityError(pub String);

impl FromStr for Granularity {
    type Err = ParseGranularityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "year" | "yearly" | "y" => Ok(Granularity::Year),
            "quarter" | "quarterly" | "q" => Ok(Granularity::Quarter),
            "month" | "monthly" | "m" => Ok(Granularity::Month),
            "week" | "weekly" | "w" => Ok(Granularity::Week),
            "day" | "daily" | "d" => Ok(Granularity::Day),
            _ => Err(ParseGranularityError(s.to_string())),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Granularity::Year => "year",
            Granularity::Quarter => "quarter",
            Granularity::Month => "month",
            Granularity::Week => "week",
            Granularity::Day => "day",
        };
        f.write_str(s)
    }
}

/// Comparison presets: current period vs the one right before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodPreset {
    Month,
    Quarter,
    Year,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown preset `{0}` (expected month, quarter or year)")]
pub struct ParsePresetError(pub String);

impl FromStr for PeriodPreset {
    type Err = ParsePresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "month" => Ok(PeriodPreset::Month),
            "quarter" => Ok(PeriodPreset::Quarter),
            "year" => Ok(PeriodPreset::Year),
            _ => Err(ParsePresetError(s.to_string())),
        }
    }
}

/// Top/bottom labels for one dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ranked {
    pub top: String,
    pub bottom: String,
}

/// KPI summary of one filtered subset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub source: Ranked,
    pub location: Ranked,
    pub service: Ranked,
}

impl Summary {
    pub fn ranked(&self, dim: Dimension) -> &Ranked {
        match dim {
            Dimension::Source => &self.source,
            Dimension::Location => &self.location,
            Dimension::Service => &self.service,
        }
    }
}

/// Outcome of comparing a current period against a previous one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub total_current: usize,
    pub total_previous: usize,
    pub growth_percent: f64,
    pub best_source: String,
    pub worst_source: String,
    pub current: Summary,
    pub previous: Summary,
    pub weekly_current: Vec<Bucket>,
    pub weekly_previous: Vec<Bucket>,
}

/// Per-source change in count between two periods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDelta {
    pub source: String,
    pub current: usize,
    pub previous: usize,
    pub delta: i64,
}

/// Most frequent service at a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationService {
    pub location: String,
    pub service: String,
    pub count: usize,
}

/// Distinct values present in a record set, for pickers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionOptions {
    pub sources: Vec<String>,
    pub locations: Vec<String>,
    pub services: Vec<String>,
    pub years: Vec<i32>,
}
