//! Two-period comparison: current vs previous over the same record universe.

use crate::calendar::weekly_series;
use crate::filter::filter;
use crate::models::{
    ComparisonResult, DateRange, Dimension, FilterSpec, PeriodPreset, Record,
    SourceDelta,
};
use crate::stats::{bottom, count_by, label_or_empty, summarize, top};
use chrono::{Datelike, Months, NaiveDate};
use log::debug;

/// Relative change of `current` against `previous`, in percent.
///
/// - both zero: `0`
/// - previous zero, current non-zero: `100` (full growth from an empty baseline)
/// - otherwise: `(current - previous) / previous * 100`
pub fn growth_percent(current: usize, previous: usize) -> f64 {
    match (current, previous) {
        (0, 0) => 0.0,
        (_, 0) => 100.0,
        (c, p) => (c as f64 - p as f64) / p as f64 * 100.0,
    }
}

/// Filter the same universe twice and compare the two subsets.
///
/// Best/worst source are ranked within the current period only.
pub fn compare(records: &[Record], current: &FilterSpec, previous: &FilterSpec) -> ComparisonResult {
    let cur = filter(records, current);
    let prev = filter(records, previous);

    let sources = count_by(&cur, Dimension::Source);

    let result = ComparisonResult {
        total_current: cur.len(),
        total_previous: prev.len(),
        growth_percent: growth_percent(cur.len(), prev.len()),
        best_source: label_or_empty(top(&sources)),
        worst_source: label_or_empty(bottom(&sources)),
        current: summarize(&cur),
        previous: summarize(&prev),
        weekly_current: weekly_series(&cur),
        weekly_previous: weekly_series(&prev),
    };
    debug!(
        "compared {} vs {} records (growth {:.1}%)",
        result.total_current, result.total_previous, result.growth_percent
    );
    result
}

/// Per-source change between periods, largest gain first.
///
/// Sources are listed in first-encountered order (current period first, then any
/// source seen only in the previous one) before the stable sort.
pub fn source_deltas(current: &[Record], previous: &[Record]) -> Vec<SourceDelta> {
    let cur = count_by(current, Dimension::Source);
    let prev = count_by(previous, Dimension::Source);
    let lookup = |groups: &[(String, usize)], key: &str| {
        groups
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    };

    let mut names: Vec<&str> = cur.iter().map(|(k, _)| k.as_str()).collect();
    for (k, _) in &prev {
        if !names.contains(&k.as_str()) {
            names.push(k.as_str());
        }
    }

    let mut out: Vec<SourceDelta> = names
        .into_iter()
        .map(|name| {
            let c = lookup(&cur, name);
            let p = lookup(&prev, name);
            SourceDelta {
                source: name.to_string(),
                current: c,
                previous: p,
                delta: c as i64 - p as i64,
            }
        })
        .collect();
    out.sort_by(|a, b| b.delta.cmp(&a.delta));
    out
}

fn month_range(year: i32, month: u32) -> Option<DateRange> {
    let from = NaiveDate::from_ymd_opt(year, month, 1)?;
    let to = from.checked_add_months(Months::new(1))?.pred_opt()?;
    Some(DateRange { from, to })
}

fn quarter_range(year: i32, quarter_start_month: u32) -> Option<DateRange> {
    let from = NaiveDate::from_ymd_opt(year, quarter_start_month, 1)?;
    let to = from.checked_add_months(Months::new(3))?.pred_opt()?;
    Some(DateRange { from, to })
}

fn year_range(year: i32) -> Option<DateRange> {
    Some(DateRange {
        from: NaiveDate::from_ymd_opt(year, 1, 1)?,
        to: NaiveDate::from_ymd_opt(year, 12, 31)?,
    })
}

impl PeriodPreset {
    /// `(current, previous)` ranges around `today`. `None` only at the edges of the calendar.
    pub fn ranges(&self, today: NaiveDate) -> Option<(DateRange, DateRange)> {
        match self {
            PeriodPreset::Month => {
                let prev = today.checked_sub_months(Months::new(1))?;
                Some((
                    month_range(today.year(), today.month())?,
                    month_range(prev.year(), prev.month())?,
                ))
            }
            PeriodPreset::Quarter => {
                let start_month = |d: NaiveDate| (d.month0() / 3) * 3 + 1;
                let prev = today.checked_sub_months(Months::new(3))?;
                Some((
                    quarter_range(today.year(), start_month(today))?,
                    quarter_range(prev.year(), start_month(prev))?,
                ))
            }
            PeriodPreset::Year => Some((year_range(today.year())?, year_range(today.year() - 1)?)),
        }
    }

    /// Current/previous specs sharing `base`'s dimension sets.
    pub fn specs(&self, base: &FilterSpec, today: NaiveDate) -> Option<(FilterSpec, FilterSpec)> {
        let (cur, prev) = self.ranges(today)?;
        Some((base.with_range(cur), base.with_range(prev)))
    }
}
