//! Calendar bucketing: map record dates to year / quarter / month / week / day slots.
//!
//! | Granularity | Key                         | Order                          | Cardinality |
//! |-------------|-----------------------------|--------------------------------|-------------|
//! | Year        | `2024`                      | ascending year                 | open        |
//! | Quarter     | `Q1`..`Q4`                  | fixed                          | fixed (4)   |
//! | Month       | `Jan`..`Dec` (`Jan 2024`)   | calendar order (per year)      | fixed (12/y)|
//! | Week        | `2024-W01`                  | ascending (year, week)         | open        |
//! | Day         | `2024-01-05`                | ascending date                 | open        |
//!
//! Fixed-cardinality granularities emit zero-count buckets so charts stay continuous.
//! Month keys carry the year only when the input spans more than one year.

use crate::models::{Bucket, Granularity, Record};
use crate::stats::group_count_by;
use chrono::{Datelike, NaiveDate};
use log::debug;
use std::collections::BTreeSet;

pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Quarter number 1..=4.
pub fn quarter_of(date: NaiveDate) -> u32 {
    date.month0() / 3 + 1
}

/// Week of the calendar year, with weeks starting on Sunday and week 1 holding Jan 1.
///
/// `ceil((days since Jan 1 + 1 + weekday of Jan 1) / 7)`, weekday counted from Sunday = 0.
/// Weeks never cross into another year's numbering, so `(year, week)` sorts chronologically.
pub fn week_of_year(date: NaiveDate) -> u32 {
    let jan1_offset = NaiveDate::from_ymd_opt(date.year(), 1, 1)
        .map(|d| d.weekday().num_days_from_sunday())
        .unwrap_or(0);
    (date.ordinal0() + 1 + jan1_offset).div_ceil(7)
}

/// Year-prefixed week key, e.g. `2024-W01`.
pub fn week_key(year: i32, week: u32) -> String {
    format!("{}-W{:02}", year, week)
}

pub fn month_label(month: u32) -> &'static str {
    MONTH_LABELS[((month.clamp(1, 12)) - 1) as usize]
}

/// Aggregate record counts per bucket for `granularity`, in canonical order.
pub fn bucket(records: &[Record], granularity: Granularity) -> Vec<Bucket> {
    let out = match granularity {
        Granularity::Year => by_year(records),
        Granularity::Quarter => by_quarter(records),
        Granularity::Month => by_month(records),
        Granularity::Week => by_week(records),
        Granularity::Day => by_day(records),
    };
    debug!(
        "bucketed {} records by {} into {} buckets",
        records.len(),
        granularity,
        out.len()
    );
    out
}

/// Weekly series sorted by `(year, week)` regardless of input order.
pub fn weekly_series(records: &[Record]) -> Vec<Bucket> {
    by_week(records)
}

fn by_year(records: &[Record]) -> Vec<Bucket> {
    let mut groups = group_count_by(records, |r| r.naive_date().map(|d| d.year()));
    groups.sort_by_key(|(y, _)| *y);
    groups
        .into_iter()
        .map(|(y, n)| Bucket::new(y.to_string(), n))
        .collect()
}

fn by_quarter(records: &[Record]) -> Vec<Bucket> {
    let groups = group_count_by(records, |r| r.naive_date().map(quarter_of));
    (1..=4u32)
        .map(|q| {
            let n = groups
                .iter()
                .find(|(k, _)| *k == q)
                .map(|(_, n)| *n)
                .unwrap_or(0);
            Bucket::new(format!("Q{}", q), n)
        })
        .collect()
}

fn by_month(records: &[Record]) -> Vec<Bucket> {
    let groups = group_count_by(records, |r| r.naive_date().map(|d| (d.year(), d.month())));
    let years: BTreeSet<i32> = groups.iter().map(|((y, _), _)| *y).collect();
    let count = |year: Option<i32>, month: u32| -> usize {
        groups
            .iter()
            .filter(|((y, m), _)| *m == month && year.is_none_or(|want| want == *y))
            .map(|(_, n)| *n)
            .sum()
    };

    if years.len() <= 1 {
        return (1..=12u32)
            .map(|m| Bucket::new(month_label(m), count(None, m)))
            .collect();
    }

    years
        .iter()
        .flat_map(|&y| (1..=12u32).map(move |m| (y, m)))
        .map(|(y, m)| Bucket::new(format!("{} {}", month_label(m), y), count(Some(y), m)))
        .collect()
}

fn by_week(records: &[Record]) -> Vec<Bucket> {
    let mut groups = group_count_by(records, |r| {
        r.naive_date().map(|d| (d.year(), week_of_year(d)))
    });
    groups.sort_by_key(|(k, _)| *k);
    groups
        .into_iter()
        .map(|((y, w), n)| Bucket::new(week_key(y, w), n))
        .collect()
}

fn by_day(records: &[Record]) -> Vec<Bucket> {
    let mut groups = group_count_by(records, |r| r.naive_date());
    groups.sort_by_key(|(d, _)| *d);
    groups
        .into_iter()
        .map(|(d, n)| Bucket::new(d.format("%Y-%m-%d").to_string(), n))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn jan_first_is_always_week_one() {
        for y in 2015..2030 {
            assert_eq!(week_of_year(d(y, 1, 1)), 1, "year {y}");
        }
    }

    #[test]
    fn weeks_roll_over_on_sunday() {
        // 2024-01-01 is a Monday: Jan 1..6 are week 1, Sunday Jan 7 starts week 2.
        assert_eq!(week_of_year(d(2024, 1, 6)), 1);
        assert_eq!(week_of_year(d(2024, 1, 7)), 2);
        // 2023-01-01 is a Sunday.
        assert_eq!(week_of_year(d(2023, 1, 7)), 1);
        assert_eq!(week_of_year(d(2023, 1, 8)), 2);
    }

    #[test]
    fn year_end_weeks() {
        assert_eq!(week_of_year(d(2023, 12, 28)), 52);
        assert_eq!(week_of_year(d(2023, 12, 31)), 53);
        assert_eq!(week_key(2023, 53), "2023-W53");
    }

    #[test]
    fn quarters() {
        assert_eq!(quarter_of(d(2024, 1, 31)), 1);
        assert_eq!(quarter_of(d(2024, 3, 31)), 1);
        assert_eq!(quarter_of(d(2024, 4, 1)), 2);
        assert_eq!(quarter_of(d(2024, 12, 31)), 4);
    }
}
