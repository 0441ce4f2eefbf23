//! Filter engine and listing helpers.

use crate::models::{Dimension, FilterSpec, Record};
use chrono::NaiveDate;

impl FilterSpec {
    /// Whether `record` passes every constraint of this spec.
    ///
    /// An empty accepted-set does not constrain its dimension. A record without a
    /// value for a constrained dimension (absent service) fails.
    pub fn matches(&self, record: &Record) -> bool {
        for dim in Dimension::ALL {
            let accepted = self.accepted(dim);
            if accepted.is_empty() {
                continue;
            }
            match record.dimension(dim) {
                Some(v) if accepted.contains(v) => {}
                _ => return false,
            }
        }
        if self.from.is_none() && self.to.is_none() {
            return true;
        }
        match record.naive_date() {
            Some(d) => in_range(d, self.from, self.to),
            None => false,
        }
    }

    /// True when nothing is constrained.
    pub fn is_unconstrained(&self) -> bool {
        self.sources.is_empty()
            && self.locations.is_empty()
            && self.services.is_empty()
            && self.from.is_none()
            && self.to.is_none()
    }
}

fn in_range(d: NaiveDate, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    from.is_none_or(|f| d >= f) && to.is_none_or(|t| d <= t)
}

/// Records passing `spec`, in input order.
pub fn filter(records: &[Record], spec: &FilterSpec) -> Vec<Record> {
    records.iter().filter(|r| spec.matches(r)).cloned().collect()
}

/// Copy of `records` sorted by date, newest first. Equal dates keep their input order.
pub fn newest_first(records: &[Record]) -> Vec<Record> {
    let mut out = records.to_vec();
    out.sort_by(|a, b| b.date.cmp(&a.date));
    out
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a> {
    pub items: &'a [Record],
    /// 1-based page number that was requested.
    pub page: usize,
    pub total_pages: usize,
}

/// Slice out page `page` (1-based). Out-of-range pages yield no items.
pub fn paginate(records: &[Record], page: usize, page_size: usize) -> Page<'_> {
    let page_size = page_size.max(1);
    let total_pages = records.len().div_ceil(page_size);
    let items = if page == 0 || page > total_pages {
        &records[0..0]
    } else {
        let start = (page - 1) * page_size;
        let end = (start + page_size).min(records.len());
        &records[start..end]
    };
    Page {
        items,
        page,
        total_pages,
    }
}
