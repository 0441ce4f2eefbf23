//! Grouping primitive and the KPI views built on it.

use crate::models::{
    Bucket, Dimension, DimensionOptions, EMPTY_LABEL, LocationService, Ranked, Record, Summary,
    UNKNOWN,
};
use ahash::AHashMap;
use std::hash::Hash;

/// Count records per key, returning groups in first-encountered order.
///
/// Records for which `key_fn` yields `None` are skipped. Every KPI, bucket and
/// breakdown in this crate is built on this one primitive, so tie-breaking is
/// uniform: equal counts resolve to the group seen first.
pub fn group_count_by<'a, K, F>(records: &'a [Record], mut key_fn: F) -> Vec<(K, usize)>
where
    K: Eq + Hash + Clone,
    F: FnMut(&'a Record) -> Option<K>,
{
    let mut index: AHashMap<K, usize> = AHashMap::new();
    let mut out: Vec<(K, usize)> = Vec::new();
    for r in records {
        let Some(key) = key_fn(r) else { continue };
        match index.get(&key) {
            Some(&pos) => out[pos].1 += 1,
            None => {
                index.insert(key.clone(), out.len());
                out.push((key, 1));
            }
        }
    }
    out
}

/// Group with the strictly highest count; ties go to the first-encountered group.
pub fn top<K>(groups: &[(K, usize)]) -> Option<&(K, usize)> {
    groups.iter().fold(None, |best, g| match best {
        Some(b) if g.1 <= b.1 => Some(b),
        _ => Some(g),
    })
}

/// Group with the strictly lowest count; ties go to the first-encountered group.
pub fn bottom<K>(groups: &[(K, usize)]) -> Option<&(K, usize)> {
    groups.iter().fold(None, |worst, g| match worst {
        Some(w) if g.1 >= w.1 => Some(w),
        _ => Some(g),
    })
}

pub(crate) fn label_or_empty(group: Option<&(String, usize)>) -> String {
    group
        .map(|(k, _)| k.clone())
        .unwrap_or_else(|| EMPTY_LABEL.to_string())
}

/// Count per value of `dim`; records lacking the dimension are skipped.
pub fn count_by(records: &[Record], dim: Dimension) -> Vec<(String, usize)> {
    group_count_by(records, |r| r.dimension(dim).map(str::to_string))
}

/// Label of the most frequent value of `dim`, or the placeholder when there is none.
pub fn top_by(records: &[Record], dim: Dimension) -> String {
    label_or_empty(top(&count_by(records, dim)))
}

/// Label of the least frequent value of `dim`, or the placeholder when there is none.
pub fn bottom_by(records: &[Record], dim: Dimension) -> String {
    label_or_empty(bottom(&count_by(records, dim)))
}

fn ranked(records: &[Record], dim: Dimension) -> Ranked {
    let groups = count_by(records, dim);
    Ranked {
        top: label_or_empty(top(&groups)),
        bottom: label_or_empty(bottom(&groups)),
    }
}

/// KPI summary of one subset: total plus top/bottom per dimension.
pub fn summarize(records: &[Record]) -> Summary {
    Summary {
        total: records.len(),
        source: ranked(records, Dimension::Source),
        location: ranked(records, Dimension::Location),
        service: ranked(records, Dimension::Service),
    }
}

/// Joint `source → service` ranking, highest count first.
///
/// Equal counts keep first-encountered order. Records without a service are skipped.
pub fn rank_pairs(records: &[Record], limit: Option<usize>) -> Vec<Bucket> {
    let mut groups = group_count_by(records, |r| {
        r.service
            .as_deref()
            .map(|svc| format!("{} → {}", r.source, svc))
    });
    // stable: ties stay in encounter order
    groups.sort_by(|a, b| b.1.cmp(&a.1));
    groups
        .into_iter()
        .take(limit.unwrap_or(usize::MAX))
        .map(|(k, n)| Bucket::new(k, n))
        .collect()
}

/// Share per value of `dim` (donut input), first-encountered order.
/// A missing service is counted as `Unknown` here.
pub fn breakdown(records: &[Record], dim: Dimension) -> Vec<Bucket> {
    group_count_by(records, |r| {
        Some(r.dimension(dim).unwrap_or(UNKNOWN).to_string())
    })
    .into_iter()
    .map(|(k, n)| Bucket::new(k, n))
    .collect()
}

/// For every location, its most frequent service (records without a service are skipped).
pub fn best_service_by_location(records: &[Record]) -> Vec<LocationService> {
    let per_location = group_count_by(records, |r| {
        r.service.as_ref().map(|_| r.location.clone())
    });
    per_location
        .into_iter()
        .filter_map(|(location, _)| {
            let services = group_count_by(records, |r| {
                if r.location == location {
                    r.service.clone()
                } else {
                    None
                }
            });
            top(&services).map(|(service, count)| LocationService {
                location: location.clone(),
                service: service.clone(),
                count: *count,
            })
        })
        .collect()
}

/// Distinct dimension values (first-encountered) and years (newest first).
pub fn options(records: &[Record]) -> DimensionOptions {
    let keys = |dim| {
        count_by(records, dim)
            .into_iter()
            .map(|(k, _)| k)
            .collect::<Vec<_>>()
    };
    let mut years: Vec<i32> = group_count_by(records, Record::year)
        .into_iter()
        .map(|(y, _)| y)
        .collect();
    years.sort_unstable_by(|a, b| b.cmp(a));
    DimensionOptions {
        sources: keys(Dimension::Source),
        locations: keys(Dimension::Location),
        services: keys(Dimension::Service),
        years,
    }
}
