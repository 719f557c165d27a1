//! Groups dated samples into contiguous day or week buckets.
//!
//! Every period between the first and last bucket is emitted, including
//! periods with no samples, in ascending date order.

use std::collections::{BTreeMap, HashSet};

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;

use crate::date_util::week_start;
use crate::query::range::{DateRange, GroupBy};
use crate::records::TimeEntry;

/// A dated numeric observation attributed to one entity (usually a user).
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub date: NaiveDate,
    pub entity_id: String,
    pub value: Decimal,
}

impl From<&TimeEntry> for Sample {
    fn from(e: &TimeEntry) -> Self {
        Self {
            date: e.date,
            entity_id: e.owner_id.clone(),
            value: e.total_hours,
        }
    }
}

/// One period of a trend. Values are full precision; round at the output.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub start: NaiveDate,
    pub total: Decimal,
    pub sample_count: u64,
    pub distinct_entities: u64,
    /// Entries of the correlated series (e.g. task completions) in this period.
    pub correlated_count: u64,
}

/// Key of the bucket containing `d`.
pub fn bucket_key(d: NaiveDate, mode: GroupBy) -> NaiveDate {
    match mode {
        GroupBy::Day => d,
        GroupBy::Week => week_start(d),
    }
}

fn bucket_len(mode: GroupBy) -> Duration {
    match mode {
        GroupBy::Day => Duration::days(1),
        GroupBy::Week => Duration::days(7),
    }
}

#[derive(Default)]
struct Acc<'a> {
    total: Decimal,
    samples: u64,
    entities: HashSet<&'a str>,
    correlated: u64,
}

/// Bucket `samples` and count `correlated` dates per bucket.
///
/// With an explicit `range`, buckets cover the range and anything outside it
/// is ignored. Without one, the range is inferred from the samples; no
/// samples and no range yields no buckets.
pub fn bucketize(
    samples: &[Sample],
    correlated: &[NaiveDate],
    mode: GroupBy,
    range: Option<DateRange>,
) -> Vec<Bucket> {
    let range = match range {
        Some(r) => r,
        None => {
            let min = samples.iter().map(|s| s.date).min();
            let max = samples.iter().map(|s| s.date).max();
            match (min, max) {
                (Some(start), Some(end)) => DateRange { start, end },
                _ => return vec![],
            }
        }
    };

    let step = bucket_len(mode);
    let last = bucket_key(range.end, mode);
    let mut accs: BTreeMap<NaiveDate, Acc<'_>> = BTreeMap::new();
    let mut key = bucket_key(range.start, mode);
    while key <= last {
        accs.insert(key, Acc::default());
        key += step;
    }

    for s in samples.iter().filter(|s| range.contains(s.date)) {
        if let Some(acc) = accs.get_mut(&bucket_key(s.date, mode)) {
            acc.total += s.value;
            acc.samples += 1;
            acc.entities.insert(s.entity_id.as_str());
        }
    }

    for d in correlated.iter().filter(|d| range.contains(**d)) {
        if let Some(acc) = accs.get_mut(&bucket_key(*d, mode)) {
            acc.correlated += 1;
        }
    }

    accs.into_iter()
        .map(|(start, acc)| Bucket {
            start,
            total: acc.total,
            sample_count: acc.samples,
            distinct_entities: acc.entities.len() as u64,
            correlated_count: acc.correlated,
        })
        .collect()
}
