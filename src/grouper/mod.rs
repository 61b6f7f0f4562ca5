use std::cmp::Ordering;
use std::sync::OnceLock;

use icu_collator::options::CollatorOptions;
use icu_collator::{Collator, CollatorBorrowed};
use serde::Serialize;
use tracing::{debug, warn};

use crate::classify::{groups_for_label, Group, Taxonomy};
use crate::dataset::Entry;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GroupBucket {
    pub group: Group,
    pub entries: Vec<Entry>,
}

fn collator() -> Option<&'static CollatorBorrowed<'static>> {
    static COLLATOR: OnceLock<Option<CollatorBorrowed<'static>>> = OnceLock::new();
    COLLATOR
        .get_or_init(|| {
            Collator::try_new(Default::default(), CollatorOptions::default())
                .map_err(|e| warn!("root collator unavailable, sorting by code point: {e}"))
                .ok()
        })
        .as_ref()
}

/// Name ordering for bucket contents: root-locale collation, with code
/// point order only for names the collator considers equal.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    let collated = match collator() {
        Some(c) => c.compare(a, b),
        None => Ordering::Equal,
    };
    collated.then_with(|| a.cmp(b))
}

/// Partitions entries into one bucket per canonical group of `taxonomy`.
/// Buckets for every group are present, empty ones included; entries the
/// classifier assigns no group are left out.
pub fn group_entries(taxonomy: Taxonomy, entries: &[Entry]) -> Vec<GroupBucket> {
    let mut buckets: Vec<GroupBucket> = taxonomy
        .groups()
        .iter()
        .map(|&group| GroupBucket {
            group,
            entries: Vec::new(),
        })
        .collect();

    let mut dropped = 0usize;
    for entry in entries {
        let groups = groups_for_label(taxonomy, &entry.level);
        if groups.is_empty() {
            dropped += 1;
            continue;
        }
        for group in groups {
            if let Some(bucket) = buckets.iter_mut().find(|b| b.group == group) {
                bucket.entries.push(entry.clone());
            }
        }
    }

    for bucket in buckets.iter_mut() {
        bucket
            .entries
            .sort_by(|a, b| compare_names(&a.name, &b.name));
        debug!(group = bucket.group.label(), count = bucket.entries.len(), "bucket filled");
    }
    if dropped > 0 {
        debug!(dropped, "entries without a known classification were skipped");
    }
    buckets
}

/// The working listing: bucket contents concatenated in canonical order.
pub fn flatten(buckets: &[GroupBucket]) -> Vec<&Entry> {
    buckets.iter().flat_map(|b| b.entries.iter()).collect()
}
