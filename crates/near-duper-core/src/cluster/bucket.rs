use dashmap::DashMap;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Files partitioned by `content_length / step`.
///
/// A bucket compares against itself and against the bucket directly above
/// it. Since the bucket below does the same, every file meets both
/// neighbours and every unordered pair is produced exactly once.
#[derive(Debug, Clone)]
pub struct LengthBuckets {
    step: usize,
    buckets: BTreeMap<usize, Vec<usize>>,
}

/// Work unit for one bucket: its own members and the next bucket's.
#[derive(Debug, Clone, Copy)]
pub struct BucketTask<'a> {
    pub key: usize,
    pub members: &'a [usize],
    pub upper: &'a [usize],
}

impl BucketTask<'_> {
    pub fn candidate_pairs(&self) -> usize {
        let n = self.members.len();
        n * n.saturating_sub(1) / 2 + n * self.upper.len()
    }
}

impl LengthBuckets {
    /// `lengths[i]` is the normalized length of file ordinal `i`.
    pub fn build(lengths: &[usize], step: usize) -> Self {
        let step = step.max(1);
        let map: DashMap<usize, Vec<usize>> = DashMap::new();
        lengths
            .par_iter()
            .enumerate()
            .for_each(|(ordinal, len)| map.entry(len / step).or_default().push(ordinal));

        let buckets = map
            .into_iter()
            .map(|(key, mut members)| {
                members.sort_unstable();
                (key, members)
            })
            .collect();

        Self { step, buckets }
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn key_for(&self, length: usize) -> usize {
        length / self.step
    }

    pub fn members(&self, key: usize) -> &[usize] {
        self.buckets.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// One task per bucket, in ascending key order.
    pub fn tasks(&self) -> Vec<BucketTask<'_>> {
        self.buckets
            .iter()
            .map(|(&key, members)| BucketTask {
                key,
                members,
                upper: self.members(key + 1),
            })
            .collect()
    }

    /// `"{start}-{end}"` covering buckets `low..=high`.
    pub fn range_label(&self, low: usize, high: usize) -> String {
        let start = low * self.step;
        let end = (high + 1) * self.step - 1;
        format!("{}-{}", start, end)
    }
}
