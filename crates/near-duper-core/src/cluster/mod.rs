//! Pairwise estimation inside length buckets and union-find clustering.

mod bucket;
mod union_find;

pub use bucket::{BucketTask, LengthBuckets};
pub use union_find::UnionFind;

use crate::minhash::{matching_positions, Signature};
use rayon::prelude::*;

/// A candidate pair at or above the threshold. `a < b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub a: usize,
    pub b: usize,
    /// Signature positions on which both files agree.
    pub matches: usize,
    pub similarity: f64,
}

/// Connected component of at least two files.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    /// Ordinals, ascending.
    pub members: Vec<usize>,
    /// Agreeing positions summed over the edges that actually merged two sets.
    pub merged_matches: u64,
    pub merges: usize,
    pub signature_size: usize,
}

impl Component {
    /// Mean similarity of the merging edges as a single division over
    /// integer totals, so it never drops below the weakest merging edge.
    pub fn avg_similarity(&self) -> f64 {
        let positions = self.merges as u64 * self.signature_size as u64;
        if positions == 0 {
            return 0.0;
        }
        self.merged_matches as f64 / positions as f64
    }
}

/// Evaluate every candidate pair of every bucket in parallel and keep the
/// pairs whose estimated similarity reaches `threshold`.
///
/// Returns the edges sorted by `(a, b)` together with the number of pairs
/// evaluated. Must be called inside the worker pool to stay bounded.
pub fn discover_edges(
    buckets: &LengthBuckets,
    signatures: &[Signature],
    threshold: f64,
) -> (Vec<Edge>, usize) {
    let tasks = buckets.tasks();
    let candidate_pairs = tasks.iter().map(|t| t.candidate_pairs()).sum();

    let mut edges: Vec<Edge> = tasks
        .par_iter()
        .flat_map_iter(|task| bucket_edges(task, signatures, threshold))
        .collect();
    edges.sort_unstable_by(|x, y| (x.a, x.b).cmp(&(y.a, y.b)));

    (edges, candidate_pairs)
}

fn bucket_edges(task: &BucketTask<'_>, signatures: &[Signature], threshold: f64) -> Vec<Edge> {
    let mut edges = Vec::new();
    let mut consider = |x: usize, y: usize| {
        let (sig_x, sig_y) = (&signatures[x], &signatures[y]);
        if sig_x.is_empty() || sig_x.len() != sig_y.len() {
            return;
        }
        let matches = matching_positions(sig_x, sig_y);
        let similarity = matches as f64 / sig_x.len() as f64;
        if similarity >= threshold {
            let (a, b) = if x < y { (x, y) } else { (y, x) };
            edges.push(Edge {
                a,
                b,
                matches,
                similarity,
            });
        }
    };

    for (i, &x) in task.members.iter().enumerate() {
        for &y in &task.members[i + 1..] {
            consider(x, y);
        }
        for &y in task.upper {
            consider(x, y);
        }
    }
    edges
}

/// Apply `edges` in order to a union-find over `n` ordinals and return the
/// components with two or more members, ordered by their smallest ordinal.
/// `signature_size` is the length of the signatures the edges were
/// estimated from.
pub fn connected_components(n: usize, edges: &[Edge], signature_size: usize) -> Vec<Component> {
    let mut uf = UnionFind::new(n);
    let mut match_sum = vec![0u64; n];
    let mut merges = vec![0usize; n];

    for edge in edges {
        if let Some((keep, absorb)) = uf.union(edge.a, edge.b) {
            match_sum[keep] += match_sum[absorb] + edge.matches as u64;
            merges[keep] += merges[absorb] + 1;
        }
    }

    let mut by_root: Vec<Option<usize>> = vec![None; n];
    let mut components: Vec<Component> = Vec::new();
    for ordinal in 0..n {
        let root = uf.find(ordinal);
        if uf.set_size(root) < 2 {
            continue;
        }
        let slot = match by_root[root] {
            Some(slot) => slot,
            None => {
                components.push(Component {
                    members: Vec::new(),
                    merged_matches: match_sum[root],
                    merges: merges[root],
                    signature_size,
                });
                by_root[root] = Some(components.len() - 1);
                components.len() - 1
            }
        };
        components[slot].members.push(ordinal);
    }
    components
}
