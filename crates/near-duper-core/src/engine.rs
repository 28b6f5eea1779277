use crate::cluster::{self, LengthBuckets};
use crate::config::DedupeSettings;
use crate::corpus::{CorpusSnapshot, FileRecord, SkipReason, SkippedFile};
use crate::error::Result;
use crate::minhash::{Signature, SignatureGenerator};
use crate::pool::WorkerPool;
use crate::progress::ProgressReporter;
use crate::store::{DuplicateGroup, GroupMap};
use crate::text;
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub struct DedupeEngine {
    settings: DedupeSettings,
    generator: SignatureGenerator,
    pool: WorkerPool,
}

/// Groups produced by one run, plus what happened along the way.
#[derive(Debug)]
pub struct DedupeRun {
    pub groups: GroupMap,
    pub stats: RunStats,
}

#[derive(Debug, Clone, Default)]
pub struct RunStats {
    pub files_seen: usize,
    pub files_signed: usize,
    pub skipped: Vec<SkippedFile>,
    pub buckets: usize,
    pub candidate_pairs: usize,
    pub edges: usize,
    pub groups: usize,
    pub grouped_files: usize,
    pub signature_duration: Duration,
    pub compare_duration: Duration,
    pub cluster_duration: Duration,
}

/// A file that received a signature. Its ordinal is its index in the
/// signed table, which is also the index of its signature.
struct SignedFile {
    record: usize,
    content_length: usize,
}

impl DedupeEngine {
    /// Validates `settings`; invalid configuration never reaches a run.
    pub fn new(settings: DedupeSettings) -> Result<Self> {
        settings.validate()?;
        let generator =
            SignatureGenerator::new(settings.signature_size, settings.signature_seed);
        let pool = WorkerPool::new(settings.worker_count)?;
        Ok(Self {
            settings,
            generator,
            pool,
        })
    }

    pub fn settings(&self) -> &DedupeSettings {
        &self.settings
    }

    pub fn worker_threads(&self) -> usize {
        self.pool.threads()
    }

    /// Run the near-duplicate pipeline over one corpus snapshot:
    /// 1. Normalize, shingle and sign every file in parallel
    /// 2. Bucket signed files by normalized length
    /// 3. Estimate similarity of candidate pairs per bucket in parallel
    /// 4. Union edges single-threaded and keep large enough components
    pub fn run(
        &self,
        snapshot: CorpusSnapshot,
        reporter: &dyn ProgressReporter,
    ) -> Result<DedupeRun> {
        let CorpusSnapshot {
            mut records,
            rejected,
        } = snapshot;
        let mut stats = RunStats {
            files_seen: records.len() + rejected.len(),
            skipped: rejected,
            ..RunStats::default()
        };

        // Ordinals follow path order so every later phase is reproducible.
        records.sort_by(|a, b| a.path.cmp(&b.path));
        let before = records.len();
        records.dedup_by(|later, earlier| later.path == earlier.path);
        if records.len() != before {
            debug!("Dropped {} repeated paths from the corpus", before - records.len());
        }

        // Phase 1: Signatures
        info!("Computing signatures for {} files...", records.len());
        reporter.on_signature_start(records.len());
        let sig_start = Instant::now();
        let (signed, signatures) = self.sign_all(&records, reporter, &mut stats.skipped);
        stats.signature_duration = sig_start.elapsed();
        stats.files_signed = signed.len();
        reporter.on_signature_complete(
            signed.len(),
            stats.skipped.len(),
            stats.signature_duration.as_secs_f64(),
        );
        debug!(
            "Signatures completed in {:.2}s — {} signed, {} skipped",
            stats.signature_duration.as_secs_f64(),
            signed.len(),
            stats.skipped.len(),
        );

        // Phase 2: Bucket and compare
        let compare_start = Instant::now();
        let lengths: Vec<usize> = signed.iter().map(|s| s.content_length).collect();
        let step = self.settings.length_range_step;
        let buckets = self.pool.install(|| LengthBuckets::build(&lengths, step));
        reporter.on_compare_start(buckets.len());

        let threshold = self.settings.similarity_threshold;
        let (edges, candidate_pairs) = self
            .pool
            .install(|| cluster::discover_edges(&buckets, &signatures, threshold));
        stats.buckets = buckets.len();
        stats.candidate_pairs = candidate_pairs;
        stats.edges = edges.len();
        stats.compare_duration = compare_start.elapsed();
        reporter.on_compare_complete(
            candidate_pairs,
            edges.len(),
            stats.compare_duration.as_secs_f64(),
        );
        debug!(
            "Compared {} candidate pairs in {} buckets in {:.2}s — {} edges",
            candidate_pairs,
            buckets.len(),
            stats.compare_duration.as_secs_f64(),
            edges.len(),
        );

        // Phase 3: Cluster
        let cluster_start = Instant::now();
        let components = cluster::connected_components(
            signed.len(),
            &edges,
            self.generator.signature_size(),
        );
        let min_len = self.settings.min_category_length;
        let mut groups = GroupMap::new();
        for component in components.iter().filter(|c| c.members.len() >= min_len) {
            let low = component
                .members
                .iter()
                .map(|&o| buckets.key_for(signed[o].content_length))
                .min()
                .unwrap_or(0);
            let high = component
                .members
                .iter()
                .map(|&o| buckets.key_for(signed[o].content_length))
                .max()
                .unwrap_or(low);

            let members: Vec<&FileRecord> = component
                .members
                .iter()
                .map(|&o| &records[signed[o].record])
                .collect();
            let group_id = group_id_for(members.iter().map(|r| r.path.as_str()));
            let files = members.iter().map(|r| r.summary()).collect();

            stats.grouped_files += component.members.len();
            groups.insert(
                group_id,
                DuplicateGroup::new(
                    component.avg_similarity(),
                    buckets.range_label(low, high),
                    files,
                ),
            );
        }
        stats.groups = groups.len();
        stats.cluster_duration = cluster_start.elapsed();
        reporter.on_cluster_complete(groups.len(), stats.cluster_duration.as_secs_f64());

        info!(
            "Duplicate search finished: {} groups covering {} files, {} files skipped",
            stats.groups,
            stats.grouped_files,
            stats.skipped.len(),
        );

        Ok(DedupeRun { groups, stats })
    }

    /// Sign every record on the pool. Each worker writes only its own slot
    /// of the ordinal-indexed result table.
    fn sign_all(
        &self,
        records: &[FileRecord],
        reporter: &dyn ProgressReporter,
        skipped: &mut Vec<SkippedFile>,
    ) -> (Vec<SignedFile>, Vec<Signature>) {
        let total = records.len();
        let report_every = (total / 100).max(1);
        let done = AtomicUsize::new(0);

        let results: Vec<Result<(usize, Signature), SkipReason>> = self.pool.install(|| {
            records
                .par_iter()
                .map(|record| {
                    let result = self.sign(record);
                    let n = done.fetch_add(1, Ordering::Relaxed) + 1;
                    if n % report_every == 0 || n == total {
                        reporter.on_signature_progress(n, total);
                    }
                    result
                })
                .collect()
        });

        let mut signed = Vec::with_capacity(results.len());
        let mut signatures = Vec::with_capacity(results.len());
        for (idx, result) in results.into_iter().enumerate() {
            match result {
                Ok((content_length, signature)) => {
                    signed.push(SignedFile {
                        record: idx,
                        content_length,
                    });
                    signatures.push(signature);
                }
                Err(reason) => {
                    debug!("Skipping {}: {}", records[idx].path, reason);
                    skipped.push(SkippedFile {
                        path: records[idx].path.clone(),
                        reason,
                    });
                }
            }
        }
        (signed, signatures)
    }

    /// Normalized length and signature of one file.
    fn sign(&self, record: &FileRecord) -> Result<(usize, Signature), SkipReason> {
        let raw = record
            .text_content
            .as_deref()
            .ok_or(SkipReason::NoContent)?;
        let normalized = text::normalize(raw, self.settings.normalization);
        let content_length = text::char_length(&normalized);

        let shingles = text::shingles(
            &normalized,
            self.settings.shingle_length,
            self.settings.shingle_step,
        );
        let too_short = SkipReason::TooShort {
            length: content_length,
            shingle_length: self.settings.shingle_length,
        };
        let signature = self.generator.signature(&shingles).ok_or(too_short)?;
        Ok((content_length, signature))
    }
}

/// Stable id derived from the sorted member paths, so an unchanged
/// membership keeps its id across runs.
pub fn group_id_for<'a>(paths: impl IntoIterator<Item = &'a str>) -> String {
    let mut sorted: Vec<&str> = paths.into_iter().collect();
    sorted.sort_unstable();

    let mut hasher = blake3::Hasher::new();
    for path in sorted {
        hasher.update(path.as_bytes());
        hasher.update(b"\n");
    }
    let hex = hasher.finalize().to_hex();
    format!("group_{}", &hex.as_str()[..16])
}
