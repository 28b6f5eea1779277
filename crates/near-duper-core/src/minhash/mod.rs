//! MinHash signatures over shingle sets.
//!
//! Each of the `M` hash functions is a universal hash `(a * h(s) + b) mod P`
//! applied to a base hash `h(s)` of the shingle. The signature keeps the
//! minimum per function; the fraction of agreeing positions between two
//! signatures estimates the Jaccard similarity of the underlying sets.

use ahash::AHashSet;
use std::hash::Hasher as _;
use twox_hash::XxHash64;

/// Mersenne prime 2^61 - 1, larger than any reduced base hash.
pub const PRIME: u64 = (1 << 61) - 1;

pub type Signature = Vec<u64>;

/// Holds the `M` coefficient pairs. Cheap to share across worker threads.
#[derive(Debug, Clone)]
pub struct SignatureGenerator {
    coefficients: Vec<(u64, u64)>,
}

impl SignatureGenerator {
    /// Derive `signature_size` coefficient pairs from `seed`. The same seed
    /// always yields the same pairs, so signatures are reproducible.
    pub fn new(signature_size: usize, seed: u64) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"near-duper minhash coefficients");
        hasher.update(&seed.to_le_bytes());
        let mut reader = hasher.finalize_xof();

        let mut next_u64 = || {
            let mut buf = [0u8; 8];
            reader.fill(&mut buf);
            u64::from_le_bytes(buf)
        };

        let coefficients = (0..signature_size)
            .map(|_| {
                let a = 1 + next_u64() % (PRIME - 1);
                let b = next_u64() % PRIME;
                (a, b)
            })
            .collect();

        Self { coefficients }
    }

    pub fn signature_size(&self) -> usize {
        self.coefficients.len()
    }

    /// Returns `None` for an empty shingle set.
    pub fn signature(&self, shingles: &AHashSet<&str>) -> Option<Signature> {
        if shingles.is_empty() {
            return None;
        }

        let mut signature = vec![u64::MAX; self.coefficients.len()];
        for shingle in shingles {
            let base = hash_data(shingle.as_bytes()) % PRIME;
            for (slot, &(a, b)) in signature.iter_mut().zip(&self.coefficients) {
                let value = universal_hash(a, b, base);
                if value < *slot {
                    *slot = value;
                }
            }
        }
        Some(signature)
    }
}

#[inline]
fn universal_hash(a: u64, b: u64, x: u64) -> u64 {
    ((a as u128 * x as u128 + b as u128) % PRIME as u128) as u64
}

pub fn hash_data(data: &[u8]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(data);
    hasher.finish()
}

/// Number of positions at which the two signatures agree.
pub fn matching_positions(a: &[u64], b: &[u64]) -> usize {
    a.iter().zip(b).filter(|(x, y)| x == y).count()
}

/// Fraction of positions at which the two signatures agree. Signatures of
/// different lengths are never similar.
pub fn estimate_similarity(a: &[u64], b: &[u64]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    matching_positions(a, b) as f64 / a.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned_set(items: &[String]) -> AHashSet<&str> {
        items.iter().map(|s| s.as_str()).collect()
    }

    #[test]
    fn test_coefficients_are_deterministic_per_seed() {
        let a = SignatureGenerator::new(64, 7);
        let b = SignatureGenerator::new(64, 7);
        let c = SignatureGenerator::new(64, 8);
        assert_eq!(a.coefficients, b.coefficients);
        assert_ne!(a.coefficients, c.coefficients);
        assert!(a.coefficients.iter().all(|&(a, b)| a >= 1 && a < PRIME && b < PRIME));
    }

    #[test]
    fn test_signature_is_reproducible() {
        let generator = SignatureGenerator::new(100, 42);
        let set: AHashSet<&str> = ["alpha", "beta", "gamma"].into_iter().collect();
        let first = generator.signature(&set).unwrap();
        let second = SignatureGenerator::new(100, 42).signature(&set).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 100);
        assert!(first.iter().all(|&v| v < PRIME));
    }

    #[test]
    fn test_empty_set_has_no_signature() {
        let generator = SignatureGenerator::new(16, 1);
        assert!(generator.signature(&AHashSet::new()).is_none());
    }

    #[test]
    fn test_identical_sets_agree_everywhere() {
        let generator = SignatureGenerator::new(128, 3);
        let set: AHashSet<&str> = ["one", "two", "three", "four"].into_iter().collect();
        let sig_a = generator.signature(&set).unwrap();
        let sig_b = generator.signature(&set.clone()).unwrap();
        assert_eq!(estimate_similarity(&sig_a, &sig_b), 1.0);
    }

    #[test]
    fn test_estimate_tracks_jaccard() {
        // 150 shared of 250 total: J = 0.6
        let left: Vec<String> = (0..200).map(|i| format!("item-{i}")).collect();
        let right: Vec<String> = (50..250).map(|i| format!("item-{i}")).collect();
        let generator = SignatureGenerator::new(256, 42);

        let sig_l = generator.signature(&owned_set(&left)).unwrap();
        let sig_r = generator.signature(&owned_set(&right)).unwrap();
        let estimate = estimate_similarity(&sig_l, &sig_r);
        assert!((estimate - 0.6).abs() < 0.15, "estimate {estimate} too far from 0.6");
    }

    #[test]
    fn test_disjoint_sets_rarely_agree() {
        let left: Vec<String> = (0..100).map(|i| format!("left-{i}")).collect();
        let right: Vec<String> = (0..100).map(|i| format!("right-{i}")).collect();
        let generator = SignatureGenerator::new(100, 42);
        let estimate = estimate_similarity(
            &generator.signature(&owned_set(&left)).unwrap(),
            &generator.signature(&owned_set(&right)).unwrap(),
        );
        assert!(estimate < 0.1, "disjoint sets estimated at {estimate}");
    }

    #[test]
    fn test_mismatched_lengths_are_not_similar() {
        assert_eq!(estimate_similarity(&[1, 2, 3], &[1, 2]), 0.0);
        assert_eq!(estimate_similarity(&[], &[]), 0.0);
        assert_eq!(matching_positions(&[1, 2, 3], &[1, 5, 3]), 2);
    }
}
