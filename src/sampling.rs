//! Labeled signature-pair sampling for distance-model training.
//!
//! Pairs are drawn from curated signatures and their bootstrapped clusters:
//! two signatures of one cluster form a positive (same-author) pair, two
//! signatures from different clusters a negative one. The output is bounded
//! by the configured budget and balanced between the two labels as far as
//! the assignment allows. Sampling is deterministic for a given input.

use crate::signature::{ClusterAssignment, Signature};
use crate::{Error, Result};
use std::collections::HashSet;

/// A labeled signature pair.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SignaturePair {
    /// First signature uuid.
    pub left_uuid: String,
    /// Second signature uuid.
    pub right_uuid: String,
    /// Whether both signatures refer to the same author.
    pub same_author: bool,
}

/// Small deterministic PRNG so sampling is reproducible across runs.
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Lcg(seed.max(1))
    }

    fn next(&mut self) -> u64 {
        // Constants from Knuth's MMIX generator.
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.0
    }

    fn below(&mut self, bound: usize) -> usize {
        // Use the high half; the low bits of an LCG cycle short.
        ((self.next() >> 32) % bound as u64) as usize
    }
}

/// Sample up to `max_pairs` labeled pairs from `curated` and `clusters`.
///
/// The assignment may cover more signatures than `curated` (the
/// bootstrapper's output includes uncurated singletons); sampling is
/// restricted to cluster members present in `curated`, so every emitted
/// pair references a curated signature from the assignment. Pairs are
/// unique (unordered). `max_pairs == 0` is an error, since a distance model
/// cannot be trained on an empty sample.
///
/// The effective target is the smaller of `max_pairs` and the number of
/// distinct pairs the curated set can produce, so an oversized budget
/// terminates as soon as the attainable pairs are exhausted.
pub fn sample_signature_pairs(
    curated: &[Signature],
    clusters: &ClusterAssignment,
    max_pairs: usize,
) -> Result<Vec<SignaturePair>> {
    if max_pairs == 0 {
        return Err(Error::invalid_input("sampled-pairs budget is zero"));
    }
    let known: HashSet<&str> = curated.iter().map(|s| s.signature_uuid.as_str()).collect();

    let members: Vec<Vec<&String>> = clusters
        .iter()
        .map(|c| {
            c.signature_uuids
                .iter()
                .filter(|uuid| known.contains(uuid.as_str()))
                .collect::<Vec<_>>()
        })
        .filter(|m: &Vec<&String>| !m.is_empty())
        .collect();
    let multi: Vec<usize> = (0..members.len())
        .filter(|&i| members[i].len() >= 2)
        .collect();

    let mut pairs = Vec::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut rng = Lcg::new(members.len() as u64 * 31 + max_pairs as u64);

    let mut push = |left: &str, right: &str, same: bool, pairs: &mut Vec<SignaturePair>| {
        let key = if left <= right {
            (left.to_string(), right.to_string())
        } else {
            (right.to_string(), left.to_string())
        };
        if seen.insert(key) {
            pairs.push(SignaturePair {
                left_uuid: left.to_string(),
                right_uuid: right.to_string(),
                same_author: same,
            });
        }
    };

    // Every unordered pair of distinct curated signatures is either a
    // positive (same cluster) or a negative, so the attainable unique-pair
    // count bounds the target; an oversized budget cannot spin once the
    // pairs are exhausted.
    let total: usize = members.iter().map(Vec::len).sum();
    let attainable = total * total.saturating_sub(1) / 2;
    let target = max_pairs.min(attainable);

    // Alternate labels; give up after enough consecutive misses so a skewed
    // assignment (all singletons, or a single cluster) still terminates.
    let mut want_positive = !multi.is_empty();
    let mut misses = 0usize;
    let miss_budget = target.saturating_mul(8).max(256);

    while pairs.len() < target && misses < miss_budget {
        let before = pairs.len();
        if want_positive && !multi.is_empty() {
            let cluster = &members[multi[rng.below(multi.len())]];
            let i = rng.below(cluster.len());
            let j = rng.below(cluster.len());
            if i != j {
                push(cluster[i].as_str(), cluster[j].as_str(), true, &mut pairs);
            }
        } else if members.len() >= 2 {
            let a = rng.below(members.len());
            let b = rng.below(members.len());
            if a != b {
                let left = members[a][rng.below(members[a].len())].as_str();
                let right = members[b][rng.below(members[b].len())].as_str();
                push(left, right, false, &mut pairs);
            }
        } else {
            break;
        }
        if pairs.len() == before {
            misses += 1;
        } else {
            misses = 0;
        }
        if members.len() >= 2 {
            want_positive = !want_positive && !multi.is_empty();
        }
    }

    log::debug!(
        "sampled {} pairs ({} positive) from {} clusters",
        pairs.len(),
        pairs.iter().filter(|p| p.same_author).count(),
        clusters.len()
    );
    Ok(pairs)
}
