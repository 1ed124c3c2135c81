//! Bootstrapped cluster assignments from curated author identifiers.
//!
//! Curated author ids are partial ground truth: grouping signatures by them
//! yields both a training seed for the distance and clustering stages and a
//! blocking structure downstream clustering can treat as already resolved.

use crate::signature::{Cluster, ClusterAssignment, Signature};

/// Output of a bootstrap pass over a signature sequence.
#[derive(Debug, Clone, Default)]
pub struct Bootstrap {
    /// The full input signature sequence, in input order.
    pub signatures: Vec<Signature>,
    /// The bootstrapped cluster assignment over `signatures`.
    pub clusters: ClusterAssignment,
    /// The curated subset of `signatures`, in input order.
    pub curated: Vec<Signature>,
}

/// Partition `signatures` into an initial cluster assignment.
///
/// Signatures sharing a non-null `author_id` form one cluster per distinct
/// id, with `cluster_id`s assigned in the order the ids are first seen.
/// Every uncurated signature becomes its own singleton cluster, ids
/// continuing after the curated clusters in encounter order. For N distinct
/// curated ids and M uncurated signatures the ids are exactly `0..N+M`.
///
/// Empty input yields an empty assignment.
#[must_use]
pub fn bootstrap_clusters(signatures: Vec<Signature>) -> Bootstrap {
    // Vec-backed grouping keeps first-seen order deterministic.
    let mut curated_groups: Vec<(u64, Vec<String>)> = Vec::new();
    let mut uncurated_uuids: Vec<String> = Vec::new();
    let mut curated: Vec<Signature> = Vec::new();

    for signature in &signatures {
        match signature.author_id {
            Some(author_id) => {
                match curated_groups.iter_mut().find(|(id, _)| *id == author_id) {
                    Some((_, uuids)) => uuids.push(signature.signature_uuid.clone()),
                    None => {
                        curated_groups.push((author_id, vec![signature.signature_uuid.clone()]))
                    }
                }
                curated.push(signature.clone());
            }
            None => uncurated_uuids.push(signature.signature_uuid.clone()),
        }
    }

    let mut clusters: Vec<Cluster> = curated_groups
        .into_iter()
        .enumerate()
        .map(|(cluster_id, (author_id, signature_uuids))| Cluster {
            cluster_id,
            author_id: Some(author_id),
            signature_uuids,
        })
        .collect();

    let offset = clusters.len();
    clusters.extend(
        uncurated_uuids
            .into_iter()
            .enumerate()
            .map(|(i, uuid)| Cluster {
                cluster_id: offset + i,
                author_id: None,
                signature_uuids: vec![uuid],
            }),
    );

    log::debug!(
        "bootstrapped {} clusters ({} curated) from {} signatures",
        clusters.len(),
        offset,
        signatures.len()
    );

    Bootstrap {
        signatures,
        clusters: ClusterAssignment(clusters),
        curated,
    }
}
