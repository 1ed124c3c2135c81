//! Core data model: signatures, publications, and clusters.
//!
//! A *signature* is one author mention on one publication. Signatures drawn
//! from the same record share a single [`Publication`] via `Arc`. Both are
//! immutable once built; clusters are produced by the bootstrapper or the
//! clustering model and consumed by the next pipeline stage.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// A bibliographic record shared by all signatures drawn from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    /// Record control number.
    pub publication_id: u64,
    /// Record title.
    pub title: String,
    /// Record abstract (may be empty).
    pub abstract_text: String,
    /// Full names of all authors, in record order.
    pub authors: Vec<String>,
    /// Collaborations the record is attributed to.
    pub collaborations: Vec<String>,
    /// Record keywords.
    pub keywords: Vec<String>,
    /// Subject categories/topics.
    pub topics: Vec<String>,
}

/// One author mention on one publication.
///
/// `author_id` is present only when the mention carries a curated relation
/// that resolves to an author record id; everything else is `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signature {
    /// Unique mention identifier.
    pub signature_uuid: String,
    /// Author full name as it appears on the record.
    pub author_name: String,
    /// First listed affiliation, or empty string if unknown.
    pub author_affiliation: String,
    /// Curated author record id, if any.
    pub author_id: Option<u64>,
    /// Coarse grouping key derived from the name.
    pub signature_block: String,
    /// The publication this mention appears on.
    pub publication: Arc<Publication>,
}

impl Signature {
    /// Whether this signature carries a curated author identity.
    #[must_use]
    pub fn is_curated(&self) -> bool {
        self.author_id.is_some()
    }
}

/// A group of signatures believed to refer to one person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    /// Assignment-unique non-negative id.
    pub cluster_id: usize,
    /// Curated author id shared by every member, or `None`.
    pub author_id: Option<u64>,
    /// Member signature uuids. Never empty.
    pub signature_uuids: Vec<String>,
}

/// A complete partition of a signature set into clusters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterAssignment(pub Vec<Cluster>);

impl ClusterAssignment {
    /// Number of clusters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the assignment is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over clusters.
    pub fn iter(&self) -> std::slice::Iter<'_, Cluster> {
        self.0.iter()
    }

    /// Total number of signatures covered by the assignment.
    #[must_use]
    pub fn signature_count(&self) -> usize {
        self.0.iter().map(|c| c.signature_uuids.len()).sum()
    }

    /// Find the cluster containing a signature uuid.
    #[must_use]
    pub fn cluster_of(&self, signature_uuid: &str) -> Option<&Cluster> {
        self.0
            .iter()
            .find(|c| c.signature_uuids.iter().any(|u| u == signature_uuid))
    }

    /// Return a copy with every `cluster_id` shifted by `offset`.
    ///
    /// Used when concatenating per-block assignments into a global one.
    #[must_use]
    pub fn renumbered(&self, offset: usize) -> Self {
        ClusterAssignment(
            self.0
                .iter()
                .map(|c| Cluster {
                    cluster_id: c.cluster_id + offset,
                    author_id: c.author_id,
                    signature_uuids: c.signature_uuids.clone(),
                })
                .collect(),
        )
    }

    /// Check that clusters partition `signatures`: pairwise-disjoint uuid
    /// sets whose union is exactly the input signature set, every cluster
    /// non-empty, and cluster ids unique.
    #[must_use]
    pub fn is_partition_of(&self, signatures: &[Signature]) -> bool {
        let expected: HashSet<&str> =
            signatures.iter().map(|s| s.signature_uuid.as_str()).collect();
        let mut seen_uuids = HashSet::new();
        let mut seen_ids = HashSet::new();
        for cluster in &self.0 {
            if cluster.signature_uuids.is_empty() || !seen_ids.insert(cluster.cluster_id) {
                return false;
            }
            for uuid in &cluster.signature_uuids {
                if !expected.contains(uuid.as_str()) || !seen_uuids.insert(uuid.as_str()) {
                    return false;
                }
            }
        }
        seen_uuids.len() == expected.len()
    }
}

impl IntoIterator for ClusterAssignment {
    type Item = Cluster;
    type IntoIter = std::vec::IntoIter<Cluster>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ClusterAssignment {
    type Item = &'a Cluster;
    type IntoIter = std::slice::Iter<'a, Cluster>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
