//! Block-partitioned signature clustering.
//!
//! Signatures are partitioned by `signature_block`; blocks are mutually
//! independent, so each one is clustered in isolation and the per-block
//! assignments are concatenated with globally renumbered cluster ids.
//! Within a block, curated input clusters are treated as pre-merged seeds,
//! then single-linkage merging joins signatures whose predicted same-author
//! probability clears the threshold.
//!
//! `fit_with_jobs` fans blocks out to a fixed pool of workers over a
//! channel; workers communicate only their final per-block result. Any
//! worker failure aborts the whole run.

use crate::models::{load_artifact, save_artifact, DistanceEstimator, Estimator};
use crate::signature::{Cluster, ClusterAssignment, Signature};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

const ARTIFACT_KIND: &str = "clustering";

/// Training inputs for the clustering model.
#[derive(Debug, Clone)]
pub struct ClusteringData {
    /// All signatures to cluster, curated and uncurated.
    pub signatures: Vec<Signature>,
    /// Seed assignment, typically the bootstrapper's output.
    pub input_clusters: ClusterAssignment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ClusteringState {
    threshold: f64,
    clusters: ClusterAssignment,
}

/// Signature clusterer over a loaded distance model.
#[derive(Debug, Clone)]
pub struct Clusterer {
    distance: DistanceEstimator,
    threshold: f64,
    n_jobs: usize,
    data: Option<ClusteringData>,
    state: Option<ClusteringState>,
}

/// Union-find over block-local indices.
struct UnionFind(Vec<usize>);

impl UnionFind {
    fn new(n: usize) -> Self {
        UnionFind((0..n).collect())
    }

    fn find(&mut self, i: usize) -> usize {
        if self.0[i] != i {
            let root = self.find(self.0[i]);
            self.0[i] = root;
        }
        self.0[i]
    }

    fn union(&mut self, i: usize, j: usize) {
        let (ri, rj) = (self.find(i), self.find(j));
        if ri != rj {
            self.0[ri] = rj;
        }
    }
}

impl Clusterer {
    /// Build a clusterer over a loaded distance model.
    #[must_use]
    pub fn new(distance: DistanceEstimator) -> Self {
        Self {
            distance,
            threshold: 0.5,
            n_jobs: 1,
            data: None,
            state: None,
        }
    }

    /// Set the same-author probability threshold for merging.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the default worker count used by [`Estimator::fit`].
    #[must_use]
    pub fn with_n_jobs(mut self, n_jobs: usize) -> Self {
        self.n_jobs = n_jobs.max(1);
        self
    }

    /// The final cluster assignment produced by the last fit (or load).
    pub fn predicted_clusters(&self) -> Result<&ClusterAssignment> {
        self.state
            .as_ref()
            .map(|s| &s.clusters)
            .ok_or_else(|| Error::model("clusterer is not fitted"))
    }

    /// Cluster one block's signatures. Cluster ids are block-local.
    fn cluster_block(
        &self,
        signatures: &[&Signature],
        input_clusters: &ClusterAssignment,
    ) -> Result<ClusterAssignment> {
        let index_of: HashMap<&str, usize> = signatures
            .iter()
            .enumerate()
            .map(|(i, s)| (s.signature_uuid.as_str(), i))
            .collect();
        let mut uf = UnionFind::new(signatures.len());

        // Curated seed clusters count as already resolved.
        for cluster in input_clusters {
            if cluster.author_id.is_none() {
                continue;
            }
            let members: Vec<usize> = cluster
                .signature_uuids
                .iter()
                .filter_map(|uuid| index_of.get(uuid.as_str()).copied())
                .collect();
            for pair in members.windows(2) {
                uf.union(pair[0], pair[1]);
            }
        }

        for i in 0..signatures.len() {
            for j in (i + 1)..signatures.len() {
                if uf.find(i) == uf.find(j) {
                    continue;
                }
                if self.distance.predict(signatures[i], signatures[j])? >= self.threshold {
                    uf.union(i, j);
                }
            }
        }

        // Emit clusters in order of their first member.
        let mut root_to_cluster: HashMap<usize, usize> = HashMap::new();
        let mut clusters: Vec<Cluster> = Vec::new();
        for (i, signature) in signatures.iter().enumerate() {
            let root = uf.find(i);
            let cluster_id = *root_to_cluster.entry(root).or_insert_with(|| {
                clusters.push(Cluster {
                    cluster_id: clusters.len(),
                    author_id: None,
                    signature_uuids: Vec::new(),
                });
                clusters.len() - 1
            });
            clusters[cluster_id]
                .signature_uuids
                .push(signature.signature_uuid.clone());
        }

        // A cluster inherits a curated author id only when its curated
        // members agree on exactly one.
        for cluster in &mut clusters {
            let mut ids = cluster
                .signature_uuids
                .iter()
                .filter_map(|uuid| index_of.get(uuid.as_str()))
                .filter_map(|&i| signatures[i].author_id);
            let first = ids.next();
            cluster.author_id = match first {
                Some(id) if ids.all(|other| other == id) => Some(id),
                _ => None,
            };
        }

        Ok(ClusterAssignment(clusters))
    }

    /// Partition the loaded signatures by block, in first-seen block order.
    fn blocks(signatures: &[Signature]) -> Vec<(String, Vec<&Signature>)> {
        let mut order: Vec<(String, Vec<&Signature>)> = Vec::new();
        for signature in signatures {
            match order
                .iter_mut()
                .find(|(block, _)| *block == signature.signature_block)
            {
                Some((_, members)) => members.push(signature),
                None => order.push((signature.signature_block.clone(), vec![signature])),
            }
        }
        order
    }

    /// Cluster all blocks using `n_jobs` workers.
    ///
    /// Per-block results are deterministic and concatenated in block order,
    /// so the global assignment does not depend on the worker count. The
    /// first worker failure aborts the run; the loaded data stays attached,
    /// so a failed fit can be retried.
    pub fn fit_with_jobs(&mut self, n_jobs: usize) -> Result<()> {
        let data = self
            .data
            .as_ref()
            .ok_or_else(|| Error::invalid_input("no clustering data loaded"))?;
        let blocks = Self::blocks(&data.signatures);
        let n_jobs = n_jobs.max(1).min(blocks.len().max(1));
        log::info!(
            "clustering {} signatures in {} blocks with {} workers",
            data.signatures.len(),
            blocks.len(),
            n_jobs
        );

        let mut per_block: Vec<Option<ClusterAssignment>> = vec![None; blocks.len()];
        {
            let (job_tx, job_rx) =
                crossbeam_channel::unbounded::<(usize, &[&Signature])>();
            let (result_tx, result_rx) =
                crossbeam_channel::unbounded::<(usize, Result<ClusterAssignment>)>();
            for (block_index, (_, members)) in blocks.iter().enumerate() {
                job_tx
                    .send((block_index, members.as_slice()))
                    .map_err(|_| Error::invalid_input("job channel closed"))?;
            }
            drop(job_tx);

            std::thread::scope(|scope| {
                for _ in 0..n_jobs {
                    let job_rx = job_rx.clone();
                    let result_tx = result_tx.clone();
                    let clusterer = &*self;
                    let input_clusters = &data.input_clusters;
                    scope.spawn(move || {
                        for (block_index, members) in job_rx.iter() {
                            let result = clusterer.cluster_block(members, input_clusters);
                            if result_tx.send((block_index, result)).is_err() {
                                break;
                            }
                        }
                    });
                }
                drop(result_tx);

                for (block_index, result) in result_rx.iter() {
                    per_block[block_index] = Some(result?);
                }
                Ok::<(), Error>(())
            })?;
        }

        let mut clusters: Vec<Cluster> = Vec::new();
        for assignment in per_block.into_iter() {
            let assignment =
                assignment.ok_or_else(|| Error::model("worker dropped a block result"))?;
            let offset = clusters.len();
            clusters.extend(assignment.renumbered(offset));
        }

        self.state = Some(ClusteringState {
            threshold: self.threshold,
            clusters: ClusterAssignment(clusters),
        });
        Ok(())
    }
}

impl Estimator for Clusterer {
    type Data = ClusteringData;

    fn load_data(&mut self, data: ClusteringData) -> Result<()> {
        self.data = Some(data);
        Ok(())
    }

    fn fit(&mut self) -> Result<()> {
        self.fit_with_jobs(self.n_jobs)
    }

    fn save_model(&self, path: &Path) -> Result<()> {
        let state = self
            .state
            .as_ref()
            .ok_or_else(|| Error::model("clusterer is not fitted"))?;
        save_artifact(path, ARTIFACT_KIND, state)
    }

    fn load_model(&mut self, path: &Path) -> Result<()> {
        self.state = Some(load_artifact(path, ARTIFACT_KIND)?);
        Ok(())
    }
}
