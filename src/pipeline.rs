//! Training pipeline orchestration.
//!
//! Three stages in dependency order: ethnicity → distance → clustering.
//! Each stage trains and persists its own artifact; a downstream stage only
//! *loads* upstream artifacts and fails fast when one is missing or
//! incompatible; it never retrains an upstream stage implicitly.
//! Re-running a stage overwrites its artifact.

use crate::bootstrap::{bootstrap_clusters, Bootstrap};
use crate::config::Config;
use crate::ingest::{get_curated_signatures, get_signatures, LiteratureIndex};
use crate::models::{
    Clusterer, ClusteringData, DistanceData, DistanceEstimator, Estimator, EthnicityEstimator,
};
use crate::sampling::sample_signature_pairs;
use crate::signature::{ClusterAssignment, Signature};
use crate::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Pipeline orchestrator over a read-only run configuration.
pub struct Pipeline<'a> {
    config: &'a Config,
}

impl<'a> Pipeline<'a> {
    /// Build a pipeline over `config`.
    #[must_use]
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Ingest signatures and derive their bootstrapped cluster assignment.
    ///
    /// With `curated_only`, only curated signatures (with resolved author
    /// ids) are fetched and clustered; otherwise the full signature set is
    /// fetched and the assignment mixes curated clusters with uncurated
    /// singletons.
    pub fn signatures_and_input_clusters(
        &self,
        index: &dyn LiteratureIndex,
        curated_only: bool,
        signature_block: Option<&str>,
    ) -> Result<Bootstrap> {
        let signatures = if curated_only {
            get_curated_signatures(index, signature_block)?
        } else {
            get_signatures(index, signature_block)?
        };
        Ok(bootstrap_clusters(signatures))
    }

    /// Stage 1: train the ethnicity model from the static labeled dataset
    /// and persist it. An unreadable or malformed dataset is fatal.
    pub fn train_and_save_ethnicity_model(&self) -> Result<()> {
        log::info!("training ethnicity model");
        let mut estimator = EthnicityEstimator::new();
        estimator.load_data(self.config.ethnicity_data_path())?;
        estimator.fit()?;
        estimator.save_model(&self.config.ethnicity_model_path())
    }

    /// Stage 2: train the distance model on sampled labeled pairs and
    /// persist it.
    ///
    /// The ethnicity artifact is loaded first; if it is missing or
    /// incompatible the stage fails before any sampling or training, so no
    /// partial distance artifact is left behind.
    pub fn train_and_save_distance_model(
        &self,
        curated: &[Signature],
        clusters: &ClusterAssignment,
    ) -> Result<()> {
        let mut ethnicity = EthnicityEstimator::new();
        ethnicity.load_model(&self.config.ethnicity_model_path())?;

        log::info!("training distance model");
        let pairs =
            sample_signature_pairs(curated, clusters, self.config.sampled_pairs_size)?;
        let mut estimator = DistanceEstimator::new(ethnicity);
        estimator.load_data(DistanceData {
            signatures: curated.to_vec(),
            pairs,
        })?;
        estimator.fit()?;
        estimator.save_model(&self.config.distance_model_path())
    }

    /// Stage 3: build and fit the clustering model over the full signature
    /// set, seeded by `input_clusters`.
    ///
    /// Both upstream artifacts must be loadable; a missing one is fatal.
    /// The fitted clusterer is returned so the caller can read or persist
    /// the final assignment.
    pub fn train_clustering_model(
        &self,
        signatures: Vec<Signature>,
        input_clusters: ClusterAssignment,
    ) -> Result<Clusterer> {
        let mut ethnicity = EthnicityEstimator::new();
        ethnicity.load_model(&self.config.ethnicity_model_path())?;
        let mut distance = DistanceEstimator::new(ethnicity);
        distance.load_model(&self.config.distance_model_path())?;

        log::info!("training clustering model");
        let mut clusterer =
            Clusterer::new(distance).with_n_jobs(self.config.clustering_n_jobs);
        clusterer.load_data(ClusteringData {
            signatures,
            input_clusters,
        })?;
        clusterer.fit()?;
        Ok(clusterer)
    }
}

/// Write items to a JSONL file, one document per line.
pub fn write_jsonl<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut file = fs::File::create(path)?;
    for item in items {
        serde_json::to_writer(&mut file, item)?;
        file.write_all(b"\n")?;
    }
    Ok(())
}

/// Read a JSONL file back into items.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let reader = BufReader::new(fs::File::open(path)?);
    let mut items = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        items.push(serde_json::from_str(&line)?);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::Cluster;

    #[test]
    fn jsonl_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clusters.jsonl");
        let clusters = vec![
            Cluster {
                cluster_id: 0,
                author_id: Some(1),
                signature_uuids: vec!["a".to_string()],
            },
            Cluster {
                cluster_id: 1,
                author_id: None,
                signature_uuids: vec!["b".to_string()],
            },
        ];
        write_jsonl(&path, &clusters).unwrap();
        let restored: Vec<Cluster> = read_jsonl(&path).unwrap();
        assert_eq!(restored, clusters);
    }
}
