//! Learned pipeline components.
//!
//! All three estimators implement [`Estimator`]: attach training inputs with
//! `load_data`, train with `fit`, persist/restore opaque state with
//! `save_model`/`load_model`. The orchestrator depends on this capability
//! only, so tests can substitute stubs.
//!
//! Artifacts are kind-tagged, versioned JSON documents. Loading an artifact
//! of the wrong kind or version is a fatal [`Error::Model`](crate::Error),
//! never a silent fallback to an empty model.

pub mod clustering;
pub mod distance;
pub mod ethnicity;

pub use clustering::{Clusterer, ClusteringData};
pub use distance::{DistanceData, DistanceEstimator};
pub use ethnicity::EthnicityEstimator;

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// The train/persist/load capability shared by the three learned components.
pub trait Estimator {
    /// Training inputs this estimator consumes.
    type Data;

    /// Attach training inputs. Must be called before [`Estimator::fit`].
    fn load_data(&mut self, data: Self::Data) -> Result<()>;

    /// Train from previously loaded data.
    fn fit(&mut self) -> Result<()>;

    /// Persist the trained state to `path`, overwriting any previous artifact.
    fn save_model(&self, path: &Path) -> Result<()>;

    /// Restore previously persisted state from `path`, replacing any trained
    /// state on `self` but leaving composed upstream models untouched.
    ///
    /// The restored estimator produces identical inference output to the one
    /// that was saved, without retraining.
    fn load_model(&mut self, path: &Path) -> Result<()>;
}

const ARTIFACT_VERSION: u32 = 1;

/// Versioned envelope wrapping a persisted estimator state.
#[derive(Serialize, Deserialize)]
struct Artifact<S> {
    kind: String,
    version: u32,
    state: S,
}

/// Write `state` to `path` as a kind-tagged artifact.
pub(crate) fn save_artifact<S: Serialize>(path: &Path, kind: &str, state: &S) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let artifact = Artifact {
        kind: kind.to_string(),
        version: ARTIFACT_VERSION,
        state,
    };
    let json = serde_json::to_string(&artifact)?;
    fs::write(path, json)?;
    log::info!("saved {kind} artifact to {}", path.display());
    Ok(())
}

/// Read a kind-tagged artifact back, refusing mismatched kind or version.
pub(crate) fn load_artifact<S: DeserializeOwned>(path: &Path, kind: &str) -> Result<S> {
    let content = fs::read_to_string(path).map_err(|e| {
        Error::model(format!("cannot read {kind} artifact {}: {e}", path.display()))
    })?;
    let artifact: Artifact<S> = serde_json::from_str(&content).map_err(|e| {
        Error::model(format!("malformed {kind} artifact {}: {e}", path.display()))
    })?;
    if artifact.kind != kind {
        return Err(Error::model(format!(
            "artifact {} has kind {:?}, expected {kind:?}",
            path.display(),
            artifact.kind
        )));
    }
    if artifact.version != ARTIFACT_VERSION {
        return Err(Error::model(format!(
            "artifact {} has version {}, expected {ARTIFACT_VERSION}",
            path.display(),
            artifact.version
        )));
    }
    Ok(artifact.state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toy.json");
        save_artifact(&path, "toy", &vec![1u32, 2, 3]).unwrap();
        let state: Vec<u32> = load_artifact(&path, "toy").unwrap();
        assert_eq!(state, vec![1, 2, 3]);
    }

    #[test]
    fn wrong_kind_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toy.json");
        save_artifact(&path, "toy", &0u32).unwrap();
        let err = load_artifact::<u32>(&path, "other").unwrap_err();
        assert!(err.to_string().contains("kind"));
    }

    #[test]
    fn missing_artifact_is_a_model_error() {
        let err = load_artifact::<u32>(Path::new("/nonexistent/toy.json"), "toy").unwrap_err();
        assert!(matches!(err, Error::Model(_)));
    }
}
