//! Pairwise signature-distance model.
//!
//! A logistic regression over hand-built pair features, trained on the
//! sampled labeled pairs. Composes an already-loaded
//! [`EthnicityEstimator`] as a feature source; it never trains one
//! implicitly. Publication metadata travels inside each signature, so the
//! attached curated signatures carry everything feature extraction needs.

use crate::models::{load_artifact, save_artifact, Estimator, EthnicityEstimator};
use crate::sampling::SignaturePair;
use crate::signature::Signature;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

const ARTIFACT_KIND: &str = "distance";
const N_FEATURES: usize = 5;

/// Training inputs for the distance model.
#[derive(Debug, Clone)]
pub struct DistanceData {
    /// Curated signatures referenced by the pairs (with their publications).
    pub signatures: Vec<Signature>,
    /// Labeled pairs from the sampler.
    pub pairs: Vec<SignaturePair>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DistanceState {
    /// Feature weights followed by the bias term.
    weights: Vec<f64>,
}

/// Pairwise same-author probability estimator.
#[derive(Debug, Clone)]
pub struct DistanceEstimator {
    ethnicity: EthnicityEstimator,
    data: Option<DistanceData>,
    state: Option<DistanceState>,
}

fn word_jaccard(a: &str, b: &str) -> f64 {
    let words_a: HashSet<&str> = a.split_whitespace().collect();
    let words_b: HashSet<&str> = b.split_whitespace().collect();
    if words_a.is_empty() && words_b.is_empty() {
        return 1.0;
    }
    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }
    let intersection = words_a.intersection(&words_b).count();
    let union = words_a.union(&words_b).count();
    intersection as f64 / union as f64
}

fn set_jaccard(a: &[String], b: &[String]) -> f64 {
    let set_a: HashSet<&str> = a.iter().map(String::as_str).collect();
    let set_b: HashSet<&str> = b.iter().map(String::as_str).collect();
    if set_a.is_empty() && set_b.is_empty() {
        return 0.0;
    }
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    intersection as f64 / union as f64
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl DistanceEstimator {
    /// Build a distance estimator over a loaded ethnicity model.
    #[must_use]
    pub fn new(ethnicity: EthnicityEstimator) -> Self {
        Self {
            ethnicity,
            data: None,
            state: None,
        }
    }

    /// Feature vector for a signature pair.
    fn features(&self, left: &Signature, right: &Signature) -> Result<[f64; N_FEATURES]> {
        let name_sim = word_jaccard(
            &left.author_name.to_lowercase(),
            &right.author_name.to_lowercase(),
        );
        let ethnicity_affinity = self.ethnicity.affinity(&left.author_name, &right.author_name)?;
        let affiliation_sim = word_jaccard(
            &left.author_affiliation.to_lowercase(),
            &right.author_affiliation.to_lowercase(),
        );
        let coauthor_sim = set_jaccard(&left.publication.authors, &right.publication.authors);
        let mut left_terms = left.publication.keywords.clone();
        left_terms.extend(left.publication.topics.iter().cloned());
        let mut right_terms = right.publication.keywords.clone();
        right_terms.extend(right.publication.topics.iter().cloned());
        let topic_sim = set_jaccard(&left_terms, &right_terms);
        Ok([
            name_sim,
            ethnicity_affinity,
            affiliation_sim,
            coauthor_sim,
            topic_sim,
        ])
    }

    /// Probability that two signatures refer to the same author.
    pub fn predict(&self, left: &Signature, right: &Signature) -> Result<f64> {
        let state = self
            .state
            .as_ref()
            .ok_or_else(|| Error::model("distance estimator is not fitted"))?;
        let features = self.features(left, right)?;
        let z: f64 = features
            .iter()
            .zip(&state.weights)
            .map(|(x, w)| x * w)
            .sum::<f64>()
            + state.weights[N_FEATURES];
        Ok(sigmoid(z))
    }

    /// Distance between two signatures: `1 - predict`.
    pub fn distance(&self, left: &Signature, right: &Signature) -> Result<f64> {
        Ok(1.0 - self.predict(left, right)?)
    }
}

impl Estimator for DistanceEstimator {
    type Data = DistanceData;

    fn load_data(&mut self, data: DistanceData) -> Result<()> {
        self.data = Some(data);
        Ok(())
    }

    fn fit(&mut self) -> Result<()> {
        let data = self
            .data
            .as_ref()
            .ok_or_else(|| Error::invalid_input("no distance training data loaded"))?;
        if data.pairs.is_empty() {
            return Err(Error::invalid_input("no pairs to train the distance model on"));
        }
        let by_uuid: HashMap<&str, &Signature> = data
            .signatures
            .iter()
            .map(|s| (s.signature_uuid.as_str(), s))
            .collect();

        let mut examples = Vec::with_capacity(data.pairs.len());
        for pair in &data.pairs {
            let left = by_uuid.get(pair.left_uuid.as_str()).ok_or_else(|| {
                Error::invalid_input(format!("pair references unknown signature {}", pair.left_uuid))
            })?;
            let right = by_uuid.get(pair.right_uuid.as_str()).ok_or_else(|| {
                Error::invalid_input(format!(
                    "pair references unknown signature {}",
                    pair.right_uuid
                ))
            })?;
            let label = if pair.same_author { 1.0 } else { 0.0 };
            examples.push((self.features(left, right)?, label));
        }

        // Batch gradient descent; the feature space is tiny so a fixed
        // schedule converges well enough.
        let n = examples.len() as f64;
        let mut weights = vec![0.0f64; N_FEATURES + 1];
        let learning_rate = 1.0;
        for _ in 0..500 {
            let mut gradient = vec![0.0f64; N_FEATURES + 1];
            for (features, label) in &examples {
                let z: f64 = features
                    .iter()
                    .zip(&weights)
                    .map(|(x, w)| x * w)
                    .sum::<f64>()
                    + weights[N_FEATURES];
                let delta = sigmoid(z) - label;
                for (g, x) in gradient.iter_mut().zip(features.iter()) {
                    *g += delta * x;
                }
                gradient[N_FEATURES] += delta;
            }
            for (w, g) in weights.iter_mut().zip(&gradient) {
                *w -= learning_rate * g / n;
            }
        }

        log::info!("fitted distance model on {} pairs", examples.len());
        self.state = Some(DistanceState { weights });
        Ok(())
    }

    fn save_model(&self, path: &Path) -> Result<()> {
        let state = self
            .state
            .as_ref()
            .ok_or_else(|| Error::model("distance estimator is not fitted"))?;
        save_artifact(path, ARTIFACT_KIND, state)
    }

    fn load_model(&mut self, path: &Path) -> Result<()> {
        let state: DistanceState = load_artifact(path, ARTIFACT_KIND)?;
        if state.weights.len() != N_FEATURES + 1 {
            return Err(Error::model(format!(
                "distance artifact {} has {} weights, expected {}",
                path.display(),
                state.weights.len(),
                N_FEATURES + 1
            )));
        }
        self.state = Some(state);
        Ok(())
    }
}
