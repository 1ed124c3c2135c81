//! Name-ethnicity feature model.
//!
//! A character-trigram multinomial naive-Bayes classifier trained from a
//! static labeled dataset (`race,name` CSV rows). Downstream it is only
//! used as a feature source: the distance model consumes the smoothed
//! per-class distribution for a name, not a hard class decision.

use crate::models::{load_artifact, save_artifact, Estimator};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const ARTIFACT_KIND: &str = "ethnicity";

/// Trained naive-Bayes state.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EthnicityState {
    classes: Vec<String>,
    class_log_prior: Vec<f64>,
    trigram_log_prob: BTreeMap<String, Vec<f64>>,
    /// Smoothed log probability for trigrams unseen in training, per class.
    unseen_log_prob: Vec<f64>,
}

/// Character-trigram ethnicity estimator.
#[derive(Debug, Clone, Default)]
pub struct EthnicityEstimator {
    rows: Option<Vec<(String, String)>>,
    state: Option<EthnicityState>,
}

fn trigrams(name: &str) -> Vec<String> {
    let padded: Vec<char> = format!("##{}##", name.to_lowercase()).chars().collect();
    padded.windows(3).map(|w| w.iter().collect()).collect()
}

impl EthnicityEstimator {
    /// Create an untrained estimator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the `race,name` training CSV. A leading `race,name` header is
    /// tolerated; any other row without both fields is fatal.
    fn parse_dataset(content: &str) -> Result<Vec<(String, String)>> {
        let mut rows = Vec::new();
        for (lineno, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if lineno == 0 && line.eq_ignore_ascii_case("race,name") {
                continue;
            }
            let (race, name) = line.split_once(',').ok_or_else(|| {
                Error::dataset(format!("ethnicity row {} lacks a comma: {line:?}", lineno + 1))
            })?;
            let (race, name) = (race.trim(), name.trim());
            if race.is_empty() || name.is_empty() {
                return Err(Error::dataset(format!(
                    "ethnicity row {} has an empty field: {line:?}",
                    lineno + 1
                )));
            }
            rows.push((race.to_string(), name.to_string()));
        }
        if rows.is_empty() {
            return Err(Error::dataset("ethnicity dataset has no rows"));
        }
        Ok(rows)
    }

    fn state(&self) -> Result<&EthnicityState> {
        self.state
            .as_ref()
            .ok_or_else(|| Error::model("ethnicity estimator is not fitted"))
    }

    /// Class labels, in training order.
    pub fn classes(&self) -> Result<&[String]> {
        Ok(&self.state()?.classes)
    }

    /// Smoothed class distribution for a name (sums to 1).
    pub fn distribution(&self, name: &str) -> Result<Vec<f64>> {
        let state = self.state()?;
        let n_classes = state.classes.len();
        let mut log_scores = state.class_log_prior.clone();
        for trigram in trigrams(name) {
            let per_class = state
                .trigram_log_prob
                .get(&trigram)
                .unwrap_or(&state.unseen_log_prob);
            for c in 0..n_classes {
                log_scores[c] += per_class[c];
            }
        }
        // Softmax with max subtraction for stability.
        let max = log_scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let mut dist: Vec<f64> = log_scores.iter().map(|s| (s - max).exp()).collect();
        let total: f64 = dist.iter().sum();
        for d in &mut dist {
            *d /= total;
        }
        Ok(dist)
    }

    /// How alike two names look to the model: dot product of their class
    /// distributions, in `[0, 1]`.
    pub fn affinity(&self, left_name: &str, right_name: &str) -> Result<f64> {
        let left = self.distribution(left_name)?;
        let right = self.distribution(right_name)?;
        Ok(left.iter().zip(&right).map(|(a, b)| a * b).sum())
    }
}

impl Estimator for EthnicityEstimator {
    /// Path to the `race,name` training CSV.
    type Data = PathBuf;

    fn load_data(&mut self, data: PathBuf) -> Result<()> {
        let content = fs::read_to_string(&data).map_err(|e| {
            Error::dataset(format!("cannot read ethnicity dataset {}: {e}", data.display()))
        })?;
        self.rows = Some(Self::parse_dataset(&content)?);
        Ok(())
    }

    fn fit(&mut self) -> Result<()> {
        let rows = self
            .rows
            .as_ref()
            .ok_or_else(|| Error::invalid_input("no ethnicity data loaded"))?;

        let mut classes: Vec<String> = Vec::new();
        for (race, _) in rows {
            if !classes.iter().any(|c| c == race) {
                classes.push(race.clone());
            }
        }
        let n_classes = classes.len();
        let class_index = |race: &str| classes.iter().position(|c| c.as_str() == race);

        let mut class_counts = vec![0usize; n_classes];
        let mut trigram_counts: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        let mut class_totals = vec![0.0f64; n_classes];
        for (race, name) in rows {
            let c = class_index(race).unwrap_or(0);
            class_counts[c] += 1;
            for trigram in trigrams(name) {
                trigram_counts.entry(trigram).or_insert_with(|| vec![0.0; n_classes])[c] += 1.0;
                class_totals[c] += 1.0;
            }
        }

        let vocab = trigram_counts.len() as f64;
        let n_rows = rows.len() as f64;
        let class_log_prior: Vec<f64> = class_counts
            .iter()
            .map(|&n| (n as f64 / n_rows).ln())
            .collect();
        let unseen_log_prob: Vec<f64> = class_totals
            .iter()
            .map(|&total| (1.0 / (total + vocab)).ln())
            .collect();
        let trigram_log_prob: BTreeMap<String, Vec<f64>> = trigram_counts
            .into_iter()
            .map(|(trigram, counts)| {
                let per_class = counts
                    .iter()
                    .enumerate()
                    .map(|(c, &n)| ((n + 1.0) / (class_totals[c] + vocab)).ln())
                    .collect();
                (trigram, per_class)
            })
            .collect();

        log::info!(
            "fitted ethnicity model: {} classes, {} trigrams",
            n_classes,
            vocab
        );
        self.state = Some(EthnicityState {
            classes,
            class_log_prior,
            trigram_log_prob,
            unseen_log_prob,
        });
        Ok(())
    }

    fn save_model(&self, path: &Path) -> Result<()> {
        save_artifact(path, ARTIFACT_KIND, self.state()?)
    }

    fn load_model(&mut self, path: &Path) -> Result<()> {
        self.state = Some(load_artifact(path, ARTIFACT_KIND)?);
        Ok(())
    }
}
