//! Pipeline configuration.
//!
//! A [`Config`] is built once at process start and passed by reference into
//! ingestion, the pipeline, and estimator constructors. It is read-only for
//! the lifetime of the run; there is no global configuration state.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Read-only configuration for a disambiguation run.
///
/// All filesystem locations derive from `base_path` unless overridden.
///
/// # Example
///
/// ```rust
/// use byline::Config;
///
/// let config = Config::new("/var/lib/byline")
///     .with_clustering_n_jobs(4)
///     .with_es_hostname("search.internal:9200");
/// assert!(config.ethnicity_model_path().ends_with("ethnicity.model.json"));
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base directory for datasets and model artifacts.
    pub base_path: PathBuf,
    /// Maximum number of labeled signature pairs sampled for distance training.
    pub sampled_pairs_size: usize,
    /// Worker count for the clustering fit.
    pub clustering_n_jobs: usize,
    /// Search index host:port.
    pub es_hostname: String,
    /// Per-request timeout for index queries, in seconds.
    pub es_timeout_secs: u64,
    /// Page size for index scroll queries.
    pub es_max_query_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("disambiguation"),
            sampled_pairs_size: 12_000_000,
            clustering_n_jobs: 8,
            es_hostname: "localhost:9200".to_string(),
            es_timeout_secs: 60,
            es_max_query_size: 999,
        }
    }
}

impl Config {
    /// Create a configuration rooted at `base_path` with default settings.
    #[must_use]
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            ..Default::default()
        }
    }

    /// Override the sampled-pairs budget.
    #[must_use]
    pub fn with_sampled_pairs_size(mut self, size: usize) -> Self {
        self.sampled_pairs_size = size;
        self
    }

    /// Override the clustering worker count.
    #[must_use]
    pub fn with_clustering_n_jobs(mut self, n_jobs: usize) -> Self {
        self.clustering_n_jobs = n_jobs;
        self
    }

    /// Override the search index host.
    #[must_use]
    pub fn with_es_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.es_hostname = hostname.into();
        self
    }

    fn join(&self, file: &str) -> PathBuf {
        self.base_path.join(file)
    }

    /// Curated signatures dump (JSONL).
    #[must_use]
    pub fn curated_signatures_path(&self) -> PathBuf {
        self.join("curated_signatures.jsonl")
    }

    /// Bootstrapped input clusters dump (JSONL).
    #[must_use]
    pub fn input_clusters_path(&self) -> PathBuf {
        self.join("input_clusters.jsonl")
    }

    /// Full signature dump (JSONL).
    #[must_use]
    pub fn signatures_path(&self) -> PathBuf {
        self.join("signatures.jsonl")
    }

    /// Sampled pairs dump (JSONL).
    #[must_use]
    pub fn sampled_pairs_path(&self) -> PathBuf {
        self.join("sampled_pairs.jsonl")
    }

    /// Publications dump (JSONL).
    #[must_use]
    pub fn publications_path(&self) -> PathBuf {
        self.join("publications.jsonl")
    }

    /// Name/ethnicity training dataset (CSV: `race,name` per line).
    #[must_use]
    pub fn ethnicity_data_path(&self) -> PathBuf {
        self.join("ethnicity.csv")
    }

    /// Persisted ethnicity model artifact.
    #[must_use]
    pub fn ethnicity_model_path(&self) -> PathBuf {
        self.join("ethnicity.model.json")
    }

    /// Persisted distance model artifact.
    #[must_use]
    pub fn distance_model_path(&self) -> PathBuf {
        self.join("distance.model.json")
    }

    /// Persisted clustering model artifact.
    #[must_use]
    pub fn clustering_model_path(&self) -> PathBuf {
        self.join("clustering.model.json")
    }

    /// Load a configuration from a JSON file.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
