//! # byline
//!
//! Author-identity disambiguation for bibliographic corpora.
//!
//! A *signature* is one author mention on one publication. `byline` groups
//! the signatures that refer to the same real-world person into clusters,
//! using a three-stage learned pipeline:
//!
//! 1. **Ethnicity**: a name-ethnicity feature model trained from a static
//!    labeled dataset.
//! 2. **Distance**: a pairwise same-author model over sampled labeled
//!    signature pairs, using ethnicity-derived features among others.
//! 3. **Clustering**: block-partitioned clustering of the full signature
//!    set, seeded by ground-truth ("bootstrapped") clusters.
//!
//! Stages run in dependency order; each persists its own artifact and a
//! downstream stage fails fast when an upstream artifact is missing rather
//! than retraining it implicitly.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use byline::{Config, EsIndex, Pipeline};
//!
//! # fn main() -> byline::Result<()> {
//! let config = Config::new("/var/lib/byline");
//! let index = EsIndex::new(&config);
//! let pipeline = Pipeline::new(&config);
//!
//! pipeline.train_and_save_ethnicity_model()?;
//!
//! let bootstrap = pipeline.signatures_and_input_clusters(&index, false, None)?;
//! pipeline.train_and_save_distance_model(&bootstrap.curated, &bootstrap.clusters)?;
//!
//! let clusterer =
//!     pipeline.train_clustering_model(bootstrap.signatures, bootstrap.clusters)?;
//! for cluster in clusterer.predicted_clusters()? {
//!     println!("{}: {} signatures", cluster.cluster_id, cluster.signature_uuids.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Design notes
//!
//! - Configuration is an explicitly constructed, read-only [`Config`],
//!   passed by reference everywhere; there is no global state.
//! - The three learned components share one capability,
//!   [`Estimator`](models::Estimator), so the orchestrator can be exercised
//!   with stub models in tests.
//! - A malformed curated-relation reference makes a signature uncurated
//!   (logged, not an error); missing upstream model artifacts are fatal.

#![warn(missing_docs)]

pub mod bootstrap;
pub mod config;
mod error;
pub mod ingest;
pub mod models;
pub mod pipeline;
pub mod sampling;
pub mod signature;

pub use bootstrap::{bootstrap_clusters, Bootstrap};
pub use config::Config;
pub use error::{Error, Result};
pub use ingest::{EsIndex, LiteratureIndex, MemoryIndex, SignatureQuery};
pub use models::{Clusterer, DistanceEstimator, Estimator, EthnicityEstimator};
pub use pipeline::Pipeline;
pub use sampling::{sample_signature_pairs, SignaturePair};
pub use signature::{Cluster, ClusterAssignment, Publication, Signature};
