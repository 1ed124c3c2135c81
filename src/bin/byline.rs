//! byline - author disambiguation pipeline CLI
//!
//! Thin glue over the library: each subcommand runs one pipeline stage
//! against a configured base directory and the backing literature index.
//!
//! ```bash
//! byline --base-path /var/lib/byline train-ethnicity
//! byline --base-path /var/lib/byline fetch
//! byline --base-path /var/lib/byline train-distance
//! byline --base-path /var/lib/byline cluster --n-jobs 4
//! ```

use byline::pipeline::{read_jsonl, write_jsonl};
use byline::{Cluster, Config, EsIndex, Estimator, Pipeline, Publication, Signature};
use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "byline")]
#[command(author, version, about = "Author-identity disambiguation pipeline")]
struct Cli {
    /// Base directory for datasets and model artifacts.
    #[arg(long, default_value = "disambiguation")]
    base_path: PathBuf,

    /// Search index host:port.
    #[arg(long)]
    es_hostname: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch signatures and bootstrapped clusters from the index to disk.
    Fetch {
        /// Restrict to one signature block.
        #[arg(long)]
        signature_block: Option<String>,
    },
    /// Train and persist the name-ethnicity model.
    TrainEthnicity,
    /// Train and persist the pairwise distance model.
    TrainDistance {
        /// Override the sampled-pairs budget.
        #[arg(long)]
        sampled_pairs_size: Option<usize>,
    },
    /// Cluster the fetched signatures and write the final assignment.
    Cluster {
        /// Worker count for the clustering fit.
        #[arg(long)]
        n_jobs: Option<usize>,
        /// Where to write the final cluster assignment (JSONL).
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn run(cli: Cli) -> byline::Result<()> {
    let mut config = Config::new(cli.base_path);
    if let Some(hostname) = cli.es_hostname {
        config = config.with_es_hostname(hostname);
    }

    match cli.command {
        Commands::Fetch { signature_block } => {
            let index = EsIndex::new(&config);
            let pipeline = Pipeline::new(&config);
            let bootstrap = pipeline.signatures_and_input_clusters(
                &index,
                false,
                signature_block.as_deref(),
            )?;
            write_jsonl(&config.curated_signatures_path(), &bootstrap.curated)?;
            write_jsonl(&config.input_clusters_path(), &bootstrap.clusters.0)?;
            write_jsonl(&config.signatures_path(), &bootstrap.signatures)?;
            let mut seen = HashSet::new();
            let publications: Vec<&Publication> = bootstrap
                .signatures
                .iter()
                .filter(|s| seen.insert(s.publication.publication_id))
                .map(|s| s.publication.as_ref())
                .collect();
            write_jsonl(&config.publications_path(), &publications)?;
            println!(
                "fetched {} signatures ({} curated), {} input clusters",
                bootstrap.signatures.len(),
                bootstrap.curated.len(),
                bootstrap.clusters.len()
            );
        }
        Commands::TrainEthnicity => {
            Pipeline::new(&config).train_and_save_ethnicity_model()?;
        }
        Commands::TrainDistance { sampled_pairs_size } => {
            if let Some(size) = sampled_pairs_size {
                config = config.with_sampled_pairs_size(size);
            }
            let curated: Vec<Signature> = read_jsonl(&config.curated_signatures_path())?;
            let clusters: Vec<Cluster> = read_jsonl(&config.input_clusters_path())?;
            Pipeline::new(&config).train_and_save_distance_model(
                &curated,
                &byline::ClusterAssignment(clusters),
            )?;
        }
        Commands::Cluster { n_jobs, output } => {
            if let Some(n_jobs) = n_jobs {
                config = config.with_clustering_n_jobs(n_jobs);
            }
            let signatures: Vec<Signature> = read_jsonl(&config.signatures_path())?;
            let clusters: Vec<Cluster> = read_jsonl(&config.input_clusters_path())?;
            let clusterer = Pipeline::new(&config).train_clustering_model(
                signatures,
                byline::ClusterAssignment(clusters),
            )?;
            clusterer.save_model(&config.clustering_model_path())?;
            let predicted = clusterer.predicted_clusters()?;
            let output = output.unwrap_or_else(|| config.base_path.join("clusters.jsonl"));
            write_jsonl(&output, &predicted.0)?;
            println!("wrote {} clusters to {}", predicted.len(), output.display());
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
