//! End-to-end pipeline stage tests: sequencing, artifact preconditions,
//! and parallel clustering consistency.

use byline::ingest::record::{Affiliation, AuthorMention, LiteratureRecord, RecordRef};
use byline::{Config, Error, MemoryIndex, Pipeline};
use std::fs;
use std::path::Path;

const ETHNICITY_CSV: &str = "race,name\n\
    1,Smith John\n\
    1,Jones Mary\n\
    1,Brown James\n\
    2,Tanaka Yuki\n\
    2,Nakamura Ken\n\
    2,Sato Ren\n";

fn mention(uuid: &str, name: &str, block: &str, author_id: Option<u64>) -> AuthorMention {
    AuthorMention {
        uuid: uuid.to_string(),
        full_name: name.to_string(),
        curated_relation: author_id.is_some(),
        record: author_id.map(|id| RecordRef {
            reference: format!("https://inspirehep.net/api/authors/{id}"),
        }),
        signature_block: Some(block.to_string()),
        affiliations: vec![Affiliation {
            value: "CERN".to_string(),
        }],
    }
}

/// Two disjoint blocks: SMITHj with 3 signatures, TANAKAy with 5.
fn fixture_index() -> MemoryIndex {
    let records = vec![
        LiteratureRecord {
            control_number: 1,
            title: "Alpha".to_string(),
            authors: vec![
                mention("s1", "Smith, John", "SMITHj", Some(10)),
                mention("t1", "Tanaka, Yuki", "TANAKAy", Some(20)),
            ],
            keywords: vec!["lattice".to_string()],
            ..Default::default()
        },
        LiteratureRecord {
            control_number: 2,
            title: "Beta".to_string(),
            authors: vec![
                mention("s2", "Smith, John", "SMITHj", Some(10)),
                mention("t2", "Tanaka, Yuki", "TANAKAy", Some(20)),
                mention("t3", "Tanaka, Hiro", "TANAKAy", Some(21)),
            ],
            keywords: vec!["lattice".to_string()],
            ..Default::default()
        },
        LiteratureRecord {
            control_number: 3,
            title: "Gamma".to_string(),
            authors: vec![
                mention("s3", "Smith, J.", "SMITHj", None),
                mention("t4", "Tanaka, Hiro", "TANAKAy", Some(21)),
                mention("t5", "Tanaka, Y.", "TANAKAy", None),
            ],
            keywords: vec!["neutrino".to_string()],
            ..Default::default()
        },
    ];
    MemoryIndex::new(records)
}

fn config_with_dataset(base: &Path) -> Config {
    fs::write(base.join("ethnicity.csv"), ETHNICITY_CSV).unwrap();
    Config::new(base).with_sampled_pairs_size(100)
}

#[test]
fn stages_run_in_dependency_order() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_with_dataset(dir.path());
    let pipeline = Pipeline::new(&config);
    let index = fixture_index();

    pipeline.train_and_save_ethnicity_model().unwrap();
    assert!(config.ethnicity_model_path().exists());

    let bootstrap = pipeline
        .signatures_and_input_clusters(&index, false, None)
        .unwrap();
    assert_eq!(bootstrap.signatures.len(), 8);
    assert_eq!(bootstrap.curated.len(), 6);

    pipeline
        .train_and_save_distance_model(&bootstrap.curated, &bootstrap.clusters)
        .unwrap();
    assert!(config.distance_model_path().exists());

    let clusterer = pipeline
        .train_clustering_model(bootstrap.signatures.clone(), bootstrap.clusters)
        .unwrap();
    let predicted = clusterer.predicted_clusters().unwrap();
    assert_eq!(predicted.signature_count(), 8);
    assert!(predicted.is_partition_of(&bootstrap.signatures));
}

#[test]
fn distance_stage_fails_fast_without_ethnicity_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_with_dataset(dir.path());
    let pipeline = Pipeline::new(&config);
    let index = fixture_index();

    let bootstrap = pipeline
        .signatures_and_input_clusters(&index, false, None)
        .unwrap();

    // No ethnicity model was trained.
    let err = pipeline
        .train_and_save_distance_model(&bootstrap.curated, &bootstrap.clusters)
        .unwrap_err();
    assert!(matches!(err, Error::Model(_)));
    assert!(
        !config.distance_model_path().exists(),
        "no partial distance artifact may be left behind"
    );
}

#[test]
fn clustering_stage_fails_fast_without_distance_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_with_dataset(dir.path());
    let pipeline = Pipeline::new(&config);
    let index = fixture_index();

    pipeline.train_and_save_ethnicity_model().unwrap();
    let bootstrap = pipeline
        .signatures_and_input_clusters(&index, false, None)
        .unwrap();

    let err = pipeline
        .train_clustering_model(bootstrap.signatures, bootstrap.clusters)
        .unwrap_err();
    assert!(matches!(err, Error::Model(_)));
}

#[test]
fn incompatible_artifact_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_with_dataset(dir.path());
    let pipeline = Pipeline::new(&config);
    let index = fixture_index();

    pipeline.train_and_save_ethnicity_model().unwrap();
    // Put the ethnicity artifact where the distance artifact belongs.
    fs::copy(config.ethnicity_model_path(), config.distance_model_path()).unwrap();

    let bootstrap = pipeline
        .signatures_and_input_clusters(&index, false, None)
        .unwrap();
    let err = pipeline
        .train_clustering_model(bootstrap.signatures, bootstrap.clusters)
        .unwrap_err();
    assert!(matches!(err, Error::Model(_)));
}

#[test]
fn two_block_parallel_run_matches_serial() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_with_dataset(dir.path());
    let pipeline = Pipeline::new(&config);
    let index = fixture_index();

    pipeline.train_and_save_ethnicity_model().unwrap();
    let bootstrap = pipeline
        .signatures_and_input_clusters(&index, false, None)
        .unwrap();
    pipeline
        .train_and_save_distance_model(&bootstrap.curated, &bootstrap.clusters)
        .unwrap();

    let serial_config = Config::new(dir.path()).with_clustering_n_jobs(1);
    let parallel_config = Config::new(dir.path()).with_clustering_n_jobs(2);

    let serial = Pipeline::new(&serial_config)
        .train_clustering_model(bootstrap.signatures.clone(), bootstrap.clusters.clone())
        .unwrap();
    let parallel = Pipeline::new(&parallel_config)
        .train_clustering_model(bootstrap.signatures.clone(), bootstrap.clusters)
        .unwrap();

    let serial_clusters = serial.predicted_clusters().unwrap();
    let parallel_clusters = parallel.predicted_clusters().unwrap();
    assert_eq!(parallel_clusters.signature_count(), 8);
    assert_eq!(serial_clusters, parallel_clusters);
}

#[test]
fn rerunning_a_stage_overwrites_its_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_with_dataset(dir.path());
    let pipeline = Pipeline::new(&config);

    pipeline.train_and_save_ethnicity_model().unwrap();
    let first = fs::read_to_string(config.ethnicity_model_path()).unwrap();
    pipeline.train_and_save_ethnicity_model().unwrap();
    let second = fs::read_to_string(config.ethnicity_model_path()).unwrap();
    assert_eq!(first, second);
}
