//! Ingestion filtering over an in-memory index.

use byline::ingest::record::{Affiliation, AuthorMention, LiteratureRecord, RecordRef};
use byline::ingest::{get_curated_signatures, get_signatures, singleton_clusters, MemoryIndex};

fn mention(uuid: &str, block: &str, curated_ref: Option<&str>) -> AuthorMention {
    AuthorMention {
        uuid: uuid.to_string(),
        full_name: "Doe, John".to_string(),
        curated_relation: curated_ref.is_some(),
        record: curated_ref.map(|r| RecordRef {
            reference: r.to_string(),
        }),
        signature_block: Some(block.to_string()),
        affiliations: vec![Affiliation {
            value: "CERN".to_string(),
        }],
    }
}

fn fixture() -> MemoryIndex {
    MemoryIndex::new(vec![
        LiteratureRecord {
            control_number: 1,
            title: "First".to_string(),
            authors: vec![
                mention("u1", "DOEj", Some("https://inspirehep.net/api/authors/10")),
                mention("u2", "ROEj", None),
            ],
            ..Default::default()
        },
        LiteratureRecord {
            control_number: 2,
            title: "Second".to_string(),
            authors: vec![mention("u3", "DOEj", None)],
            ..Default::default()
        },
    ])
}

#[test]
fn block_filter_returns_only_matching_signatures() {
    let index = fixture();
    let signatures = get_signatures(&index, Some("DOEj")).unwrap();
    let uuids: Vec<&str> = signatures.iter().map(|s| s.signature_uuid.as_str()).collect();
    assert_eq!(uuids, vec!["u1", "u3"]);
    assert!(signatures.iter().all(|s| s.signature_block == "DOEj"));
}

#[test]
fn no_filter_returns_all_signatures() {
    let index = fixture();
    let signatures = get_signatures(&index, None).unwrap();
    assert_eq!(signatures.len(), 3);
}

#[test]
fn curated_scan_returns_resolved_curated_only() {
    let index = fixture();
    let curated = get_curated_signatures(&index, None).unwrap();
    assert_eq!(curated.len(), 1);
    assert_eq!(curated[0].signature_uuid, "u1");
    assert_eq!(curated[0].author_id, Some(10));
}

#[test]
fn unknown_block_yields_empty_not_error() {
    let index = fixture();
    assert!(get_signatures(&index, Some("NOPEx")).unwrap().is_empty());
}

#[test]
fn singleton_assignment_covers_every_signature() {
    let index = fixture();
    let signatures = get_signatures(&index, None).unwrap();
    let clusters = singleton_clusters(&signatures);
    assert_eq!(clusters.len(), signatures.len());
    assert!(clusters.is_partition_of(&signatures));
    assert_eq!(clusters.iter().next().unwrap().author_id, Some(10));
}
