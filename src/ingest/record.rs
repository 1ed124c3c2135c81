//! Wire types for literature records as returned by the search index.
//!
//! These mirror the `_source` shape of the index's record documents,
//! restricted to the fields the disambiguation pipeline fetches.

use serde::{Deserialize, Serialize};

/// An affiliation entry on an author mention.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Affiliation {
    /// Institution name.
    #[serde(default)]
    pub value: String,
}

/// A JSON reference to another record (`{"$ref": "https://.../api/authors/1010819"}`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordRef {
    /// Reference URL; the trailing path segment is the referenced record id.
    #[serde(rename = "$ref", default)]
    pub reference: String,
}

/// One author mention as stored on a literature record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorMention {
    /// Mention uuid.
    #[serde(default)]
    pub uuid: String,
    /// Author full name.
    #[serde(default)]
    pub full_name: String,
    /// Affiliations, first entry is the primary one.
    #[serde(default)]
    pub affiliations: Vec<Affiliation>,
    /// Whether a curator confirmed this mention's author identity.
    #[serde(default)]
    pub curated_relation: bool,
    /// Reference to the curated author record, if any.
    #[serde(default)]
    pub record: Option<RecordRef>,
    /// Coarse name-derived grouping key.
    #[serde(default)]
    pub signature_block: Option<String>,
}

/// A literature record with the fields the pipeline reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LiteratureRecord {
    /// Record control number (publication id).
    pub control_number: u64,
    /// Record title.
    #[serde(default)]
    pub title: String,
    /// Record abstract.
    #[serde(default, rename = "abstract")]
    pub abstract_text: String,
    /// Author mentions in record order.
    #[serde(default)]
    pub authors: Vec<AuthorMention>,
    /// Collaborations.
    #[serde(default)]
    pub collaborations: Vec<String>,
    /// Keywords.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Subject categories.
    #[serde(default)]
    pub categories: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_partial_source_document() {
        let raw = r#"{
            "control_number": 4328,
            "title": "Partial wave analysis",
            "authors": [
                {
                    "uuid": "94fc2b0a",
                    "full_name": "Doe, John",
                    "curated_relation": true,
                    "record": {"$ref": "https://inspirehep.net/api/authors/1010819"},
                    "signature_block": "Dj",
                    "affiliations": [{"value": "CERN"}]
                },
                {
                    "uuid": "83aa1c9d",
                    "full_name": "Roe, Jane"
                }
            ]
        }"#;
        let record: LiteratureRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.control_number, 4328);
        assert_eq!(record.authors.len(), 2);
        let first = &record.authors[0];
        assert!(first.curated_relation);
        assert_eq!(first.affiliations[0].value, "CERN");
        assert_eq!(
            first.record.as_ref().unwrap().reference,
            "https://inspirehep.net/api/authors/1010819"
        );
        let second = &record.authors[1];
        assert!(!second.curated_relation);
        assert!(second.record.is_none());
        assert!(second.signature_block.is_none());
    }
}
