//! Signature ingestion from the backing literature index.
//!
//! Reading is a sequential paged scan; the full result set is materialized
//! before any downstream stage runs. Index failures propagate to the caller.

pub mod index;
pub mod record;
pub mod reader;

pub use index::{EsIndex, LiteratureIndex, MemoryIndex, SignatureQuery};
pub use reader::{
    get_curated_signatures, get_signatures, query_signatures, recid_from_ref, singleton_clusters,
};
