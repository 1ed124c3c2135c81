//! Search index read contract and implementations.
//!
//! The pipeline reads literature records through [`LiteratureIndex`], a
//! pull-based paged scan. Two implementations are provided:
//!
//! - [`EsIndex`]: an Elasticsearch-style HTTP endpoint, paging with the
//!   scroll API. Read failures are fatal; retry/backoff belongs to the
//!   transport, not this layer.
//! - [`MemoryIndex`]: an in-process record store for tests and offline runs.

use crate::ingest::record::LiteratureRecord;
use crate::{Config, Error, Result};
use serde_json::{json, Value};
use std::time::Duration;

/// Filter for a signature scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureQuery {
    /// Only return records with a mention in this signature block.
    pub signature_block: Option<String>,
    /// Only return records with a curated mention.
    pub only_curated: bool,
}

impl SignatureQuery {
    /// Match every record that carries author mentions.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to one signature block.
    #[must_use]
    pub fn with_block(mut self, block: impl Into<String>) -> Self {
        self.signature_block = Some(block.into());
        self
    }

    /// Restrict to records with curated mentions.
    #[must_use]
    pub fn curated_only(mut self) -> Self {
        self.only_curated = true;
        self
    }
}

/// Read contract over the backing literature index.
///
/// `scan` materializes the full matching result set; implementations page
/// internally. It may return an empty vec and never errors on "no matches".
pub trait LiteratureIndex {
    /// Return all records matching `query`.
    fn scan(&self, query: &SignatureQuery) -> Result<Vec<LiteratureRecord>>;
}

// =============================================================================
// Elasticsearch-backed implementation
// =============================================================================

const SOURCE_FIELDS: &[&str] = &[
    "authors.affiliations.value",
    "authors.curated_relation",
    "authors.full_name",
    "authors.record",
    "authors.signature_block",
    "authors.uuid",
    "control_number",
    "title",
    "abstract",
    "collaborations",
    "keywords",
    "categories",
];

/// Elasticsearch-style index client.
pub struct EsIndex {
    agent: ureq::Agent,
    base_url: String,
    index: String,
    page_size: usize,
}

impl EsIndex {
    /// Build a client from the run configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.es_timeout_secs))
            .build();
        Self {
            agent,
            base_url: format!("http://{}", config.es_hostname),
            index: "records-hep".to_string(),
            page_size: config.es_max_query_size,
        }
    }

    /// Override the index name (default `records-hep`).
    #[must_use]
    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = index.into();
        self
    }

    /// Build the nested-author bool query for `query`.
    fn build_query(&self, query: &SignatureQuery) -> Value {
        let mut must = Vec::new();
        if query.only_curated {
            must.push(json!({"term": {"authors.curated_relation": true}}));
        }
        if let Some(block) = &query.signature_block {
            must.push(json!({"term": {"authors.signature_block.raw": block}}));
        }
        json!({
            "size": self.page_size,
            "_source": SOURCE_FIELDS,
            "query": {
                "nested": {
                    "path": "authors",
                    "query": {"bool": {"must": must}}
                }
            }
        })
    }

    fn post(&self, url: &str, body: Value) -> Result<Value> {
        let response = self
            .agent
            .post(url)
            .send_json(body)
            .map_err(|e| Error::index(format!("query to {url} failed: {e}")))?;
        if response.status() != 200 {
            return Err(Error::index(format!(
                "HTTP {} from {url}",
                response.status()
            )));
        }
        response
            .into_json()
            .map_err(|e| Error::index(format!("malformed response from {url}: {e}")))
    }

    /// Pull one page's records out of a search/scroll response body.
    fn parse_hits(body: &Value) -> Result<Vec<LiteratureRecord>> {
        let hits = body
            .pointer("/hits/hits")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::index("response missing hits.hits"))?;
        hits.iter()
            .map(|hit| {
                let source = hit
                    .get("_source")
                    .ok_or_else(|| Error::index("hit missing _source"))?;
                serde_json::from_value(source.clone())
                    .map_err(|e| Error::index(format!("malformed record: {e}")))
            })
            .collect()
    }
}

impl LiteratureIndex for EsIndex {
    fn scan(&self, query: &SignatureQuery) -> Result<Vec<LiteratureRecord>> {
        let search_url = format!("{}/{}/_search?scroll=5m", self.base_url, self.index);
        let mut body = self.post(&search_url, self.build_query(query))?;
        let mut records = Vec::new();

        loop {
            let page = Self::parse_hits(&body)?;
            if page.is_empty() {
                break;
            }
            log::debug!("index scan: page of {} records", page.len());
            records.extend(page);

            let scroll_id = body
                .get("_scroll_id")
                .and_then(Value::as_str)
                .ok_or_else(|| Error::index("response missing _scroll_id"))?
                .to_string();
            let scroll_url = format!("{}/_search/scroll", self.base_url);
            body = self.post(
                &scroll_url,
                json!({"scroll": "5m", "scroll_id": scroll_id}),
            )?;
        }

        // Release the server-side scroll context rather than letting it
        // linger until its timeout; a failed release is not a scan failure.
        if let Some(scroll_id) = body.get("_scroll_id").and_then(Value::as_str) {
            let scroll_url = format!("{}/_search/scroll", self.base_url);
            if let Err(e) = self
                .agent
                .delete(&scroll_url)
                .send_json(json!({"scroll_id": scroll_id}))
            {
                log::debug!("failed to clear scroll context: {e}");
            }
        }

        log::info!("index scan: {} records total", records.len());
        Ok(records)
    }
}

// =============================================================================
// In-memory implementation
// =============================================================================

/// In-process literature index, used by tests and offline runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryIndex {
    records: Vec<LiteratureRecord>,
}

impl MemoryIndex {
    /// Build an index over the given records.
    #[must_use]
    pub fn new(records: Vec<LiteratureRecord>) -> Self {
        Self { records }
    }
}

impl LiteratureIndex for MemoryIndex {
    fn scan(&self, query: &SignatureQuery) -> Result<Vec<LiteratureRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|record| {
                record.authors.iter().any(|author| {
                    let curated_ok = !query.only_curated || author.curated_relation;
                    let block_ok = query
                        .signature_block
                        .as_deref()
                        .map_or(true, |b| author.signature_block.as_deref() == Some(b));
                    curated_ok && block_ok
                })
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::record::AuthorMention;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    /// One-connection-per-request HTTP stub that reports each request line.
    fn serve(bodies: Vec<String>) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for body in bodies {
                let (stream, _) = match listener.accept() {
                    Ok(s) => s,
                    Err(_) => return,
                };
                let mut reader = BufReader::new(stream);
                let mut request_line = String::new();
                if reader.read_line(&mut request_line).is_err() {
                    return;
                }
                let mut content_length = 0usize;
                loop {
                    let mut line = String::new();
                    if reader.read_line(&mut line).is_err() {
                        return;
                    }
                    if line.trim().is_empty() {
                        break;
                    }
                    let lower = line.to_ascii_lowercase();
                    if let Some(value) = lower.strip_prefix("content-length:") {
                        content_length = value.trim().parse().unwrap_or(0);
                    }
                }
                let mut payload = vec![0u8; content_length];
                if reader.read_exact(&mut payload).is_err() {
                    return;
                }
                let _ = tx.send(request_line.trim().to_string());
                let mut stream = reader.into_inner();
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        (format!("127.0.0.1:{}", addr.port()), rx)
    }

    fn record_with_block(id: u64, block: &str, curated: bool) -> LiteratureRecord {
        LiteratureRecord {
            control_number: id,
            authors: vec![AuthorMention {
                uuid: format!("uuid-{id}"),
                full_name: "Doe, J.".to_string(),
                curated_relation: curated,
                signature_block: Some(block.to_string()),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn memory_index_filters_by_block() {
        let index = MemoryIndex::new(vec![
            record_with_block(1, "DOEj", false),
            record_with_block(2, "ROEj", false),
        ]);
        let hits = index
            .scan(&SignatureQuery::all().with_block("DOEj"))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].control_number, 1);
    }

    #[test]
    fn memory_index_filters_by_curated() {
        let index = MemoryIndex::new(vec![
            record_with_block(1, "DOEj", true),
            record_with_block(2, "DOEj", false),
        ]);
        let hits = index.scan(&SignatureQuery::all().curated_only()).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].control_number, 1);
    }

    #[test]
    fn memory_index_without_filter_returns_all() {
        let index = MemoryIndex::new(vec![
            record_with_block(1, "DOEj", true),
            record_with_block(2, "ROEj", false),
        ]);
        assert_eq!(index.scan(&SignatureQuery::all()).unwrap().len(), 2);
    }

    #[test]
    fn es_query_shape_includes_filters() {
        let config = Config::new(".").with_es_hostname("localhost:9200");
        let index = EsIndex::new(&config);
        let body = index.build_query(
            &SignatureQuery::all().with_block("DOEj").curated_only(),
        );
        let must = body
            .pointer("/query/nested/query/bool/must")
            .and_then(Value::as_array)
            .unwrap();
        assert_eq!(must.len(), 2);
        assert_eq!(body["size"], 999);
    }

    #[test]
    fn scan_pages_and_clears_scroll_context() {
        let page = json!({
            "_scroll_id": "cursor-1",
            "hits": {"hits": [{"_source": {"control_number": 1}}]}
        });
        let last_page = json!({"_scroll_id": "cursor-1", "hits": {"hits": []}});
        let cleared = json!({"succeeded": true});
        let (hostname, requests) = serve(vec![
            page.to_string(),
            last_page.to_string(),
            cleared.to_string(),
        ]);

        let config = Config::new(".").with_es_hostname(hostname);
        let records = EsIndex::new(&config).scan(&SignatureQuery::all()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].control_number, 1);

        let mut lines = Vec::new();
        for _ in 0..3 {
            lines.push(requests.recv_timeout(Duration::from_secs(10)).unwrap());
        }
        assert!(lines[0].starts_with("POST /records-hep/_search"));
        assert!(lines[1].starts_with("POST /_search/scroll"));
        assert!(lines[2].starts_with("DELETE /_search/scroll"));
    }

    #[test]
    fn parse_hits_rejects_malformed_body() {
        assert!(EsIndex::parse_hits(&json!({"took": 3})).is_err());
        let empty = json!({"hits": {"hits": []}});
        assert!(EsIndex::parse_hits(&empty).unwrap().is_empty());
    }
}
