//! Wire contract of the retrieval backend's `/ingest` and `/query` endpoints.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::domain::{DocumentId, QueryMode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestResponse {
    pub ingested: Vec<DocumentId>,
    pub chunks: u64,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Body of `POST /query`. Field names are the wire names; do not rename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    pub mode: QueryMode,
    pub top_k: u32,
    pub semantic: bool,
    pub use_rrf: bool,
    pub evidence_threshold: f64,
    pub evidence_topk: u32,
    pub temperature: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub doc_id: String,
    pub pages: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub heading: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// `error` without `answer` is a logical failure reported with a 2xx status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub citations: Option<Vec<Citation>>,
    #[serde(default)]
    pub meta: Option<Map<String, Value>>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
