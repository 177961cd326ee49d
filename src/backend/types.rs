use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::session::Entity;

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;

// ============================================================================
// Connection and ingestion
// ============================================================================

/// Request to connect to a graph store (chat profile: `POST /connect`)
#[derive(Debug, Clone, Serialize)]
pub struct ConnectRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_name: Option<String>,
}

/// Request to connect to a graph store (code profile: `POST /neo4j`)
#[derive(Debug, Clone, Serialize)]
pub struct Neo4jRequest {
    pub test_connection: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_name: Option<String>,
}

/// Generic acknowledgement returned by connect, upload and disconnect.
///
/// Backends disagree on the exact shape, so every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Acknowledgement {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub total_nodes: Option<u64>,
    #[serde(default)]
    pub total_relationships: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

impl Acknowledgement {
    /// Best human-readable description of the acknowledgement.
    pub fn describe(&self) -> String {
        self.message
            .clone()
            .or_else(|| self.status.clone())
            .unwrap_or_else(|| "ok".to_string())
    }
}

/// Request to parse a codebase on the backend host (code profile: `POST /parser`)
#[derive(Debug, Clone, Serialize)]
pub struct ParserRequest {
    pub file_path: String,
    pub save_output: bool,
}

/// Parser result
#[derive(Debug, Clone, Deserialize)]
pub struct ParserResponse {
    pub status: String,
    #[serde(default)]
    pub files_analyzed: u64,
    #[serde(default)]
    pub files_skipped: u64,
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Request to store parsed output in the graph (code profile: `POST /store`)
#[derive(Debug, Clone, Serialize)]
pub struct StorageRequest {
    pub json_file_path: String,
    pub verbose: bool,
}

/// Node or relationship type count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeCount {
    #[serde(alias = "type")]
    pub label: String,
    pub count: u64,
}

/// Storage result
#[derive(Debug, Clone, Deserialize)]
pub struct StorageResponse {
    pub status: String,
    #[serde(default)]
    pub total_nodes: u64,
    #[serde(default)]
    pub total_relationships: u64,
    #[serde(default)]
    pub node_types: Vec<TypeCount>,
    #[serde(default)]
    pub relationship_types: Vec<TypeCount>,
    #[serde(default)]
    pub embeddings: Option<EmbeddingStats>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Embedding work done while storing a codebase
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingStats {
    #[serde(default)]
    pub total_embeddings_generated: u64,
    #[serde(default)]
    pub total_tokens_used: u64,
    #[serde(default)]
    pub api_calls_made: u64,
    #[serde(default)]
    pub estimated_cost_usd: f64,
}

/// Outcome of ingesting a document or codebase, whichever profile was used.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub message: String,
    pub files_analyzed: Option<u64>,
    pub total_nodes: Option<u64>,
    pub total_relationships: Option<u64>,
    pub node_types: Vec<TypeCount>,
    pub relationship_types: Vec<TypeCount>,
    pub embeddings: Option<EmbeddingStats>,
}

// ============================================================================
// Queries
// ============================================================================

/// A user question plus optional code-location hints.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub text: String,
    pub current_file: Option<String>,
    pub current_line: Option<u32>,
    pub expand_depth: u32,
}

impl Question {
    /// Create a question with no location hint.
    pub fn new(text: impl Into<String>, expand_depth: u32) -> Self {
        Self {
            text: text.into(),
            current_file: None,
            current_line: None,
            expand_depth,
        }
    }
}

/// Chat profile request (`POST /chat`)
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub query: String,
    pub expand_depth: u32,
}

/// Chat profile response
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    #[serde(default)]
    pub provenance: Option<Value>,
    #[serde(default)]
    pub entities: Option<Vec<Entity>>,
}

/// Code profile request (`POST /query`)
#[derive(Debug, Clone, Serialize)]
pub struct CodeQueryRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_line: Option<u32>,
}

/// Code profile response
#[derive(Debug, Clone, Deserialize)]
pub struct CodeQueryResponse {
    #[serde(default)]
    pub status: String,
    pub response: String,
    #[serde(default)]
    pub contexts: Vec<CodeContext>,
    #[serde(default)]
    pub reasoning: Option<ReasoningData>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Code snippet retrieved for an answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeContext {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub file_path: String,
    #[serde(default)]
    pub line_start: u32,
    #[serde(default)]
    pub line_end: u32,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub relevance_score: f64,
}

/// Explanation of how contexts were retrieved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningData {
    #[serde(default)]
    pub query: String,
    pub summary: RetrievalSummary,
    #[serde(default)]
    pub retrieval_steps: Vec<RetrievalStep>,
}

/// Aggregate numbers over the retrieval steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalSummary {
    #[serde(default)]
    pub total_contexts: u64,
    #[serde(default)]
    pub by_method: BTreeMap<String, u64>,
    #[serde(default)]
    pub total_relationships: u64,
}

/// A single retrieval step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalStep {
    pub context_name: String,
    #[serde(default)]
    pub context_type: String,
    #[serde(default)]
    pub file_path: String,
    #[serde(default)]
    pub line_range: String,
    #[serde(default)]
    pub relevance_score: f64,
    #[serde(default)]
    pub retrieval_method: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub hop_distance: Option<u32>,
}

/// Answer normalized from either backend profile.
#[derive(Debug, Clone, Default)]
pub struct QueryAnswer {
    pub answer: String,
    pub status: Option<String>,
    pub entities: Vec<Entity>,
    pub contexts: Vec<CodeContext>,
    pub reasoning: Option<ReasoningData>,
    pub provenance: Option<Value>,
}

impl From<ChatResponse> for QueryAnswer {
    fn from(response: ChatResponse) -> Self {
        Self {
            answer: response.answer,
            status: None,
            entities: response.entities.unwrap_or_default(),
            contexts: Vec::new(),
            reasoning: None,
            provenance: response.provenance,
        }
    }
}

impl From<CodeQueryResponse> for QueryAnswer {
    fn from(response: CodeQueryResponse) -> Self {
        let mut entities: Vec<Entity> = Vec::new();
        for context in &response.contexts {
            let entity = Entity::new(context.name.as_str());
            if !context.name.is_empty() && !entities.contains(&entity) {
                entities.push(entity);
            }
        }

        Self {
            answer: response.response,
            status: Some(response.status),
            entities,
            contexts: response.contexts,
            reasoning: response.reasoning,
            provenance: None,
        }
    }
}

// ============================================================================
// Aggregation payloads
// ============================================================================

/// Entity context lookup (`POST /entity-context`)
#[derive(Debug, Clone, Serialize)]
pub struct EntityContextRequest {
    pub entity_name: String,
}

/// Context blob for one entity. The backend defines the shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityContext(pub Value);

impl EntityContext {
    /// One-line description: a well-known text field, else compact JSON.
    pub fn summary(&self) -> String {
        const TEXT_FIELDS: [&str; 4] = ["context", "description", "summary", "content"];

        if let Value::Object(map) = &self.0 {
            for field in TEXT_FIELDS {
                if let Some(Value::String(text)) = map.get(field) {
                    return text.clone();
                }
            }
        }
        match &self.0 {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

/// Path search (`POST /find-paths`)
#[derive(Debug, Clone, Serialize)]
pub struct FindPathsRequest {
    pub entity_names: Vec<Entity>,
    pub max_hops: u32,
}

/// Paths between entities
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathSet {
    #[serde(default)]
    pub paths: Vec<Vec<PathNode>>,
}

/// A node on a path.
///
/// Untagged: plain names, records with a `name`, and anything else kept raw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathNode {
    Name(String),
    Record(NodeRecord),
    Unknown(Value),
}

/// Structured path node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub name: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl PathNode {
    /// Display label for the node.
    pub fn label(&self) -> String {
        match self {
            PathNode::Name(name) => name.clone(),
            PathNode::Record(record) => record.name.clone(),
            PathNode::Unknown(value) => value.to_string(),
        }
    }
}

/// Graph overview (`GET /graph-data?limit=N`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphOverview {
    #[serde(default)]
    pub nodes: u64,
    #[serde(default)]
    pub relationships: u64,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Health check (`GET /`)
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
}
