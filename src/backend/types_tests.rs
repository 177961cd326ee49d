//! Unit tests for backend wire types.
//!
//! Covers tolerant deserialization of both backend profiles, the
//! normalization into `QueryAnswer`, and the untyped payload fallbacks.

use super::*;
use serde_json::json;

// Query responses
#[test]
fn test_chat_response_without_entities() {
    let response: ChatResponse =
        serde_json::from_value(json!({ "answer": "No graph matches." })).unwrap();
    let answer = QueryAnswer::from(response);
    assert_eq!(answer.answer, "No graph matches.");
    assert!(answer.entities.is_empty());
    assert!(answer.provenance.is_none());
}

#[test]
fn test_chat_response_with_entities_and_provenance() {
    let response: ChatResponse = serde_json::from_value(json!({
        "answer": "parseFile calls Tokenizer.",
        "entities": ["parseFile", "Tokenizer"],
        "provenance": { "sources": ["src/parse.rs"] }
    }))
    .unwrap();
    let answer = QueryAnswer::from(response);
    assert_eq!(
        answer.entities,
        vec![Entity::new("parseFile"), Entity::new("Tokenizer")]
    );
    assert!(answer.provenance.is_some());
}

#[test]
fn test_code_response_derives_distinct_entities_in_order() {
    let response: CodeQueryResponse = serde_json::from_value(json!({
        "status": "success",
        "response": "See Tokenizer.",
        "contexts": [
            { "name": "Tokenizer", "type": "class", "file_path": "lex.py", "line_start": 1, "line_end": 40, "content": "class Tokenizer: ...", "relevance_score": 0.9 },
            { "name": "parse_file", "type": "function", "file_path": "parse.py", "line_start": 3, "line_end": 9, "content": "def parse_file(): ...", "relevance_score": 0.7 },
            { "name": "Tokenizer", "type": "class", "file_path": "lex.py", "line_start": 41, "line_end": 60, "content": "...", "relevance_score": 0.4 }
        ]
    }))
    .unwrap();

    let answer = QueryAnswer::from(response);
    assert_eq!(answer.status.as_deref(), Some("success"));
    assert_eq!(
        answer.entities,
        vec![Entity::new("Tokenizer"), Entity::new("parse_file")]
    );
    assert_eq!(answer.contexts.len(), 3);
    assert_eq!(answer.contexts[1].kind, "function");
}

#[test]
fn test_code_response_with_reasoning() {
    let response: CodeQueryResponse = serde_json::from_value(json!({
        "status": "success",
        "response": "answer",
        "contexts": [],
        "reasoning": {
            "query": "how does parsing work",
            "timestamp": "2024-01-01T00:00:00Z",
            "summary": { "total_contexts": 2, "by_method": { "semantic": 1, "graph": 1 }, "total_relationships": 5 },
            "retrieval_steps": [
                { "context_name": "parse_file", "context_type": "function", "file_path": "parse.py", "line_range": "3-9", "relevance_score": 0.82, "retrieval_method": "semantic", "explanation": "matched 'parse'" }
            ]
        }
    }))
    .unwrap();

    let reasoning = response.reasoning.expect("reasoning present");
    assert_eq!(reasoning.summary.total_contexts, 2);
    assert_eq!(reasoning.summary.by_method.get("graph"), Some(&1));
    assert_eq!(reasoning.retrieval_steps[0].hop_distance, None);
}

#[test]
fn test_code_request_omits_missing_hints() {
    let request = CodeQueryRequest {
        query: "q".to_string(),
        current_file: None,
        current_line: None,
    };
    assert_eq!(serde_json::to_value(&request).unwrap(), json!({ "query": "q" }));
}

// Aggregation payloads
#[test]
fn test_graph_overview_defaults_missing_counts() {
    let overview: GraphOverview = serde_json::from_value(json!({ "data": {} })).unwrap();
    assert_eq!(overview.nodes, 0);
    assert_eq!(overview.relationships, 0);

    let overview: GraphOverview =
        serde_json::from_value(json!({ "nodes": 42, "relationships": 107 })).unwrap();
    assert_eq!(overview.nodes, 42);
    assert_eq!(overview.relationships, 107);
    assert!(overview.data.is_none());
}

#[test]
fn test_path_nodes_accept_names_records_and_unknown() {
    let set: PathSet = serde_json::from_value(json!({
        "paths": [
            ["parseFile", { "name": "Tokenizer", "labels": ["Class"] }, { "id": 7 }]
        ]
    }))
    .unwrap();

    let path = &set.paths[0];
    assert_eq!(path[0], PathNode::Name("parseFile".to_string()));
    assert!(matches!(&path[1], PathNode::Record(r) if r.labels == vec!["Class".to_string()]));
    assert!(matches!(&path[2], PathNode::Unknown(_)));

    let labels: Vec<String> = path.iter().map(PathNode::label).collect();
    assert_eq!(labels, vec!["parseFile", "Tokenizer", "{\"id\":7}"]);
}

#[test]
fn test_entity_context_summary_prefers_text_fields() {
    let ctx = EntityContext(json!({ "name": "X", "description": "a lexer" }));
    assert_eq!(ctx.summary(), "a lexer");

    let ctx = EntityContext(json!("plain text"));
    assert_eq!(ctx.summary(), "plain text");

    let ctx = EntityContext(json!({ "neighbors": 3 }));
    assert_eq!(ctx.summary(), "{\"neighbors\":3}");
}

#[test]
fn test_find_paths_request_shape() {
    let request = FindPathsRequest {
        entity_names: vec!["a".into(), "b".into()],
        max_hops: 3,
    };
    assert_eq!(
        serde_json::to_value(&request).unwrap(),
        json!({ "entity_names": ["a", "b"], "max_hops": 3 })
    );
}

// Acknowledgements
#[test]
fn test_acknowledgement_describe() {
    let ack: Acknowledgement =
        serde_json::from_value(json!({ "status": "connected", "message": "Connected to neo4j" }))
            .unwrap();
    assert_eq!(ack.describe(), "Connected to neo4j");

    let ack: Acknowledgement = serde_json::from_value(json!({ "status": "ok" })).unwrap();
    assert_eq!(ack.describe(), "ok");

    assert_eq!(Acknowledgement::default().describe(), "ok");
}

#[test]
fn test_type_count_accepts_type_alias() {
    let count: TypeCount = serde_json::from_value(json!({ "type": "CALLS", "count": 9 })).unwrap();
    assert_eq!(count.label, "CALLS");
}
