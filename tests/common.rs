//! Common test utilities for building graph documents and operators.
#![recursion_limit = "256"]
use jade_graph::prelude::*;
use serde_json::{Value, json};
use std::sync::Arc;

/// A chat-flow graph as an older editor saved it.
///
/// `start -> llm1 -> kr1 -> end`, plus a dangling `orphan` shape. The end node
/// still has a flat primary output and `llm1` lacks every input added since.
#[allow(dead_code)]
pub fn legacy_chat_graph() -> Value {
    json!({
        "flowType": "chatflow",
        "title": "legacy demo",
        "pages": [{
            "id": "page1",
            "shapes": [
                {
                    "id": "start", "type": "startNodeStart", "text": "Start", "x": 10, "y": 20,
                    "flowMeta": {"inputParams": [
                        {"id": "in", "name": "input", "type": "Object", "from": "Expand", "value": [
                            {"id": "q", "name": "Question", "type": "String", "from": "Input", "value": ""}
                        ]}
                    ]}
                },
                {
                    "id": "llm1", "type": "llmNodeState", "text": "LLM",
                    "flowMeta": {"jober": {
                        "type": "general_jober",
                        "converter": {"type": "mapping_converter", "entity": {
                            "inputParams": [
                                {"id": "prompt", "name": "prompt", "type": "String", "from": "Reference",
                                 "referenceNode": "start", "referenceId": "q", "referenceKey": "Question", "value": ["Question"]},
                                {"id": "temp", "name": "temperature", "type": "Number", "from": "Input", "value": 0.7}
                            ],
                            "outputParams": [
                                {"id": "out", "name": "output", "type": "Object", "from": "Expand", "value": [
                                    {"id": "text", "name": "llmOutput", "type": "String", "from": "Input", "value": ""}
                                ]}
                            ]
                        }}
                    }}
                },
                {
                    "id": "kr1", "type": "knowledgeRetrievalNodeState", "text": "Knowledge",
                    "flowMeta": {"jober": {
                        "entity": {"params": [{"name": "query"}, {"name": "userId"}]},
                        "converter": {"type": "mapping_converter", "entity": {
                            "inputParams": [
                                {"id": "query", "name": "query", "type": "String", "from": "Reference",
                                 "referenceNode": "llm1", "referenceId": "text", "referenceKey": "llmOutput", "value": []},
                                {"id": "user", "name": "userId", "type": "String", "from": "Input", "value": ""},
                                {"id": "opt", "name": "option", "type": "Object", "from": "Expand", "value": [
                                    {"id": "topK", "name": "topK", "type": "Integer", "from": "Input", "value": 3},
                                    {"id": "rr", "name": "rerankParam", "type": "Object", "from": "Expand", "value": [
                                        {"id": "enable", "name": "enableRerank", "type": "Boolean", "from": "Input", "value": false}
                                    ]}
                                ]}
                            ],
                            "outputParams": []
                        }}
                    }}
                },
                {
                    "id": "end", "type": "endNodeEnd", "text": "End",
                    "flowMeta": {"callback": {"converter": {"type": "mapping_converter", "entity": {
                        "inputParams": [
                            {"id": "final", "name": "finalOutput", "type": "String", "from": "Input", "value": "hi"}
                        ],
                        "outputParams": []
                    }}}}
                },
                {"id": "orphan", "type": "replyNodeState", "text": "Reply", "flowMeta": {"jober": {"converter": {"entity": {
                    "inputParams": [], "outputParams": []
                }}}}},
                {"id": "e1", "type": "jadeEvent", "fromShape": "start", "toShape": "llm1"},
                {"id": "e2", "type": "jadeEvent", "fromShape": "llm1", "toShape": "kr1"},
                {"id": "e3", "type": "jadeEvent", "fromShape": "kr1", "toShape": "end"}
            ]
        }]
    })
}

#[allow(dead_code)]
pub fn legacy_chat_json() -> String {
    legacy_chat_graph().to_string()
}

/// An operator over `json` with deterministic ids.
#[allow(dead_code)]
pub fn operator(json: &str, normalize: bool) -> GraphOperator {
    GraphOperator::builder(json)
        .with_ids(Arc::new(SequentialGenerator::new("t")))
        .normalize(normalize)
        .build()
        .expect("Failed to load graph")
}

/// The input list the path resolver starts from for `shape_id`.
#[allow(dead_code)]
pub fn inputs<'a>(operator: &'a GraphOperator, shape_id: &str) -> &'a Vec<ConfigNode> {
    operator
        .shape(shape_id)
        .and_then(Shape::root_inputs)
        .expect("shape has no root inputs")
}
