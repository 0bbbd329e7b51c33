//! Graph operator session tests
//!
//! Loading, serializing and querying whole documents.
//!
#![recursion_limit = "256"]
mod common;
use common::*;
use jade_graph::prelude::*;
use serde_json::{Value, json};

#[cfg(test)]
mod operator_tests {
    use super::*;

    #[test]
    fn test_document_round_trips_unchanged() {
        let legacy = legacy_chat_graph();
        let document = GraphDocument::from_value(legacy.clone()).unwrap();
        assert_eq!(document.to_value().unwrap(), legacy);

        let operator = operator(&legacy_chat_json(), false);
        let reparsed: Value = serde_json::from_str(&operator.graph().unwrap()).unwrap();
        assert_eq!(reparsed, legacy);
    }

    #[test]
    fn test_unknown_fields_survive_normalization() {
        let operator = operator(&legacy_chat_json(), true);
        let graph: Value = serde_json::from_str(&operator.graph().unwrap()).unwrap();
        assert_eq!(graph["title"], json!("legacy demo"));
        assert_eq!(graph["pages"][0]["id"], json!("page1"));
        assert_eq!(graph["pages"][0]["shapes"][0]["x"], json!(10));
        assert_eq!(graph["pages"][0]["shapes"][1]["flowMeta"]["jober"]["type"], json!("general_jober"));
    }

    #[test]
    fn test_invalid_json_is_a_document_error() {
        let err = GraphOperator::new("{not json").err().unwrap();
        assert!(matches!(err, GraphError::Document(DocumentError::JsonParseError(_))));
    }

    #[test]
    fn test_forms_to_validate_groups_by_type() {
        let operator = operator(&legacy_chat_json(), false);
        let forms = operator.forms_to_validate();

        let types: Vec<_> = forms.iter().map(|f| f.shape_type.as_str()).collect();
        assert_eq!(types, vec!["llmNodeState", "knowledgeRetrievalNodeState"]);
        assert_eq!(forms[0].node_infos[0].node_id, "llm1");
        assert_eq!(forms[0].node_infos[0].node_name.as_deref(), Some("LLM"));
        assert_eq!(forms[0].node_infos[0].configs[0]["referenceNode"], json!("start"));
        assert_eq!(forms[1].node_infos[0].configs[0]["referenceKey"], json!("llmOutput"));

        let wire = serde_json::to_value(&forms[0]).unwrap();
        assert_eq!(wire["type"], json!("llmNodeState"));
        assert_eq!(wire["nodeInfos"][0]["nodeId"], json!("llm1"));
    }

    #[test]
    fn test_custom_extractor_is_used() {
        struct TextOnly;
        impl ValidationExtractor for TextOnly {
            fn extract(&self, shape: &Shape) -> Vec<Value> {
                shape.text.iter().map(|t| json!(t)).collect()
            }
        }

        let json = legacy_chat_json();
        let operator = GraphOperator::builder(&json)
            .with_extractor(Box::new(TextOnly))
            .build()
            .unwrap();
        let forms = operator.forms_to_validate();
        assert_eq!(forms.len(), 5);
        assert_eq!(forms[0].shape_type, "startNodeStart");
    }

    #[test]
    fn test_shape_queries() {
        let operator = operator(&legacy_chat_json(), false);
        assert_eq!(operator.shape_ids_by_type(&ShapeKind::Llm), vec!["llm1"]);
        assert_eq!(operator.shape_ids_by_type(&ShapeKind::Event), vec!["e1", "e2", "e3"]);
        assert!(operator.shape_ids_by_type(&ShapeKind::Loop).is_empty());
        assert!(operator.shape("missing").is_none());

        let starts = operator.start_node_input_params();
        assert_eq!(starts.len(), 1);
        assert_eq!(starts[0][0].name(), Some("input"));
    }

    #[test]
    fn test_observables_cover_every_output() {
        let operator = operator(&legacy_chat_json(), false);
        let records = operator.observables();
        let ids: Vec<_> = records.iter().map(|r| r.observable_id.as_str()).collect();
        assert_eq!(ids, vec!["out", "text"]);
        assert!(records.iter().all(|r| r.node_id == "llm1"));
        assert_eq!(records[1].data_type, Some(DataType::String));
        assert_eq!(records[1].parent_id.as_deref(), Some("out"));
    }

    #[test]
    fn test_unnormalized_operator_has_no_report() {
        assert!(operator(&legacy_chat_json(), false).compatibility_report().is_none());
        let report = operator(&legacy_chat_json(), true).compatibility_report().cloned().unwrap();
        assert!(report.is_clean());
        assert_eq!(report.processed, 8);
    }

    #[test]
    fn test_null_keys_and_sparse_configs_survive_save() {
        let graph = json!({"pages": [{"shapes": [
            {"id": "llm", "type": "llmNodeState", "runnable": null, "text": null,
             "flowMeta": {"jober": {"converter": {"entity": {
                 "inputParams": [
                     {"id": "q", "name": "query", "type": "String", "from": "Reference",
                      "referenceNode": null, "isRequired": null, "value": null}
                 ],
                 "outputParams": []
             }}}}},
            {"id": "end", "type": "endNodeEnd",
             "flowMeta": {"callback": {"converter": {"entity": {"inputParams": []}}}}},
            {"id": "bare", "type": "replyNodeState",
             "flowMeta": {"jober": {"converter": {"entity": {"outputParams": []}}}}}
        ]}]});
        let operator = operator(&graph.to_string(), false);
        let saved: Value = serde_json::from_str(&operator.graph().unwrap()).unwrap();
        assert_eq!(saved, graph);
    }

    #[test]
    fn test_updates_still_write_over_recorded_nulls() {
        let graph = json!({"pages": [{"shapes": [
            {"id": "llm", "type": "llmNodeState",
             "flowMeta": {"jober": {"converter": {"entity": {
                 "inputParams": [{"id": "t", "name": "temperature", "type": "Number", "from": "Input", "value": null}]
             }}}}}
        ]}]});
        let mut operator = operator(&graph.to_string(), false);
        operator.update(&["llm", "temperature"], &json!(0.3)).unwrap();

        let saved: Value = serde_json::from_str(&operator.graph().unwrap()).unwrap();
        let entity = &saved["pages"][0]["shapes"][0]["flowMeta"]["jober"]["converter"]["entity"];
        assert_eq!(entity["inputParams"][0]["value"], json!(0.3));
        assert!(entity.get("outputParams").is_none());
    }
}
