//! Path resolution and mutation tests
//!
//! Reads and writes addressed as `[shapeId, name, name, ...]` through the operator.
//!
#![recursion_limit = "256"]
mod common;
use common::*;
use jade_graph::prelude::*;
use serde_json::json;

#[cfg(test)]
mod path_tests {
    use super::*;

    fn legacy() -> GraphOperator {
        operator(&legacy_chat_json(), false)
    }

    #[test]
    fn test_missing_leaf_is_created_under_existing_parent() {
        let mut operator = legacy();
        operator.update(&["kr1", "option", "topN"], &json!(5)).unwrap();

        let option = inputs(&operator, "kr1").iter().find(|i| i.has_name("option")).unwrap();
        let top_n = option.child("topN").expect("topN created");
        assert_eq!(top_n.from, Some(FromKind::Input));
        assert_eq!(top_n.data_type, Some(DataType::Number));
        assert_eq!(top_n.raw_value(), Some(&json!(5)));
        assert!(top_n.id().is_some());
        // Siblings are untouched.
        assert_eq!(option.child("topK").and_then(|c| c.raw_value()), Some(&json!(3)));
    }

    #[test]
    fn test_missing_parent_is_an_error() {
        let mut operator = legacy();
        let before = operator.document().clone();
        let err = operator.update(&["kr1", "nope", "topN"], &json!(5)).unwrap_err();
        assert!(matches!(err, GraphError::Path(PathError::MissingParentPath(ref p)) if p == "kr1.nope"));
        assert_eq!(operator.document(), &before);
    }

    #[test]
    fn test_absent_paths_resolve_to_none() {
        let operator = legacy();
        assert!(operator.config(&["kr1", "option", "missing"]).unwrap().is_none());
        assert!(operator.config(&["kr1", "missing", "deeper"]).unwrap().is_none());
    }

    #[test]
    fn test_unknown_shape_and_empty_path_are_invalid() {
        let operator = legacy();
        let empty: [&str; 0] = [];
        assert!(matches!(operator.config(&empty), Err(GraphError::Path(PathError::InvalidPath { .. }))));
        assert!(matches!(operator.config(&["ghost"]), Err(GraphError::Path(PathError::InvalidPath { .. }))));
    }

    #[test]
    fn test_shape_without_root_config_is_corrupt() {
        let graph = json!({"pages": [{"shapes": [{"id": "bare", "type": "llmNodeState"}]}]});
        let operator = operator(&graph.to_string(), false);
        let err = operator.config(&["bare"]).unwrap_err();
        assert!(matches!(err, GraphError::Path(PathError::CorruptShape { ref shape_id, .. }) if shape_id == "bare"));
    }

    #[test]
    fn test_root_path_returns_flattened_inputs() {
        let operator = legacy();
        let view = operator.config(&["llm1"]).unwrap().unwrap();
        assert_eq!(view.value["temperature"], json!(0.7));
        assert_eq!(view.data_type, Some(DataType::Object));
    }

    #[test]
    fn test_object_merge_skips_references() {
        let mut operator = legacy();
        operator
            .update(&["llm1"], &json!({"prompt": "overwritten?", "temperature": 0.2, "maxTokens": 512}))
            .unwrap();

        let llm = inputs(&operator, "llm1");
        let prompt = llm.iter().find(|i| i.has_name("prompt")).unwrap();
        assert!(prompt.is_reference());
        assert_eq!(prompt.reference_node.as_deref(), Some("start"));
        assert_eq!(prompt.raw_value(), Some(&json!(["Question"])));

        let view = operator.config(&["llm1"]).unwrap().unwrap();
        assert_eq!(view.value["temperature"], json!(0.2));
        assert_eq!(view.value["maxTokens"], json!(512));
    }

    #[test]
    fn test_array_write_replaces_children() {
        let mut operator = legacy();
        operator
            .update(&["kr1", "repos"], &json!([{"id": "r1"}, {"id": "r2"}]))
            .unwrap();
        let repos = operator.config(&["kr1", "repos"]).unwrap().unwrap();
        assert_eq!(repos.data_type, Some(DataType::Array));
        assert_eq!(repos.from, Some(FromKind::Expand));
        assert_eq!(repos.value, json!([{"id": "r1"}, {"id": "r2"}]));

        operator.update(&["kr1", "repos"], &json!([{"id": "r3"}, null])).unwrap();
        let repos = operator.config(&["kr1", "repos"]).unwrap().unwrap();
        assert_eq!(repos.value, json!([{"id": "r3"}]));
    }

    #[test]
    fn test_scalar_cannot_replace_a_container() {
        let mut operator = legacy();
        let before = operator.document().clone();
        let err = operator.update(&["kr1", "option"], &json!(5)).unwrap_err();
        assert!(matches!(err, GraphError::Path(PathError::InvalidPath { .. })));
        assert_eq!(operator.document(), &before);

        let err = operator.update(&["kr1"], &json!({"query": 1, "option": "flat"})).unwrap_err();
        assert!(matches!(err, GraphError::Path(PathError::InvalidPath { ref keys, .. }) if keys.ends_with(&["option".to_string()])));
        assert_eq!(operator.document(), &before);
    }

    #[test]
    fn test_reference_keeps_its_shape_on_array_write() {
        let mut operator = legacy();
        let before = operator.document().clone();
        let err = operator
            .update(&["llm1", "prompt"], &json!([{"name": "nested", "value": 1}]))
            .unwrap_err();
        assert!(matches!(err, GraphError::Path(PathError::InvalidPath { .. })));
        assert_eq!(operator.document(), &before);

        let prompt = inputs(&operator, "llm1").iter().find(|i| i.has_name("prompt")).unwrap();
        assert!(prompt.is_reference());
        assert!(prompt.children().is_none());
    }

    #[test]
    fn test_start_inputs_are_addressed_through_flow_meta() {
        let mut operator = legacy();
        operator.update(&["start", "input", "Question"], &json!("why?")).unwrap();
        let view = operator.config(&["start", "input"]).unwrap().unwrap();
        assert_eq!(view.value, json!({"Question": "why?"}));
        assert_eq!(operator.start_node_input_params().len(), 1);
    }

    #[test]
    fn test_unreachable_target_gives_empty_chain() {
        let operator = legacy();
        assert!(operator.nodes_between("start", "orphan").is_empty());
        assert_eq!(operator.nodes_between("start", "end"), vec!["start", "llm1", "kr1", "end"]);
    }
}
