//! Conversions between config trees and plain JSON structures.
//!
//! The presentation layer reads configs as plain keyed values ("structs") and
//! writes plain values back; these helpers translate in both directions.

use super::node::{ConfigNode, ConfigValue, DataType, FromKind};
use crate::ids::IdGenerator;
use serde::Serialize;
use serde_json::{Map, Value};

/// A presentation-friendly projection of a resolved node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigView {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub data_type: Option<DataType>,
    pub from: Option<FromKind>,
    /// The node's value with every `Expand` container flattened.
    pub value: Value,
}

impl ConfigView {
    pub fn of(node: &ConfigNode) -> Self {
        Self {
            id: node.id.clone(),
            name: node.name.clone(),
            data_type: node.data_type.clone(),
            from: node.from.clone(),
            value: to_struct(node),
        }
    }

    /// The projection of a shape's whole input list.
    pub fn of_root(inputs: &[ConfigNode]) -> Self {
        Self {
            id: None,
            name: None,
            data_type: Some(DataType::Object),
            from: Some(FromKind::Expand),
            value: nodes_to_struct(inputs, &DataType::Object),
        }
    }
}

/// Flattens a node into a plain JSON value.
pub fn to_struct(node: &ConfigNode) -> Value {
    match &node.value {
        Some(ConfigValue::Nodes(children)) => {
            let kind = node.data_type.clone().unwrap_or(DataType::Object);
            nodes_to_struct(children, &kind)
        }
        Some(ConfigValue::Raw(raw)) => raw.clone(),
        None => Value::Null,
    }
}

fn nodes_to_struct(children: &[ConfigNode], kind: &DataType) -> Value {
    if *kind == DataType::Array {
        return Value::Array(children.iter().map(to_struct).collect());
    }
    let map: Map<String, Value> = children
        .iter()
        .filter_map(|c| c.name().map(|n| (n.to_string(), to_struct(c))))
        .collect();
    Value::Object(map)
}

/// Converts a plain JSON value into a config node.
///
/// Objects and arrays become `Expand` containers, scalars become `Input`
/// nodes. `null` cannot be typed and yields `None`.
pub fn from_json(name: Option<&str>, value: &Value, ids: &dyn IdGenerator) -> Option<ConfigNode> {
    match value {
        Value::Null => None,
        Value::Object(map) => Some(ConfigNode::expand(
            ids.next_id(),
            name,
            DataType::Object,
            struct_to_config(map, ids),
        )),
        Value::Array(items) => Some(ConfigNode::expand(
            ids.next_id(),
            name,
            DataType::Array,
            items.iter().filter_map(|v| from_json(None, v, ids)).collect(),
        )),
        scalar => Some(ConfigNode {
            id: Some(ids.next_id()),
            name: name.map(str::to_string),
            data_type: Some(DataType::infer(scalar)),
            from: Some(FromKind::Input),
            value: Some(ConfigValue::Raw(scalar.clone())),
            ..Default::default()
        }),
    }
}

/// Converts every key of a plain object into a named config node.
pub fn struct_to_config(map: &Map<String, Value>, ids: &dyn IdGenerator) -> Vec<ConfigNode> {
    map.iter()
        .filter_map(|(k, v)| from_json(Some(k), v, ids))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialGenerator;
    use serde_json::json;

    #[test]
    fn struct_projection_flattens_containers() {
        let ids = SequentialGenerator::default();
        let node = from_json(
            Some("option"),
            &json!({"topK": 3, "rerank": {"enabled": false}, "tags": ["a"]}),
            &ids,
        )
        .unwrap();
        assert_eq!(
            to_struct(&node),
            json!({"topK": 3, "rerank": {"enabled": false}, "tags": ["a"]})
        );
    }

    #[test]
    fn null_elements_are_dropped() {
        let ids = SequentialGenerator::default();
        let node = from_json(Some("list"), &json!([1, null, "x"]), &ids).unwrap();
        assert_eq!(node.children().map(Vec::len), Some(2));
    }
}
