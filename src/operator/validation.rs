use crate::model::{ConfigNode, Shape};
use ahash::AHashMap;
use itertools::Itertools;
use serde::Serialize;
use serde_json::{Value, json};

/// Pulls the configs that need validating out of one shape.
///
/// An empty result means the shape has nothing to validate and is left out of
/// [`group_by_type`]'s output.
pub trait ValidationExtractor: Send + Sync {
    fn extract(&self, shape: &Shape) -> Vec<Value>;
}

/// Reports every `Reference` node in the shape's root inputs, so the caller
/// can check that each one is still bound to a live upstream output.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceExtractor;

impl ValidationExtractor for ReferenceExtractor {
    fn extract(&self, shape: &Shape) -> Vec<Value> {
        let Some(inputs) = shape.root_inputs() else {
            return Vec::new();
        };
        let mut found = Vec::new();
        collect_references(inputs, &mut found);
        found
            .into_iter()
            .map(|node| {
                json!({
                    "id": node.id,
                    "name": node.name,
                    "referenceNode": node.reference_node,
                    "referenceId": node.reference_id,
                    "referenceKey": node.reference_key,
                })
            })
            .collect_vec()
    }
}

fn collect_references<'a>(nodes: &'a [ConfigNode], found: &mut Vec<&'a ConfigNode>) {
    for node in nodes {
        if node.is_reference() {
            found.push(node);
        } else if let Some(children) = node.children() {
            collect_references(children, found);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeValidation {
    pub node_id: String,
    pub node_name: Option<String>,
    pub configs: Vec<Value>,
}

/// Validation info of every shape of one type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormValidation {
    #[serde(rename = "type")]
    pub shape_type: String,
    pub node_infos: Vec<NodeValidation>,
}

/// Runs `extractor` over `shapes` and groups the non-empty results by shape
/// type, types in first-seen order.
pub fn group_by_type(shapes: &[Shape], extractor: &dyn ValidationExtractor) -> Vec<FormValidation> {
    let mut groups: Vec<FormValidation> = Vec::new();
    let mut by_type: AHashMap<String, usize> = AHashMap::new();

    for shape in shapes {
        let configs = extractor.extract(shape);
        if configs.is_empty() {
            continue;
        }
        let shape_type = shape.kind.to_string();
        let slot = *by_type.entry(shape_type.clone()).or_insert_with(|| {
            groups.push(FormValidation {
                shape_type,
                node_infos: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].node_infos.push(NodeValidation {
            node_id: shape.id.clone(),
            node_name: shape.text.clone(),
            configs,
        });
    }
    groups
}
