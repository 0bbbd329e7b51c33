//! Helpers shared by component reducers.

use super::{ActionKind, FieldChange};
use crate::error::ReduceError;
use crate::model::ConfigNode;

/// Returns a copy of `params` where the node with `id`, at any depth, has
/// every change applied as a top-level field assignment.
pub fn update_input(
    params: &[ConfigNode],
    id: &str,
    changes: &[FieldChange],
    kind: ActionKind,
) -> Result<Vec<ConfigNode>, ReduceError> {
    let mut updated = params.to_vec();
    if let Some(node) = find_by_id_mut(&mut updated, id) {
        apply_changes(node, changes, kind)?;
    } else {
        tracing::debug!(id, action = %kind, "no node with this id; config unchanged");
    }
    Ok(updated)
}

/// Assigns each change to the node's field of the same name.
pub fn apply_changes(node: &mut ConfigNode, changes: &[FieldChange], kind: ActionKind) -> Result<(), ReduceError> {
    for change in changes {
        node.set_field(&change.key, change.value.clone())
            .map_err(|e| ReduceError::InvalidPayload {
                kind: kind.to_string(),
                message: format!("field '{}': {}", change.key, e),
            })?;
    }
    Ok(())
}

/// Depth-first search for a node by id.
pub fn find_by_id_mut<'a>(nodes: &'a mut [ConfigNode], id: &str) -> Option<&'a mut ConfigNode> {
    for node in nodes.iter_mut() {
        if node.id() == Some(id) {
            return Some(node);
        }
        if let Some(found) = node.children_mut().and_then(|c| find_by_id_mut(c, id)) {
            return Some(found);
        }
    }
    None
}

/// Read-only counterpart of [`find_by_id_mut`].
pub fn find_by_id<'a>(nodes: &'a [ConfigNode], id: &str) -> Option<&'a ConfigNode> {
    nodes.iter().find_map(|node| {
        if node.id() == Some(id) {
            Some(node)
        } else {
            node.children().and_then(|c| find_by_id(c, id))
        }
    })
}

/// The reducer's view of an input that must exist in the config.
pub(crate) fn require<'a>(nodes: &'a [ConfigNode], name: &str) -> Result<&'a ConfigNode, ReduceError> {
    crate::model::find_named(nodes, name)
        .ok_or_else(|| ReduceError::InvalidConfig(format!("config has no '{}' parameter", name)))
}

pub(crate) fn require_mut<'a>(nodes: &'a mut [ConfigNode], name: &str) -> Result<&'a mut ConfigNode, ReduceError> {
    crate::model::find_named_mut(nodes, name)
        .ok_or_else(|| ReduceError::InvalidConfig(format!("config has no '{}' parameter", name)))
}

/// The child list of a container node that must exist.
pub(crate) fn children_of_mut<'a>(node: &'a mut ConfigNode) -> Result<&'a mut Vec<ConfigNode>, ReduceError> {
    let name = node.name.clone().unwrap_or_default();
    node.children_mut()
        .ok_or_else(|| ReduceError::InvalidConfig(format!("'{}' is not a container", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DataType;
    use serde_json::json;

    #[test]
    fn update_input_reaches_nested_nodes_and_leaves_original() {
        let params = vec![ConfigNode::expand(
            "outer".into(),
            Some("args"),
            DataType::Object,
            vec![ConfigNode::input("inner".into(), "a", DataType::String, json!(""))],
        )];
        let updated = update_input(
            &params,
            "inner",
            &[FieldChange::new("value", json!("x"))],
            ActionKind::Update,
        )
        .unwrap();
        assert_eq!(find_by_id(&updated, "inner").and_then(|n| n.raw_value()), Some(&json!("x")));
        assert_eq!(find_by_id(&params, "inner").and_then(|n| n.raw_value()), Some(&json!("")));
    }
}
