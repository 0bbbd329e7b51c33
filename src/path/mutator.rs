//! Path-addressed writes into a shape's root config.

use super::{ShapeIndex, container_mut};
use crate::error::PathError;
use crate::ids::IdGenerator;
use crate::model::{ConfigNode, ConfigValue, DataType, FromKind, Shape, find_named_mut, from_json};
use serde_json::{Map, Value};

/// Applies `update(keys, value)` writes to config trees.
///
/// Every node the mutator creates gets a fresh id from the supplied generator;
/// existing ids are never touched.
pub struct ConfigMutator<'a> {
    ids: &'a dyn IdGenerator,
}

impl<'a> ConfigMutator<'a> {
    pub fn new(ids: &'a dyn IdGenerator) -> Self {
        Self { ids }
    }

    /// Writes `value` at `keys` inside the addressed shape.
    ///
    /// All failure checks run before anything is changed, so an `Err` leaves
    /// the shape untouched.
    pub fn update(
        &self,
        shapes: &mut [Shape],
        index: &ShapeIndex,
        keys: &[String],
        value: &Value,
    ) -> Result<(), PathError> {
        let (shape_id, names) = keys
            .split_first()
            .ok_or_else(|| PathError::invalid(keys, "path cannot be empty"))?;
        let shape = index
            .get(shape_id)
            .and_then(|&i| shapes.get_mut(i))
            .ok_or_else(|| PathError::invalid(keys, format!("unknown shape '{}'", shape_id)))?;
        let location = shape.root_location();
        let inputs = shape.root_inputs_mut().ok_or_else(|| PathError::CorruptShape {
            shape_id: shape_id.clone(),
            location: location.to_string(),
        })?;

        let Some((leaf, parent_names)) = names.split_last() else {
            return self.update_root(inputs, keys, value);
        };

        let siblings = container_mut(inputs, parent_names)
            .ok_or_else(|| PathError::MissingParentPath(keys[..keys.len() - 1].join(".")))?;

        if let Some(node) = find_named_mut(siblings, leaf) {
            check_assign(node, value, keys)?;
        }

        tracing::debug!(?keys, "updating config");
        match find_named_mut(siblings, leaf) {
            Some(node) => self.apply(node, value),
            None => {
                let mut node = self.new_leaf(leaf, value);
                self.apply(&mut node, value);
                siblings.push(node);
            }
        }
        Ok(())
    }

    fn update_root(
        &self,
        inputs: &mut Vec<ConfigNode>,
        keys: &[String],
        value: &Value,
    ) -> Result<(), PathError> {
        match value {
            Value::Array(items) => {
                *inputs = self.convert_items(items);
                Ok(())
            }
            Value::Object(map) => {
                check_merge(inputs, map, keys)?;
                self.apply_merge(inputs, map);
                Ok(())
            }
            _ => Err(PathError::invalid(keys, "a root config cannot hold a scalar")),
        }
    }

    /// Type-dispatched assignment of `value` into an existing node.
    ///
    /// A scalar cannot replace a container and a reference only takes
    /// scalars; either write fails before `node` is changed.
    pub fn assign(&self, node: &mut ConfigNode, value: &Value) -> Result<(), PathError> {
        let at: Vec<String> = node.name().map(str::to_string).into_iter().collect();
        check_assign(node, value, &at)?;
        self.apply(node, value);
        Ok(())
    }

    /// Merges a keyed structure into a sibling list. `Reference` children are
    /// left as they are.
    pub fn merge(&self, children: &mut Vec<ConfigNode>, map: &Map<String, Value>) -> Result<(), PathError> {
        check_merge(children, map, &[])?;
        self.apply_merge(children, map);
        Ok(())
    }

    fn apply(&self, node: &mut ConfigNode, value: &Value) {
        match value {
            Value::Array(items) => {
                node.value = Some(ConfigValue::Nodes(self.convert_items(items)));
            }
            Value::Object(map) => {
                if node.children().is_none() {
                    tracing::warn!(node = ?node.id, "coercing scalar leaf into an object container");
                    node.data_type = Some(DataType::Object);
                    node.from = Some(FromKind::Expand);
                    node.value = Some(ConfigValue::Nodes(Vec::new()));
                }
                if let Some(children) = node.children_mut() {
                    self.apply_merge(children, map);
                }
            }
            scalar => node.value = Some(ConfigValue::Raw(scalar.clone())),
        }
    }

    fn apply_merge(&self, children: &mut Vec<ConfigNode>, map: &Map<String, Value>) {
        for (key, value) in map {
            match find_named_mut(children, key) {
                Some(child) if child.is_reference() => {
                    tracing::debug!(key = %key, "skipping reference child during merge");
                }
                Some(child) => self.apply(child, value),
                None => {
                    let mut child = self.new_leaf(key, value);
                    self.apply(&mut child, value);
                    children.push(child);
                }
            }
        }
    }

    fn new_leaf(&self, name: &str, value: &Value) -> ConfigNode {
        let data_type = DataType::infer(value);
        if data_type.is_container() {
            ConfigNode::expand(self.ids.next_id(), Some(name), data_type, Vec::new())
        } else {
            ConfigNode::input(self.ids.next_id(), name, data_type, value.clone())
        }
    }

    fn convert_items(&self, items: &[Value]) -> Vec<ConfigNode> {
        items.iter().filter_map(|v| from_json(None, v, self.ids)).collect()
    }
}

/// Rejects writes that would change what kind of node `node` is.
fn check_assign(node: &ConfigNode, value: &Value, at: &[String]) -> Result<(), PathError> {
    match value {
        Value::Array(_) | Value::Object(_) if node.is_reference() => Err(PathError::invalid(
            at,
            "a reference only takes a scalar value",
        )),
        Value::Object(map) => match node.children() {
            Some(children) => check_merge(children, map, at),
            None => Ok(()),
        },
        Value::Array(_) => Ok(()),
        _ if node.is_expand() || node.children().is_some() => Err(PathError::invalid(
            at,
            "a container cannot be overwritten by a scalar",
        )),
        _ => Ok(()),
    }
}

fn check_merge(children: &[ConfigNode], map: &Map<String, Value>, at: &[String]) -> Result<(), PathError> {
    for (key, value) in map {
        if let Some(child) = children.iter().find(|c| c.has_name(key)) {
            if child.is_reference() {
                continue;
            }
            let mut path = at.to_vec();
            path.push(key.clone());
            check_assign(child, value, &path)?;
        }
    }
    Ok(())
}
