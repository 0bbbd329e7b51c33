use super::Component;
use crate::error::ReduceError;
use crate::ids::{IdGenerator, UuidGenerator};
use crate::model::{ConfigNode, DataType, RootConfig};
use crate::reducer::util::children_of_mut;
use crate::reducer::{Action, ActionKind, ReducerRegistry, define_reducers, mismatched};
use serde_json::{Map, Value, json};
use std::sync::Arc;

pub const UPDATE_VARIABLES: &str = "updateVariables";

/// One `{key, value}` variable assignment entry.
pub fn default_variable(ids: &dyn IdGenerator) -> ConfigNode {
    let mut key = ConfigNode::input(ids.next_id(), "key", DataType::Array, json!([]));
    key.reference_node = Some(String::new());
    key.reference_id = Some(String::new());
    key.reference_key = Some(String::new());
    key.extra.insert("dataType".to_string(), json!(""));

    let value = ConfigNode::reference(ids.next_id(), Some("value"), DataType::Other(String::new()));

    ConfigNode::expand(ids.next_id(), None, DataType::Object, vec![key, value])
}

pub struct VariableUpdaterComponent {
    existing: Option<RootConfig>,
    registry: ReducerRegistry<RootConfig>,
    ids: Arc<dyn IdGenerator>,
}

impl VariableUpdaterComponent {
    pub fn new(existing: Option<RootConfig>) -> Self {
        Self::with_ids(existing, Arc::new(UuidGenerator))
    }

    pub fn with_ids(existing: Option<RootConfig>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            existing,
            registry: ReducerRegistry::from_builtin(builtin_reducers()),
            ids,
        }
    }
}

impl Component for VariableUpdaterComponent {
    type Config = RootConfig;

    fn name(&self) -> &str {
        "variableUpdaterComponent"
    }

    fn default_config(&self) -> RootConfig {
        let ids = self.ids();
        RootConfig::new(
            vec![ConfigNode::expand(
                format!("variables_{}", ids.next_id()),
                Some(UPDATE_VARIABLES),
                DataType::Array,
                vec![default_variable(ids)],
            )],
            Vec::new(),
        )
    }

    fn existing_config(&self) -> Option<&RootConfig> {
        self.existing.as_ref()
    }

    fn registry(&self) -> &ReducerRegistry<RootConfig> {
        &self.registry
    }

    fn ids(&self) -> &dyn IdGenerator {
        self.ids.as_ref()
    }
}

define_reducers! {
    RootConfig;
    AddVariableReducer => AddVariable: add_variable,
    UpdateVariableReducer => UpdateVariable: update_variable,
    DeleteVariableReducer => DeleteVariable: delete_variable,
}

/// The variable list is the config's first input.
fn variables_mut(config: &mut RootConfig) -> Result<&mut Vec<ConfigNode>, ReduceError> {
    let first = config
        .input_params
        .first_mut()
        .ok_or_else(|| ReduceError::InvalidConfig("variable updater has no inputs".to_string()))?;
    children_of_mut(first)
}

fn add_variable(config: &RootConfig, action: &Action, ids: &dyn IdGenerator) -> Result<RootConfig, ReduceError> {
    let Action::AddVariable { id } = action else {
        return Err(mismatched(action, ActionKind::AddVariable));
    };
    let mut variable = default_variable(ids);
    variable.id = Some(id.clone());
    let mut next = config.clone();
    variables_mut(&mut next)?.push(variable);
    Ok(next)
}

fn update_variable(config: &RootConfig, action: &Action, _: &dyn IdGenerator) -> Result<RootConfig, ReduceError> {
    let Action::UpdateVariable { data } = action else {
        return Err(mismatched(action, ActionKind::UpdateVariable));
    };
    let mut next = config.clone();
    let item = variables_mut(&mut next)?
        .iter_mut()
        .find(|v| v.id() == Some(data.id.as_str()))
        .and_then(|v| v.child_mut(&data.key));
    let Some(item) = item else {
        return Ok(next);
    };

    // Only fields the entry already carries can be updated.
    let mut fields = match serde_json::to_value(&*item) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    for update in &data.updates {
        if !update.key.is_empty() && fields.contains_key(&update.key) {
            fields.insert(update.key.clone(), update.value.clone());
        }
    }
    *item = serde_json::from_value(Value::Object(fields)).map_err(|e| ReduceError::InvalidPayload {
        kind: ActionKind::UpdateVariable.to_string(),
        message: e.to_string(),
    })?;
    Ok(next)
}

fn delete_variable(config: &RootConfig, action: &Action, _: &dyn IdGenerator) -> Result<RootConfig, ReduceError> {
    let Action::DeleteVariable { data } = action else {
        return Err(mismatched(action, ActionKind::DeleteVariable));
    };
    let mut next = config.clone();
    variables_mut(&mut next)?.retain(|v| v.id() != Some(data.id.as_str()));
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialGenerator;
    use crate::reducer::{FieldChange, VariableRef, VariableUpdate};

    fn component() -> VariableUpdaterComponent {
        VariableUpdaterComponent::with_ids(None, Arc::new(SequentialGenerator::new("v")))
    }

    #[test]
    fn update_touches_only_existing_fields() {
        let updater = component();
        let config = updater.jade_config();
        let added = updater.reduce(&config, &Action::AddVariable { id: "var1".into() }).unwrap();
        let updated = updater
            .reduce(
                &added,
                &Action::UpdateVariable {
                    data: VariableUpdate {
                        id: "var1".into(),
                        key: "value".into(),
                        updates: vec![
                            FieldChange::new("referenceNode", json!("llm1")),
                            FieldChange::new("color", json!("red")),
                        ],
                    },
                },
            )
            .unwrap();
        let value = updated.input_params[0]
            .children()
            .unwrap()
            .iter()
            .find(|v| v.id() == Some("var1"))
            .and_then(|v| v.child("value"))
            .unwrap();
        assert_eq!(value.reference_node.as_deref(), Some("llm1"));
        assert!(!value.extra.contains_key("color"));
    }

    #[test]
    fn delete_removes_the_variable() {
        let updater = component();
        let config = updater.jade_config();
        let added = updater.reduce(&config, &Action::AddVariable { id: "var1".into() }).unwrap();
        let deleted = updater
            .reduce(&added, &Action::DeleteVariable { data: VariableRef { id: "var1".into() } })
            .unwrap();
        assert_eq!(deleted, config);
    }
}
