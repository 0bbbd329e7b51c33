//! Typed actions dispatched into component reducers.

use crate::error::ReduceError;
use crate::model::RootConfig;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Declares the closed set of action kinds and their wire names.
macro_rules! define_action_kinds {
    ( $( $variant:ident => $wire:literal ),* $(,)? ) => {
        /// The discriminator of an [`Action`]; reducer registries are keyed by it.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ActionKind {
            $( $variant, )*
        }

        impl ActionKind {
            pub const ALL: &'static [ActionKind] = &[ $( ActionKind::$variant, )* ];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( ActionKind::$variant => $wire, )*
                }
            }
        }

        impl FromStr for ActionKind {
            type Err = ReduceError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $wire => Ok(ActionKind::$variant), )*
                    other => Err(ReduceError::UnknownAction(other.to_string())),
                }
            }
        }

        impl Action {
            pub fn kind(&self) -> ActionKind {
                match self {
                    $( Action::$variant { .. } => ActionKind::$variant, )*
                }
            }
        }
    };
}

define_action_kinds! {
    SystemUpdate => "system_update",
    AddParam => "addParam",
    UpdateParam => "updateParam",
    DeleteParam => "deleteParam",
    ChangeFormType => "changeFormType",
    ChangeFormByMetaData => "changeFormByMetaData",
    DeleteForm => "deleteForm",
    Update => "update",
    UpdateInputParams => "updateInputParams",
    UpdateOption => "updateOption",
    UpdateKnowledge => "updateKnowledge",
    UpdateGroupIdAndConfigId => "updateGroupIdAndConfigId",
    ChangeRerankParam => "changeRerankParam",
    ChangeAccessInfo => "changeAccessInfo",
    AddPluginByMetaData => "addPluginByMetaData",
    DeletePlugin => "deletePlugin",
    AddInputParam => "addInputParam",
    EditInputParam => "editInputParam",
    ChangeTemplate => "changeTemplate",
    DeleteInputParam => "deleteInputParam",
    AddVariable => "addVariable",
    UpdateVariable => "updateVariable",
    DeleteVariable => "deleteVariable",
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `{key, value}` field assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub key: String,
    #[serde(default)]
    pub value: Value,
}

impl FieldChange {
    pub fn new(key: &str, value: Value) -> Self {
        Self {
            key: key.to_string(),
            value,
        }
    }
}

/// Payload of `updateVariable`: which field of which variable entry to change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableUpdate {
    pub id: String,
    pub key: String,
    #[serde(default)]
    pub updates: Vec<FieldChange>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableRef {
    pub id: String,
}

/// Everything a component can be asked to do, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Action {
    /// Assigns top-level fields of the config.
    #[serde(rename = "system_update")]
    SystemUpdate { changes: Vec<FieldChange> },

    AddParam {
        #[serde(default)]
        id: Option<String>,
    },
    UpdateParam { id: String, changes: Vec<FieldChange> },
    DeleteParam { id: String },
    ChangeFormType { value: String },
    ChangeFormByMetaData {
        form_id: String,
        #[serde(default)]
        form_name: Option<String>,
        #[serde(default)]
        img_url: Option<String>,
        entity: RootConfig,
    },
    DeleteForm {},
    /// Edits the node with `id`; `parent_id` narrows the search to one plugin's args.
    Update {
        #[serde(default)]
        parent_id: Option<String>,
        id: String,
        changes: Vec<FieldChange>,
    },

    UpdateInputParams { id: String, changes: Vec<FieldChange> },
    UpdateOption { option: Map<String, Value> },
    UpdateKnowledge { value: Vec<Map<String, Value>> },
    UpdateGroupIdAndConfigId {
        value: Value,
        #[serde(default)]
        knowledge_config_id: Value,
    },
    ChangeRerankParam { name: String, value: Value },
    ChangeAccessInfo {
        #[serde(default)]
        service_name: Value,
        #[serde(default)]
        tag: Value,
    },

    AddPluginByMetaData {
        plugin_name: String,
        #[serde(default)]
        unique_name: Value,
        entity: RootConfig,
        #[serde(default)]
        tags: Value,
    },
    DeletePlugin { output_name: String },

    AddInputParam { id: String },
    EditInputParam { id: String, new_value: Vec<FieldChange> },
    ChangeTemplate { id: String, value: Value },
    DeleteInputParam { id: String },

    AddVariable { id: String },
    UpdateVariable { data: VariableUpdate },
    DeleteVariable { data: VariableRef },
}

impl Action {
    /// Reads an action from its JSON form.
    ///
    /// Older editors tagged actions with `actionType`; that key is rewritten to
    /// `type` here and nowhere else.
    pub fn from_json(value: Value) -> Result<Self, ReduceError> {
        let Value::Object(mut map) = value else {
            return Err(ReduceError::InvalidPayload {
                kind: "?".to_string(),
                message: "an action must be a JSON object".to_string(),
            });
        };

        if let Some(legacy) = map.remove("actionType") {
            if !map.contains_key("type") {
                tracing::warn!(action = %legacy, "normalizing legacy 'actionType' discriminator");
                map.insert("type".to_string(), legacy);
            }
        }

        let kind = match map.get("type") {
            Some(Value::String(s)) => ActionKind::from_str(s)?,
            Some(other) => return Err(ReduceError::UnknownAction(other.to_string())),
            None => return Err(ReduceError::UnknownAction(String::new())),
        };

        serde_json::from_value(Value::Object(map)).map_err(|e| ReduceError::InvalidPayload {
            kind: kind.to_string(),
            message: e.to_string(),
        })
    }

    /// Parses an action from JSON text.
    pub fn from_str_json(json: &str) -> Result<Self, ReduceError> {
        let value: Value = serde_json::from_str(json).map_err(|e| ReduceError::InvalidPayload {
            kind: "?".to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(value)
    }

    pub fn system_update(changes: Vec<FieldChange>) -> Self {
        Action::SystemUpdate { changes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_discriminator_is_normalized() {
        let action = Action::from_json(json!({"actionType": "deleteParam", "id": "p1"})).unwrap();
        assert_eq!(action, Action::DeleteParam { id: "p1".into() });
    }

    #[test]
    fn unknown_kind_is_reported_by_name() {
        let err = Action::from_json(json!({"type": "teleport"})).unwrap_err();
        assert_eq!(err, ReduceError::UnknownAction("teleport".into()));
    }

    #[test]
    fn bad_payload_names_the_kind() {
        let err = Action::from_json(json!({"type": "deleteParam"})).unwrap_err();
        assert!(matches!(err, ReduceError::InvalidPayload { ref kind, .. } if kind == "deleteParam"));
    }

    #[test]
    fn every_kind_has_a_distinct_wire_name() {
        for kind in ActionKind::ALL {
            assert_eq!(kind.as_str().parse::<ActionKind>().unwrap(), *kind);
        }
    }

    #[test]
    fn camel_case_payload_fields() {
        let action = Action::from_json(json!({"type": "deletePlugin", "outputName": "search_1"})).unwrap();
        assert_eq!(action.kind(), ActionKind::DeletePlugin);
    }
}
