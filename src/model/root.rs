use super::node::{ConfigNode, find_named, find_named_mut};
use super::presence::{Presence, keep_presence};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The per-shape JadeConfig document: `{ inputParams, outputParams, tempReference?, ... }`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(remote = "Self")]
#[serde(rename_all = "camelCase")]
pub struct RootConfig {
    #[serde(default)]
    pub input_params: Vec<ConfigNode>,
    #[serde(default)]
    pub output_params: Vec<ConfigNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_reference: Option<Value>,
    #[serde(skip)]
    pub presence: Presence,
    /// Node-type-specific fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

keep_presence!(RootConfig, defaulted = ["inputParams", "outputParams"]);

impl RootConfig {
    pub fn new(input_params: Vec<ConfigNode>, output_params: Vec<ConfigNode>) -> Self {
        Self {
            input_params,
            output_params,
            ..Default::default()
        }
    }

    pub fn input(&self, name: &str) -> Option<&ConfigNode> {
        find_named(&self.input_params, name)
    }

    pub fn input_mut(&mut self, name: &str) -> Option<&mut ConfigNode> {
        find_named_mut(&mut self.input_params, name)
    }

    pub fn output(&self, name: &str) -> Option<&ConfigNode> {
        find_named(&self.output_params, name)
    }

    pub fn output_mut(&mut self, name: &str) -> Option<&mut ConfigNode> {
        find_named_mut(&mut self.output_params, name)
    }
}

/// A `{ type, entity }` converter envelope wrapping a root config.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct Converter {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<RootConfig>,
    #[serde(skip)]
    pub presence: Presence,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

keep_presence!(Converter);

impl Converter {
    pub fn mapping(entity: RootConfig) -> Self {
        Self {
            kind: Some("mapping_converter".to_string()),
            entity: Some(entity),
            ..Self::default()
        }
    }
}
