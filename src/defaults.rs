//! Canonical node templates shared by component factories and compatibility
//! processors. Every function takes its ids from the supplied generator.

use crate::ids::IdGenerator;
use crate::model::{ConfigNode, ConfigValue, DataType};
use serde_json::{Value, json};

pub const DEFAULT_MAX_MEMORY_ROUNDS: i64 = 3;
pub const DEFAULT_RERANK_TOP_N: i64 = 3;
pub const DEFAULT_KNOWLEDGE_GROUP_ID: &str = "default";
pub const DEFAULT_REFERENCE_LIMIT: i64 = 3000;
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.5;

/// The reference placeholder new references are built from.
pub fn default_reference(ids: &dyn IdGenerator) -> ConfigNode {
    ConfigNode {
        id: Some(ids.next_id()),
        name: Some(String::new()),
        data_type: Some(DataType::String),
        description: Some(String::new()),
        from: Some(crate::model::FromKind::Reference),
        reference_node: Some(String::new()),
        reference_id: Some(String::new()),
        reference_key: Some(String::new()),
        value: Some(ConfigValue::Raw(json!([]))),
        editable: Some(true),
        ..Default::default()
    }
}

/// An unbound `String` reference without a name, as template arguments start out.
pub fn unnamed_reference(ids: &dyn IdGenerator) -> ConfigNode {
    ConfigNode::reference(ids.next_id(), None, DataType::String)
}

pub fn context_input(ids: &dyn IdGenerator) -> ConfigNode {
    ConfigNode::reference(ids.next_id(), Some("context"), DataType::Object)
}

pub fn enable_log(ids: &dyn IdGenerator, enabled: bool) -> ConfigNode {
    ConfigNode::input(ids.next_id(), "enableLog", DataType::Boolean, Value::Bool(enabled))
}

pub fn max_memory_rounds(ids: &dyn IdGenerator) -> ConfigNode {
    ConfigNode::input(
        ids.next_id(),
        "maxMemoryRounds",
        DataType::Integer,
        json!(DEFAULT_MAX_MEMORY_ROUNDS),
    )
}

pub fn knowledge_bases(ids: &dyn IdGenerator) -> ConfigNode {
    ConfigNode::expand(ids.next_id(), Some("knowledgeBases"), DataType::Array, Vec::new())
}

pub fn mcp_servers(ids: &dyn IdGenerator) -> ConfigNode {
    ConfigNode::expand(ids.next_id(), Some("mcpServers"), DataType::Array, Vec::new())
}

pub fn tools(ids: &dyn IdGenerator) -> ConfigNode {
    ConfigNode::expand(ids.next_id(), Some("tools"), DataType::Array, Vec::new())
}

/// The `reference` list an LLM node reports under its `output` output.
pub fn llm_reference_output(ids: &dyn IdGenerator) -> ConfigNode {
    ConfigNode::expand(ids.next_id(), Some("reference"), DataType::Array, Vec::new())
}

pub fn group_id(ids: &dyn IdGenerator) -> ConfigNode {
    ConfigNode::input(
        ids.next_id(),
        "groupId",
        DataType::String,
        json!(DEFAULT_KNOWLEDGE_GROUP_ID),
    )
}

pub fn knowledge_config_id(ids: &dyn IdGenerator) -> ConfigNode {
    ConfigNode::input(ids.next_id(), "knowledgeConfigId", DataType::String, json!(""))
}

pub fn access_info(ids: &dyn IdGenerator) -> ConfigNode {
    ConfigNode::expand(
        ids.next_id(),
        Some("accessInfo"),
        DataType::Object,
        vec![
            ConfigNode::input(ids.next_id(), "serviceName", DataType::String, json!("")),
            ConfigNode::input(ids.next_id(), "tag", DataType::String, json!("")),
        ],
    )
}

pub fn rerank_top_n(ids: &dyn IdGenerator) -> ConfigNode {
    ConfigNode::input(ids.next_id(), "rerankTopN", DataType::Integer, json!(DEFAULT_RERANK_TOP_N))
}

pub fn extensions(ids: &dyn IdGenerator) -> ConfigNode {
    ConfigNode::expand(ids.next_id(), Some("extensions"), DataType::Object, Vec::new())
}

pub fn rerank_param(ids: &dyn IdGenerator) -> ConfigNode {
    ConfigNode::expand(
        ids.next_id(),
        Some("rerankParam"),
        DataType::Object,
        vec![
            ConfigNode::input(ids.next_id(), "enableRerank", DataType::Boolean, json!(false)),
            ConfigNode::input(ids.next_id(), "model", DataType::String, json!("")),
            ConfigNode::input(ids.next_id(), "baseUri", DataType::String, json!("")),
            access_info(ids),
            rerank_top_n(ids),
        ],
    )
}

/// The full `option` input of a fresh knowledge retrieval node.
pub fn knowledge_option(ids: &dyn IdGenerator) -> ConfigNode {
    ConfigNode::expand(
        ids.next_id(),
        Some("option"),
        DataType::Object,
        vec![
            ConfigNode::input(
                ids.next_id(),
                "referenceLimit",
                DataType::Integer,
                json!(DEFAULT_REFERENCE_LIMIT),
            ),
            ConfigNode::input(
                ids.next_id(),
                "similarityThreshold",
                DataType::Number,
                json!(DEFAULT_SIMILARITY_THRESHOLD),
            ),
            rerank_param(ids),
            group_id(ids),
            knowledge_config_id(ids),
            extensions(ids),
        ],
    )
}
