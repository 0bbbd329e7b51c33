//! The parallel node: runs several plugin tools side by side. Each plugin is
//! an entry of the `toolCalls` input and a named child of the `output` output.

use super::Component;
use crate::defaults;
use crate::error::ReduceError;
use crate::ids::{IdGenerator, UuidGenerator};
use crate::model::{ConfigNode, ConfigValue, DataType, RootConfig, find_named};
use crate::reducer::util::{children_of_mut, require_mut, update_input};
use crate::reducer::{Action, ActionKind, ReducerRegistry, define_reducers, mismatched};
use serde_json::{Value, json};
use std::sync::Arc;

pub const TOOL_CALLS: &str = "toolCalls";
pub const ARGS: &str = "args";
pub const OUTPUT: &str = "output";
pub const OUTPUT_NAME: &str = "outputName";

pub struct ParallelComponent {
    existing: Option<RootConfig>,
    registry: ReducerRegistry<RootConfig>,
    ids: Arc<dyn IdGenerator>,
}

impl ParallelComponent {
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

impl Component for ParallelComponent {
    type Config = RootConfig;

    fn name(&self) -> &str {
        "parallelComponent"
    }

    fn default_config(&self) -> RootConfig {
        let ids = self.ids();
        RootConfig::new(
            vec![
                ConfigNode::expand(ids.next_id(), Some(TOOL_CALLS), DataType::Array, Vec::new()),
                defaults::context_input(ids),
            ],
            vec![ConfigNode::expand(ids.next_id(), Some(OUTPUT), DataType::Object, Vec::new())],
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
    AddPluginByMetaDataReducer => AddPluginByMetaData: add_plugin,
    DeletePluginReducer => DeletePlugin: delete_plugin,
    UpdatePluginArgReducer => Update: update_plugin_arg,
}

fn output_name(plugin: &ConfigNode) -> Option<&str> {
    plugin.child(OUTPUT_NAME)?.raw_value()?.as_str()
}

/// Makes `name` unique among `taken` by appending or bumping a `_<n>` suffix.
pub fn unique_output_name(name: &str, taken: &[&str]) -> String {
    if !taken.contains(&name) {
        return name.to_string();
    }
    let mut candidate = name.to_string();
    let mut index = 1;
    loop {
        candidate = match candidate.rfind('_') {
            Some(at) if is_counter(&candidate[at + 1..]) => {
                format!("{}_{}", &candidate[..at], index)
            }
            _ => format!("{}_{}", candidate, index),
        };
        if !taken.contains(&candidate.as_str()) {
            return candidate;
        }
        index += 1;
    }
}

fn is_counter(suffix: &str) -> bool {
    !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit())
}

fn add_plugin(config: &RootConfig, action: &Action, ids: &dyn IdGenerator) -> Result<RootConfig, ReduceError> {
    let Action::AddPluginByMetaData {
        plugin_name,
        unique_name,
        entity,
        tags,
    } = action
    else {
        return Err(mismatched(action, ActionKind::AddPluginByMetaData));
    };

    let name = {
        let taken: Vec<&str> = find_named(&config.input_params, TOOL_CALLS)
            .and_then(ConfigNode::children)
            .map(|plugins| plugins.iter().filter_map(output_name).collect())
            .unwrap_or_default();
        unique_output_name(plugin_name, &taken)
    };

    let order: Vec<Value> = entity
        .input_params
        .iter()
        .map(|p| json!({ "name": p.name }))
        .collect();
    let tags = if tags.is_null() { json!([]) } else { tags.clone() };
    let plugin_input = ConfigNode::expand(
        ids.next_id(),
        None,
        DataType::Object,
        vec![
            ConfigNode::input(ids.next_id(), "uniqueName", DataType::String, unique_name.clone()),
            ConfigNode::expand(ids.next_id(), Some(ARGS), DataType::Object, entity.input_params.clone()),
            ConfigNode::input(ids.next_id(), "order", DataType::Array, Value::Array(order)),
            ConfigNode::input(ids.next_id(), OUTPUT_NAME, DataType::String, json!(name)),
            ConfigNode::input(ids.next_id(), "tags", DataType::Array, tags),
        ],
    );

    let produced = entity.output(OUTPUT);
    let plugin_output = ConfigNode {
        id: Some(ids.next_id()),
        name: Some(name.clone()),
        data_type: Some(
            produced
                .and_then(|o| o.data_type.clone())
                .unwrap_or(DataType::Object),
        ),
        value: Some(
            produced
                .and_then(|o| o.value.clone())
                .unwrap_or_else(|| ConfigValue::Raw(json!({}))),
        ),
        ..Default::default()
    };

    let mut next = config.clone();
    children_of_mut(require_mut(&mut next.input_params, TOOL_CALLS)?)?.push(plugin_input);
    children_of_mut(require_mut(&mut next.output_params, OUTPUT)?)?.push(plugin_output);
    tracing::debug!(plugin = %name, "added parallel plugin");
    Ok(next)
}

fn delete_plugin(config: &RootConfig, action: &Action, _: &dyn IdGenerator) -> Result<RootConfig, ReduceError> {
    let Action::DeletePlugin { output_name: target } = action else {
        return Err(mismatched(action, ActionKind::DeletePlugin));
    };
    let mut next = config.clone();
    if let Some(plugins) = require_mut(&mut next.input_params, TOOL_CALLS)?.children_mut() {
        plugins.retain(|p| output_name(p) != Some(target.as_str()));
    }
    if let Some(outputs) = require_mut(&mut next.output_params, OUTPUT)?.children_mut() {
        outputs.retain(|o| !o.has_name(target));
    }
    Ok(next)
}

fn update_plugin_arg(config: &RootConfig, action: &Action, _: &dyn IdGenerator) -> Result<RootConfig, ReduceError> {
    let Action::Update { parent_id, id, changes } = action else {
        return Err(mismatched(action, ActionKind::Update));
    };
    let mut next = config.clone();
    let Some(parent_id) = parent_id else {
        next.input_params = update_input(&config.input_params, id, changes, ActionKind::Update)?;
        return Ok(next);
    };

    let args = require_mut(&mut next.input_params, TOOL_CALLS)?
        .children_mut()
        .and_then(|plugins| plugins.iter_mut().find(|p| p.id() == Some(parent_id.as_str())))
        .and_then(|plugin| plugin.child_mut(ARGS))
        .and_then(ConfigNode::children_mut);
    if let Some(args) = args {
        *args = update_input(args, id, changes, ActionKind::Update)?;
    }
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialGenerator;

    fn component() -> ParallelComponent {
        ParallelComponent::with_ids(None, Arc::new(SequentialGenerator::new("p")))
    }

    fn add(component: &ParallelComponent, config: &RootConfig, name: &str) -> RootConfig {
        let entity = RootConfig::new(
            vec![ConfigNode::input("q".into(), "query", DataType::String, json!(""))],
            vec![],
        );
        component
            .reduce(
                config,
                &Action::AddPluginByMetaData {
                    plugin_name: name.into(),
                    unique_name: json!("tool.search"),
                    entity,
                    tags: Value::Null,
                },
            )
            .unwrap()
    }

    #[test]
    fn only_numeric_tails_count_as_suffixes() {
        assert_eq!(unique_output_name("tool_2x", &["tool_2x"]), "tool_2x_1");
        assert_eq!(unique_output_name("tool_", &["tool_"]), "tool__1");
        assert_eq!(unique_output_name("tool_2", &["tool_2", "tool_1"]), "tool_3");
    }

    #[test]
    fn suffixes_follow_existing_names() {
        assert_eq!(unique_output_name("search", &[]), "search");
        assert_eq!(unique_output_name("search", &["search"]), "search_1");
        assert_eq!(unique_output_name("search", &["search", "search_1"]), "search_2");
        assert_eq!(unique_output_name("search_1", &["search_1"]), "search_2");
    }

    #[test]
    fn plugins_get_unique_output_names_and_can_be_deleted() {
        let parallel = component();
        let config = parallel.jade_config();
        let one = add(&parallel, &config, "search");
        let two = add(&parallel, &one, "search");
        let outputs: Vec<_> = two.output(OUTPUT).unwrap().children().unwrap().iter().filter_map(|o| o.name()).collect();
        assert_eq!(outputs, vec!["search", "search_1"]);

        let after = parallel
            .reduce(&two, &Action::DeletePlugin { output_name: "search".into() })
            .unwrap();
        assert_eq!(after.input(TOOL_CALLS).unwrap().children().unwrap().len(), 1);
        assert_eq!(after.output(OUTPUT).unwrap().children().unwrap().len(), 1);
    }
}
