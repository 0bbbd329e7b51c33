use super::Component;
use crate::defaults;
use crate::error::ReduceError;
use crate::ids::{IdGenerator, UuidGenerator};
use crate::model::{ConfigNode, ConfigValue, DataType, RootConfig, find_named_mut, struct_to_config};
use crate::path::ConfigMutator;
use crate::reducer::util::{children_of_mut, require_mut, update_input};
use crate::reducer::{Action, ActionKind, ReducerRegistry, define_reducers, mismatched};
use serde_json::Value;
use std::sync::Arc;

const OPTION: &str = "option";
const KNOWLEDGE_REPOS: &str = "knowledgeRepos";
const RERANK_PARAM: &str = "rerankParam";
const ACCESS_INFO: &str = "accessInfo";

pub struct KnowledgeRetrievalComponent {
    existing: Option<RootConfig>,
    registry: ReducerRegistry<RootConfig>,
    ids: Arc<dyn IdGenerator>,
}

impl KnowledgeRetrievalComponent {
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

impl Component for KnowledgeRetrievalComponent {
    type Config = RootConfig;

    fn name(&self) -> &str {
        "knowledgeRetrievalComponent"
    }

    fn default_config(&self) -> RootConfig {
        let ids = self.ids();
        let output = ConfigNode::expand(
            ids.next_id(),
            Some("output"),
            DataType::Object,
            vec![ConfigNode::expand(
                ids.next_id(),
                Some("retrievalOutput"),
                DataType::Array,
                Vec::new(),
            )],
        );
        RootConfig::new(
            vec![
                ConfigNode::reference(ids.next_id(), Some("query"), DataType::String),
                ConfigNode::expand(ids.next_id(), Some(KNOWLEDGE_REPOS), DataType::Array, Vec::new()),
                defaults::knowledge_option(ids),
            ],
            vec![output],
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
    UpdateInputParamsReducer => UpdateInputParams: update_input_params,
    UpdateOptionReducer => UpdateOption: update_option,
    UpdateKnowledgeReducer => UpdateKnowledge: update_knowledge,
    UpdateGroupIdAndConfigIdReducer => UpdateGroupIdAndConfigId: update_group_id_and_config_id,
    ChangeRerankParamReducer => ChangeRerankParam: change_rerank_param,
    ChangeAccessInfoReducer => ChangeAccessInfo: change_access_info,
}

fn update_input_params(config: &RootConfig, action: &Action, _: &dyn IdGenerator) -> Result<RootConfig, ReduceError> {
    let Action::UpdateInputParams { id, changes } = action else {
        return Err(mismatched(action, ActionKind::UpdateInputParams));
    };
    let mut next = config.clone();
    next.input_params = update_input(&config.input_params, id, changes, ActionKind::UpdateInputParams)?;
    Ok(next)
}

fn update_option(config: &RootConfig, action: &Action, ids: &dyn IdGenerator) -> Result<RootConfig, ReduceError> {
    let Action::UpdateOption { option } = action else {
        return Err(mismatched(action, ActionKind::UpdateOption));
    };
    let mut next = config.clone();
    let node = require_mut(&mut next.input_params, OPTION)?;
    if node.children().is_some_and(|c| !c.is_empty()) {
        if let Some(children) = node.children_mut() {
            ConfigMutator::new(ids)
                .merge(children, option)
                .map_err(|e| ReduceError::InvalidPayload {
                    kind: ActionKind::UpdateOption.to_string(),
                    message: e.to_string(),
                })?;
        }
    } else {
        node.value = Some(ConfigValue::Nodes(struct_to_config(option, ids)));
    }
    Ok(next)
}

fn update_knowledge(config: &RootConfig, action: &Action, ids: &dyn IdGenerator) -> Result<RootConfig, ReduceError> {
    let Action::UpdateKnowledge { value } = action else {
        return Err(mismatched(action, ActionKind::UpdateKnowledge));
    };
    let repos = value
        .iter()
        .map(|repo| {
            let fields = repo
                .iter()
                .map(|(k, v)| ConfigNode::input(ids.next_id(), k, DataType::infer(v), v.clone()))
                .collect();
            ConfigNode::expand(ids.next_id(), None, DataType::Object, fields)
        })
        .collect();

    let mut next = config.clone();
    require_mut(&mut next.input_params, KNOWLEDGE_REPOS)?.value = Some(ConfigValue::Nodes(repos));
    Ok(next)
}

fn update_group_id_and_config_id(
    config: &RootConfig,
    action: &Action,
    ids: &dyn IdGenerator,
) -> Result<RootConfig, ReduceError> {
    let Action::UpdateGroupIdAndConfigId {
        value,
        knowledge_config_id,
    } = action
    else {
        return Err(mismatched(action, ActionKind::UpdateGroupIdAndConfigId));
    };
    let mut next = config.clone();

    let group_changed = {
        let option = children_of_mut(require_mut(&mut next.input_params, OPTION)?)?;
        let changed = set_or_insert(option, "groupId", value, || defaults::group_id(ids));
        set_or_insert(option, "knowledgeConfigId", knowledge_config_id, || {
            defaults::knowledge_config_id(ids)
        });
        changed
    };

    if group_changed {
        tracing::debug!("knowledge group changed; clearing selected repos");
        if let Some(repos) = find_named_mut(&mut next.input_params, KNOWLEDGE_REPOS) {
            repos.value = Some(ConfigValue::Nodes(Vec::new()));
        }
    }
    Ok(next)
}

/// Sets the named child's raw value, creating it from `template` first when
/// missing. Returns whether the stored value changed.
fn set_or_insert(
    children: &mut Vec<ConfigNode>,
    name: &str,
    value: &Value,
    template: impl FnOnce() -> ConfigNode,
) -> bool {
    let index = match children.iter().position(|c| c.has_name(name)) {
        Some(i) => i,
        None => {
            children.push(template());
            children.len() - 1
        }
    };
    let node = &mut children[index];
    let changed = node.raw_value() != Some(value);
    node.value = Some(ConfigValue::Raw(value.clone()));
    changed
}

fn rerank_param_mut(config: &mut RootConfig) -> Option<&mut ConfigNode> {
    find_named_mut(&mut config.input_params, OPTION)?.child_mut(RERANK_PARAM)
}

fn change_rerank_param(config: &RootConfig, action: &Action, _: &dyn IdGenerator) -> Result<RootConfig, ReduceError> {
    let Action::ChangeRerankParam { name, value } = action else {
        return Err(mismatched(action, ActionKind::ChangeRerankParam));
    };
    let mut next = config.clone();
    if let Some(param) = rerank_param_mut(&mut next).and_then(|r| r.child_mut(name)) {
        param.value = Some(ConfigValue::Raw(value.clone()));
    }
    Ok(next)
}

fn change_access_info(config: &RootConfig, action: &Action, _: &dyn IdGenerator) -> Result<RootConfig, ReduceError> {
    let Action::ChangeAccessInfo { service_name, tag } = action else {
        return Err(mismatched(action, ActionKind::ChangeAccessInfo));
    };
    let mut next = config.clone();
    if let Some(fields) = rerank_param_mut(&mut next)
        .and_then(|r| r.child_mut(ACCESS_INFO))
        .and_then(ConfigNode::children_mut)
    {
        for field in fields.iter_mut() {
            match field.name() {
                Some("serviceName") => field.value = Some(ConfigValue::Raw(service_name.clone())),
                Some("tag") => field.value = Some(ConfigValue::Raw(tag.clone())),
                _ => {}
            }
        }
    }
    Ok(next)
}
