//! Template nodes: a template string plus a keyed list of referenced
//! arguments. Text concatenation keeps them under `args`, reply nodes under
//! `variables`.

use super::Component;
use crate::defaults;
use crate::error::ReduceError;
use crate::ids::{IdGenerator, UuidGenerator};
use crate::model::{ConfigNode, ConfigValue, DataType, RootConfig};
use crate::reducer::util::{apply_changes, children_of_mut, require_mut};
use crate::reducer::{Action, ActionKind, Reducer, ReducerRegistry, mismatched};
use serde_json::json;
use std::sync::Arc;

/// Which template node an adapter serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    TextConcatenation,
    Reply,
}

impl TemplateKind {
    /// Name of the input holding the template's arguments.
    pub fn args_name(&self) -> &'static str {
        match self {
            TemplateKind::TextConcatenation => "args",
            TemplateKind::Reply => "variables",
        }
    }

    pub fn component_name(&self) -> &'static str {
        match self {
            TemplateKind::TextConcatenation => "textConcatenateNodeComponent",
            TemplateKind::Reply => "replyNodeComponent",
        }
    }
}

pub struct TemplateComponent {
    kind: TemplateKind,
    existing: Option<RootConfig>,
    registry: ReducerRegistry<RootConfig>,
    ids: Arc<dyn IdGenerator>,
}

impl TemplateComponent {
    pub fn new(kind: TemplateKind, existing: Option<RootConfig>) -> Self {
        Self::with_ids(kind, existing, Arc::new(UuidGenerator))
    }

    pub fn with_ids(kind: TemplateKind, existing: Option<RootConfig>, ids: Arc<dyn IdGenerator>) -> Self {
        let args = kind.args_name();
        let reducers: Vec<Box<dyn Reducer<RootConfig>>> = vec![
            Box::new(ArgsReducer { kind: ActionKind::AddInputParam, args }),
            Box::new(ArgsReducer { kind: ActionKind::EditInputParam, args }),
            Box::new(ArgsReducer { kind: ActionKind::DeleteInputParam, args }),
            Box::new(ChangeTemplateReducer),
        ];
        Self {
            kind,
            existing,
            registry: ReducerRegistry::from_builtin(reducers),
            ids,
        }
    }

    pub fn kind(&self) -> TemplateKind {
        self.kind
    }
}

impl Component for TemplateComponent {
    type Config = RootConfig;

    fn name(&self) -> &str {
        self.kind.component_name()
    }

    fn default_config(&self) -> RootConfig {
        let ids = self.ids();
        let inputs = vec![
            ConfigNode::expand(
                ids.next_id(),
                Some(self.kind.args_name()),
                DataType::Object,
                vec![defaults::unnamed_reference(ids)],
            ),
            ConfigNode::input(ids.next_id(), "template", DataType::String, json!("")),
        ];
        let outputs = match self.kind {
            TemplateKind::TextConcatenation => vec![ConfigNode::input(
                format!("output_{}", ids.next_id()),
                "output",
                DataType::String,
                json!(""),
            )],
            TemplateKind::Reply => Vec::new(),
        };
        RootConfig {
            temp_reference: Some(json!({})),
            ..RootConfig::new(inputs, outputs)
        }
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

/// Add, edit and delete on the arguments list, parameterised by its name.
struct ArgsReducer {
    kind: ActionKind,
    args: &'static str,
}

impl Reducer<RootConfig> for ArgsReducer {
    fn action_kind(&self) -> ActionKind {
        self.kind
    }

    fn reduce(&self, config: &RootConfig, action: &Action, _: &dyn IdGenerator) -> Result<RootConfig, ReduceError> {
        let mut next = config.clone();
        let args = children_of_mut(require_mut(&mut next.input_params, self.args)?)?;
        match action {
            Action::AddInputParam { id } => args.push(ConfigNode {
                id: Some(id.clone()),
                data_type: Some(DataType::String),
                from: Some(crate::model::FromKind::Reference),
                value: Some(ConfigValue::Raw(json!(""))),
                ..Default::default()
            }),
            Action::EditInputParam { id, new_value } => {
                if let Some(arg) = args.iter_mut().find(|a| a.id() == Some(id.as_str())) {
                    apply_changes(arg, new_value, self.kind)?;
                }
            }
            Action::DeleteInputParam { id } => args.retain(|a| a.id() != Some(id.as_str())),
            _ => return Err(mismatched(action, self.kind)),
        }
        Ok(next)
    }
}

/// Sets the value of a top-level input found by id.
struct ChangeTemplateReducer;

impl Reducer<RootConfig> for ChangeTemplateReducer {
    fn action_kind(&self) -> ActionKind {
        ActionKind::ChangeTemplate
    }

    fn reduce(&self, config: &RootConfig, action: &Action, _: &dyn IdGenerator) -> Result<RootConfig, ReduceError> {
        let Action::ChangeTemplate { id, value } = action else {
            return Err(mismatched(action, ActionKind::ChangeTemplate));
        };
        let mut next = config.clone();
        if let Some(input) = next.input_params.iter_mut().find(|i| i.id() == Some(id.as_str())) {
            input.value = Some(ConfigValue::Raw(value.clone()));
        }
        Ok(next)
    }
}
