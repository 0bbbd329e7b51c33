//! The intelligent form node: a form task whose converter entity holds the
//! form's data and schema.

use super::{Component, ConfigSlot};
use crate::error::{DocumentError, GraphError, PathError, ReduceError};
use crate::ids::{IdGenerator, UuidGenerator};
use crate::model::node::string_enum;
use crate::model::presence::keep_presence;
use crate::model::{ConfigNode, ConfigValue, Converter, DataType, Presence, RootConfig, Shape, Task};
use crate::reducer::util::{require_mut, update_input};
use crate::reducer::{Action, ActionKind, ReducerRegistry, define_reducers, mismatched};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fmt;
use std::sync::Arc;

/// Task id of the built-in orchestration form.
pub const ORCHESTRATION_TASK_ID: &str = "a910a3d38a4549eda1112beee008419d";
pub const SMART_FORM_TYPE: &str = "AIPP_SMART_FORM";

const SCHEMA: &str = "schema";
const PARAMETERS: &str = "parameters";

string_enum! {
    FormType {
        Orchestration => "orchestration",
        Manual => "manual",
    }
}

/// The form task stored at `flowMeta.task`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(remote = "Self")]
#[serde(rename_all = "camelCase")]
pub struct FormConfig {
    #[serde(default)]
    pub converter: Converter,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_type: Option<FormType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img_url: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip)]
    pub presence: Presence,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

keep_presence!(FormConfig, defaulted = ["converter"]);

impl FormConfig {
    pub fn entity(&self) -> Option<&RootConfig> {
        self.converter.entity.as_ref()
    }

    /// The form's schema parameters, empty when there is no schema.
    pub fn schema_parameters(&self) -> &[Value] {
        self.entity()
            .and_then(|e| e.input(SCHEMA))
            .and_then(ConfigNode::raw_value)
            .and_then(|v| v.get(PARAMETERS))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl ConfigSlot for FormConfig {
    fn read(shape: &Shape) -> Option<Self> {
        let task = shape.flow_meta.as_ref()?.task.as_ref()?;
        serde_json::to_value(task)
            .and_then(serde_json::from_value)
            .ok()
    }

    fn write(self, shape: &mut Shape) -> Result<(), GraphError> {
        let shape_id = shape.id.clone();
        let meta = shape.flow_meta.as_mut().ok_or(PathError::CorruptShape {
            shape_id,
            location: "flowMeta.task".to_string(),
        })?;
        let task: Task = serde_json::to_value(self)
            .and_then(serde_json::from_value)
            .map_err(|e| DocumentError::SerializeError(e.to_string()))?;
        meta.task = Some(task);
        Ok(())
    }
}

/// The entity a fresh orchestration form starts with.
pub fn orchestration_entity(ids: &dyn IdGenerator) -> RootConfig {
    let schema = ConfigNode::input(
        ids.next_id(),
        SCHEMA,
        DataType::Object,
        json!({ "parameters": [] }),
    );
    let output = ConfigNode {
        id: Some(ids.next_id()),
        name: Some("output".to_string()),
        data_type: Some(DataType::Object),
        value: Some(ConfigValue::Nodes(Vec::new())),
        ..Default::default()
    };
    RootConfig::new(
        vec![
            ConfigNode::expand(ids.next_id(), Some("data"), DataType::Object, Vec::new()),
            schema,
        ],
        vec![output],
    )
}

pub struct IntelligentFormComponent {
    existing: Option<FormConfig>,
    registry: ReducerRegistry<FormConfig>,
    ids: Arc<dyn IdGenerator>,
}

impl IntelligentFormComponent {
    pub fn new(existing: Option<FormConfig>) -> Self {
        Self::with_ids(existing, Arc::new(UuidGenerator))
    }

    pub fn with_ids(existing: Option<FormConfig>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            existing,
            registry: ReducerRegistry::from_builtin(builtin_reducers()),
            ids,
        }
    }
}

impl Component for IntelligentFormComponent {
    type Config = FormConfig;

    fn name(&self) -> &str {
        "intelligentFormComponent"
    }

    fn default_config(&self) -> FormConfig {
        FormConfig {
            converter: Converter::mapping(orchestration_entity(self.ids())),
            form_type: Some(FormType::Orchestration),
            task_id: Some(ORCHESTRATION_TASK_ID.to_string()),
            kind: Some(SMART_FORM_TYPE.to_string()),
            ..Default::default()
        }
    }

    fn existing_config(&self) -> Option<&FormConfig> {
        self.existing.as_ref()
    }

    fn registry(&self) -> &ReducerRegistry<FormConfig> {
        &self.registry
    }

    fn ids(&self) -> &dyn IdGenerator {
        self.ids.as_ref()
    }
}

define_reducers! {
    FormConfig;
    AddParamReducer => AddParam: add_param,
    UpdateParamReducer => UpdateParam: update_param,
    DeleteParamReducer => DeleteParam: delete_param,
    ChangeFormTypeReducer => ChangeFormType: change_form_type,
    ChangeFormByMetaDataReducer => ChangeFormByMetaData: change_form_by_meta_data,
    DeleteFormReducer => DeleteForm: delete_form,
    UpdateFormInputReducer => Update: update_form_input,
}

fn schema_parameters_mut(config: &mut FormConfig) -> Result<&mut Vec<Value>, ReduceError> {
    let entity = config
        .converter
        .entity
        .as_mut()
        .ok_or_else(|| ReduceError::InvalidConfig("form has no converter entity".to_string()))?;
    let schema = require_mut(&mut entity.input_params, SCHEMA)?;
    match schema.value.as_mut() {
        Some(ConfigValue::Raw(Value::Object(map))) => {
            let parameters = map
                .entry(PARAMETERS)
                .or_insert_with(|| Value::Array(Vec::new()));
            if !parameters.is_array() {
                *parameters = Value::Array(Vec::new());
            }
            parameters
                .as_array_mut()
                .ok_or_else(|| ReduceError::InvalidConfig("schema parameters are not a list".to_string()))
        }
        _ => Err(ReduceError::InvalidConfig("schema value is not an object".to_string())),
    }
}

fn param_id(param: &Value) -> Option<&str> {
    param.get("id").and_then(Value::as_str)
}

fn add_param(config: &FormConfig, action: &Action, ids: &dyn IdGenerator) -> Result<FormConfig, ReduceError> {
    let Action::AddParam { id } = action else {
        return Err(mismatched(action, ActionKind::AddParam));
    };
    let param = json!({
        "id": id.clone().unwrap_or_else(|| ids.next_id()),
        "name": "",
        "displayName": "",
        "from": "Input",
        "value": "",
        "renderType": "",
        "options": {
            "id": ids.next_id(),
            "from": "Reference",
            "referenceNode": "",
            "referenceId": "",
            "referenceKey": "",
            "value": [],
            "type": "Array",
        },
    });
    let mut next = config.clone();
    schema_parameters_mut(&mut next)?.push(param);
    Ok(next)
}

fn update_param(config: &FormConfig, action: &Action, _: &dyn IdGenerator) -> Result<FormConfig, ReduceError> {
    let Action::UpdateParam { id, changes } = action else {
        return Err(mismatched(action, ActionKind::UpdateParam));
    };
    let mut next = config.clone();
    for param in schema_parameters_mut(&mut next)?.iter_mut() {
        if param_id(param) != Some(id.as_str()) {
            continue;
        }
        if let Value::Object(fields) = param {
            for change in changes {
                fields.insert(change.key.clone(), change.value.clone());
            }
        }
    }
    Ok(next)
}

fn delete_param(config: &FormConfig, action: &Action, _: &dyn IdGenerator) -> Result<FormConfig, ReduceError> {
    let Action::DeleteParam { id } = action else {
        return Err(mismatched(action, ActionKind::DeleteParam));
    };
    let mut next = config.clone();
    schema_parameters_mut(&mut next)?.retain(|p| param_id(p) != Some(id.as_str()));
    Ok(next)
}

fn change_form_type(config: &FormConfig, action: &Action, ids: &dyn IdGenerator) -> Result<FormConfig, ReduceError> {
    let Action::ChangeFormType { value } = action else {
        return Err(mismatched(action, ActionKind::ChangeFormType));
    };
    let form_type = FormType::from(value.as_str());
    let orchestration = form_type == FormType::Orchestration;
    let mut next = config.clone();
    next.converter.entity = Some(if orchestration {
        orchestration_entity(ids)
    } else {
        RootConfig::default()
    });
    next.task_id = Some(if orchestration {
        ORCHESTRATION_TASK_ID.to_string()
    } else {
        String::new()
    });
    next.form_type = Some(form_type);
    Ok(next)
}

fn change_form_by_meta_data(
    config: &FormConfig,
    action: &Action,
    _: &dyn IdGenerator,
) -> Result<FormConfig, ReduceError> {
    let Action::ChangeFormByMetaData {
        form_id,
        form_name,
        img_url,
        entity,
    } = action
    else {
        return Err(mismatched(action, ActionKind::ChangeFormByMetaData));
    };
    let mut next = config.clone();
    next.task_id = Some(form_id.clone());
    next.form_name = form_name.clone();
    next.img_url = img_url.clone();
    next.converter.entity = Some(entity.clone());
    Ok(next)
}

fn delete_form(config: &FormConfig, action: &Action, _: &dyn IdGenerator) -> Result<FormConfig, ReduceError> {
    if !matches!(action, Action::DeleteForm { .. }) {
        return Err(mismatched(action, ActionKind::DeleteForm));
    }
    let mut next = config.clone();
    next.task_id = Some(String::new());
    next.form_name = Some(String::new());
    next.img_url = None;
    next.converter.entity = Some(RootConfig::default());
    Ok(next)
}

fn update_form_input(config: &FormConfig, action: &Action, _: &dyn IdGenerator) -> Result<FormConfig, ReduceError> {
    let Action::Update { id, changes, .. } = action else {
        return Err(mismatched(action, ActionKind::Update));
    };
    let mut next = config.clone();
    let entity = next
        .converter
        .entity
        .as_mut()
        .ok_or_else(|| ReduceError::InvalidConfig("form has no converter entity".to_string()))?;
    entity.input_params = update_input(&entity.input_params, id, changes, ActionKind::Update)?;
    Ok(next)
}
