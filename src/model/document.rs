use super::node::{ConfigNode, string_enum};
use super::presence::{Presence, keep_presence};
use super::root::{Converter, RootConfig};
use crate::error::DocumentError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

string_enum! {
    /// The shape types the core treats specially. Anything else is `Other`.
    ShapeKind {
        Start => "startNodeStart",
        End => "endNodeEnd",
        Llm => "llmNodeState",
        Condition => "conditionNodeCondition",
        QuestionClassification => "questionClassificationNodeCondition",
        KnowledgeRetrieval => "knowledgeRetrievalNodeState",
        Loop => "loopNodeState",
        ManualCheck => "manualCheckNodeState",
        IntelligentForm => "intelligentFormNodeState",
        Event => "jadeEvent",
    }
}

string_enum! {
    /// The kind of graph, read from the document's `flowType` field.
    FlowType {
        WorkFlow => "workflow",
        ChatFlow => "chatflow",
    }
}

/// A persisted graph: `{ pages: [ { shapes: [...] } ], ... }`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(remote = "Self")]
#[serde(rename_all = "camelCase")]
pub struct GraphDocument {
    #[serde(default)]
    pub pages: Vec<Page>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_type: Option<FlowType>,
    #[serde(skip)]
    pub presence: Presence,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

keep_presence!(GraphDocument, defaulted = ["pages"]);

impl GraphDocument {
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        serde_json::from_str(json).map_err(|e| DocumentError::JsonParseError(e.to_string()))
    }

    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        serde_json::from_value(value).map_err(|e| DocumentError::JsonParseError(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, DocumentError> {
        serde_json::to_string(self).map_err(|e| DocumentError::SerializeError(e.to_string()))
    }

    pub fn to_value(&self) -> Result<Value, DocumentError> {
        serde_json::to_value(self).map_err(|e| DocumentError::SerializeError(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct Page {
    #[serde(default)]
    pub shapes: Vec<Shape>,
    #[serde(skip)]
    pub presence: Presence,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

keep_presence!(Page, defaulted = ["shapes"]);

/// A node or an edge placed on the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self")]
#[serde(rename_all = "camelCase")]
pub struct Shape {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ShapeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runnable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_shape: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_shape: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_meta: Option<FlowMeta>,
    #[serde(skip)]
    pub presence: Presence,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

keep_presence!(Shape);

/// Where a shape keeps the root config the path resolver reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootLocation {
    /// `flowMeta.inputParams`
    StartInputs,
    /// `flowMeta.callback.converter.entity`
    Callback,
    /// `flowMeta.jober.converter.entity`
    Jober,
}

impl fmt::Display for RootLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = match self {
            RootLocation::StartInputs => "flowMeta.inputParams",
            RootLocation::Callback => "flowMeta.callback.converter.entity",
            RootLocation::Jober => "flowMeta.jober.converter.entity",
        };
        f.write_str(path)
    }
}

impl Shape {
    pub fn new(id: &str, kind: ShapeKind) -> Self {
        Self {
            id: id.to_string(),
            kind,
            text: None,
            component_name: None,
            runnable: None,
            deletable: None,
            from_shape: None,
            to_shape: None,
            flow_meta: None,
            presence: Presence::default(),
            extra: Map::new(),
        }
    }

    /// A directed `jadeEvent` edge between two shapes.
    pub fn edge(id: &str, from: &str, to: &str) -> Self {
        Self {
            from_shape: Some(from.to_string()),
            to_shape: Some(to.to_string()),
            ..Self::new(id, ShapeKind::Event)
        }
    }

    pub fn is_edge(&self) -> bool {
        self.kind == ShapeKind::Event
    }

    /// Which root config applies to this shape; a total function of its type.
    pub fn root_location(&self) -> RootLocation {
        match self.kind {
            ShapeKind::Start => RootLocation::StartInputs,
            ShapeKind::End => RootLocation::Callback,
            _ => RootLocation::Jober,
        }
    }

    /// The input list the path resolver walks from.
    pub fn root_inputs(&self) -> Option<&Vec<ConfigNode>> {
        let meta = self.flow_meta.as_ref()?;
        match self.root_location() {
            RootLocation::StartInputs => meta.input_params.as_ref(),
            RootLocation::Callback => meta.callback_entity().map(|e| &e.input_params),
            RootLocation::Jober => meta.jober_entity().map(|e| &e.input_params),
        }
    }

    pub fn root_inputs_mut(&mut self) -> Option<&mut Vec<ConfigNode>> {
        let location = self.root_location();
        let meta = self.flow_meta.as_mut()?;
        match location {
            RootLocation::StartInputs => meta.input_params.as_mut(),
            RootLocation::Callback => meta.callback_entity_mut().map(|e| &mut e.input_params),
            RootLocation::Jober => meta.jober_entity_mut().map(|e| &mut e.input_params),
        }
    }

    /// The full root config for shapes that keep one inside a converter.
    pub fn root_config(&self) -> Option<&RootConfig> {
        let meta = self.flow_meta.as_ref()?;
        match self.root_location() {
            RootLocation::StartInputs => None,
            RootLocation::Callback => meta.callback_entity(),
            RootLocation::Jober => meta.jober_entity(),
        }
    }

    pub fn root_config_mut(&mut self) -> Option<&mut RootConfig> {
        let location = self.root_location();
        let meta = self.flow_meta.as_mut()?;
        match location {
            RootLocation::StartInputs => None,
            RootLocation::Callback => meta.callback_entity_mut(),
            RootLocation::Jober => meta.jober_entity_mut(),
        }
    }
}

/// The node-type-specific envelope embedding one or more root configs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(remote = "Self")]
#[serde(rename_all = "camelCase")]
pub struct FlowMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jober: Option<Jober>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback: Option<Callback>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_params: Option<Vec<ConfigNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_params: Option<ConditionParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<Task>,
    #[serde(skip)]
    pub presence: Presence,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

keep_presence!(FlowMeta);

impl FlowMeta {
    pub fn jober_entity(&self) -> Option<&RootConfig> {
        self.jober.as_ref()?.converter.as_ref()?.entity.as_ref()
    }

    pub fn jober_entity_mut(&mut self) -> Option<&mut RootConfig> {
        self.jober.as_mut()?.converter.as_mut()?.entity.as_mut()
    }

    pub fn callback_entity(&self) -> Option<&RootConfig> {
        self.callback.as_ref()?.converter.as_ref()?.entity.as_ref()
    }

    pub fn callback_entity_mut(&mut self) -> Option<&mut RootConfig> {
        self.callback.as_mut()?.converter.as_mut()?.entity.as_mut()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct Jober {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<JoberEntity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converter: Option<Converter>,
    #[serde(skip)]
    pub presence: Presence,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

keep_presence!(Jober);

/// The job's declared execution contract.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct JoberEntity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<JobParam>>,
    #[serde(skip)]
    pub presence: Presence,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

keep_presence!(JoberEntity);

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct JobParam {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip)]
    pub presence: Presence,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

keep_presence!(JobParam);

impl JobParam {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct Callback {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converter: Option<Converter>,
    #[serde(skip)]
    pub presence: Presence,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

keep_presence!(Callback);

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct ConditionParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branches: Option<Vec<Branch>>,
    #[serde(skip)]
    pub presence: Presence,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

keep_presence!(ConditionParams);

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct Branch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runnable: Option<bool>,
    #[serde(skip)]
    pub presence: Presence,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

keep_presence!(Branch);

/// The form task attached to manual-check and intelligent-form nodes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(remote = "Self")]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(skip)]
    pub presence: Presence,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

keep_presence!(Task);
