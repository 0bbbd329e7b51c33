use super::presence::{Presence, keep_presence};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Declares a string-backed enum that keeps unrecognised values verbatim.
///
/// Documents written by newer editors may carry kinds this crate does not know
/// yet; they land in `Other` and serialize back unchanged.
macro_rules! string_enum {
    ( $(#[$meta:meta])* $name:ident { $( $variant:ident => $text:literal ),* $(,)? } ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $( $variant, )*
            Other(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $( $name::$variant => $text, )*
                    $name::Other(s) => s.as_str(),
                }
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                match s.as_str() {
                    $( $text => $name::$variant, )*
                    _ => $name::Other(s),
                }
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name::from(s.to_string())
            }
        }

        impl From<$name> for String {
            fn from(v: $name) -> Self {
                match v {
                    $name::Other(s) => s,
                    other => other.as_str().to_string(),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use string_enum;

string_enum! {
    /// How a node's `value` is interpreted.
    DataType {
        String => "String",
        Integer => "Integer",
        Number => "Number",
        Boolean => "Boolean",
        Object => "Object",
        Array => "Array",
    }
}

impl DataType {
    /// Infers the data type of a raw JSON value. `null` falls back to `String`.
    pub fn infer(value: &Value) -> Self {
        match value {
            Value::Array(_) => DataType::Array,
            Value::Object(_) => DataType::Object,
            Value::Number(_) => DataType::Number,
            Value::Bool(_) => DataType::Boolean,
            Value::String(_) | Value::Null => DataType::String,
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, DataType::Object | DataType::Array)
    }
}

string_enum! {
    /// Provenance of a node's value.
    FromKind {
        Input => "Input",
        Reference => "Reference",
        Expand => "Expand",
    }
}

impl FromKind {
    /// `Reference` is matched case-insensitively; older documents wrote `reference`.
    pub fn is_reference(&self) -> bool {
        match self {
            FromKind::Reference => true,
            FromKind::Other(s) => s.eq_ignore_ascii_case("reference"),
            _ => false,
        }
    }
}

/// The `value` slot of a config node.
///
/// A JSON array of objects is read as a sequence of child nodes; every other
/// JSON value (scalars, plain objects, arrays of scalars) stays raw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Nodes(Vec<ConfigNode>),
    Raw(Value),
}

impl ConfigValue {
    pub fn as_nodes(&self) -> Option<&Vec<ConfigNode>> {
        match self {
            ConfigValue::Nodes(nodes) => Some(nodes),
            ConfigValue::Raw(_) => None,
        }
    }

    pub fn as_nodes_mut(&mut self) -> Option<&mut Vec<ConfigNode>> {
        match self {
            ConfigValue::Nodes(nodes) => Some(nodes),
            ConfigValue::Raw(_) => None,
        }
    }

    pub fn as_raw(&self) -> Option<&Value> {
        match self {
            ConfigValue::Raw(v) => Some(v),
            ConfigValue::Nodes(_) => None,
        }
    }
}

impl From<Value> for ConfigValue {
    fn from(value: Value) -> Self {
        ConfigValue::Raw(value)
    }
}

impl From<Vec<ConfigNode>> for ConfigValue {
    fn from(nodes: Vec<ConfigNode>) -> Self {
        ConfigValue::Nodes(nodes)
    }
}

/// The universal element of a JadeConfig tree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(remote = "Self")]
#[serde(rename_all = "camelCase")]
pub struct ConfigNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<FromKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ConfigValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_node: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_modifiable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip)]
    pub presence: Presence,
    /// Keys this crate does not interpret; preserved as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

keep_presence!(ConfigNode);

impl ConfigNode {
    /// A literal, editable value.
    pub fn input(id: String, name: &str, data_type: DataType, value: Value) -> Self {
        Self {
            id: Some(id),
            name: Some(name.to_string()),
            data_type: Some(data_type),
            from: Some(FromKind::Input),
            value: Some(ConfigValue::Raw(value)),
            ..Default::default()
        }
    }

    /// A structural container whose value is a sequence of child nodes.
    pub fn expand(id: String, name: Option<&str>, data_type: DataType, children: Vec<ConfigNode>) -> Self {
        Self {
            id: Some(id),
            name: name.map(str::to_string),
            data_type: Some(data_type),
            from: Some(FromKind::Expand),
            value: Some(ConfigValue::Nodes(children)),
            ..Default::default()
        }
    }

    /// An unresolved reference placeholder.
    pub fn reference(id: String, name: Option<&str>, data_type: DataType) -> Self {
        Self {
            id: Some(id),
            name: name.map(str::to_string),
            data_type: Some(data_type),
            from: Some(FromKind::Reference),
            value: Some(ConfigValue::Raw(Value::String(String::new()))),
            reference_node: Some(String::new()),
            reference_id: Some(String::new()),
            reference_key: Some(String::new()),
            ..Default::default()
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }

    pub fn is_reference(&self) -> bool {
        self.from.as_ref().is_some_and(FromKind::is_reference)
    }

    pub fn is_expand(&self) -> bool {
        self.from == Some(FromKind::Expand)
    }

    pub fn children(&self) -> Option<&Vec<ConfigNode>> {
        self.value.as_ref().and_then(ConfigValue::as_nodes)
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<ConfigNode>> {
        self.value.as_mut().and_then(ConfigValue::as_nodes_mut)
    }

    pub fn child(&self, name: &str) -> Option<&ConfigNode> {
        self.children()?.iter().find(|c| c.has_name(name))
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut ConfigNode> {
        self.children_mut()?.iter_mut().find(|c| c.has_name(name))
    }

    /// The raw JSON value, if this node is not a container.
    pub fn raw_value(&self) -> Option<&Value> {
        self.value.as_ref().and_then(ConfigValue::as_raw)
    }

    /// Sets a single top-level field by its serialized key.
    ///
    /// `id` is immutable once assigned; a change to it is ignored.
    pub fn set_field(&mut self, key: &str, value: Value) -> Result<(), serde_json::Error> {
        if key == "id" && self.id.is_some() {
            tracing::warn!(node = ?self.id, "ignoring attempt to change a node id");
            return Ok(());
        }
        let mut fields = match serde_json::to_value(&*self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        fields.insert(key.to_string(), value);
        *self = serde_json::from_value(Value::Object(fields))?;
        Ok(())
    }

    /// Copies every field `top` carries over this node, extra keys included.
    pub fn overlay(&mut self, mut top: ConfigNode) {
        self.presence.absorb(std::mem::take(&mut top.presence));
        macro_rules! take {
            ($($field:ident),*) => { $( if top.$field.is_some() { self.$field = top.$field; } )* };
        }
        take!(
            id,
            name,
            data_type,
            from,
            value,
            reference_node,
            reference_id,
            reference_key,
            is_required,
            is_visible,
            editable,
            disable_modifiable,
            display_name,
            description
        );
        self.extra.extend(top.extra);
    }

    /// Whether the serialized form of this node contains `key`.
    pub fn has_field(&self, key: &str) -> bool {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map.contains_key(key),
            _ => false,
        }
    }
}

/// Finds a node by name in a sibling list.
pub fn find_named<'a>(nodes: &'a [ConfigNode], name: &str) -> Option<&'a ConfigNode> {
    nodes.iter().find(|n| n.has_name(name))
}

/// Mutable counterpart of [`find_named`].
pub fn find_named_mut<'a>(nodes: &'a mut [ConfigNode], name: &str) -> Option<&'a mut ConfigNode> {
    nodes.iter_mut().find(|n| n.has_name(name))
}
