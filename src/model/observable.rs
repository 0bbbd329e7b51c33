use super::node::DataType;
use serde::{Deserialize, Serialize};

/// An entry of the editor's observable registry: a value one node publishes
/// for others to reference. The registry itself lives with the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservableRecord {
    pub node_id: String,
    pub observable_id: String,
    pub value: Option<String>,
    #[serde(rename = "type")]
    pub data_type: Option<DataType>,
    pub parent_id: Option<String>,
}
