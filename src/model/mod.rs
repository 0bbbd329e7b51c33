pub mod document;
pub mod node;
pub mod observable;
pub mod presence;
pub mod root;
pub mod view;

pub use document::*;
pub use node::{ConfigNode, ConfigValue, DataType, FromKind, find_named, find_named_mut};
pub use observable::ObservableRecord;
pub use presence::Presence;
pub use root::*;
pub use view::{ConfigView, from_json, struct_to_config, to_struct};
