//! Prelude module for convenient imports
//!
//! Re-exports the types most callers need: the operator, the config model,
//! actions and component adapters, and the error types.
//!
//! # Example
//!
//! ```rust,no_run
//! use jade_graph::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let json = std::fs::read_to_string("path/to/graph.json")?;
//! let operator = GraphOperator::new(&json)?;
//! for llm in operator.shape_ids_by_type(&ShapeKind::Llm) {
//!     println!("{llm}: {:?}", operator.config(&[llm])?);
//! }
//! # Ok(())
//! # }
//! ```

// Session and migrations
pub use crate::compat::{CompatibilityChain, CompatibilityReport};
pub use crate::operator::{FormValidation, GraphOperator, ValidationExtractor};

// Config model
pub use crate::model::{ConfigNode, ConfigView, DataType, FlowType, FromKind, GraphDocument, RootConfig, Shape, ShapeKind};

// Actions and adapters
pub use crate::component::{
    Component, DefaultComponent, FormConfig, IntelligentFormComponent, KnowledgeRetrievalComponent,
    ParallelComponent, TemplateComponent, TemplateKind, VariableUpdaterComponent,
};
pub use crate::reducer::{Action, ActionKind, FieldChange, Reducer, ReducerRegistry};

// Collaborators
pub use crate::i18n::{Localizer, MapLocalizer, NoLocalizer};
pub use crate::ids::{IdGenerator, SequentialGenerator, UuidGenerator};

// Error types
pub use crate::error::{CompatibilityError, DocumentError, GraphError, PathError, ReduceError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
