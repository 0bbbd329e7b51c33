//! # jade-graph - Config Trees and Migrations for Flow Graphs
//!
//! **jade-graph** is the data core of a node-based flow editor. Every node on a
//! graph carries a tree of typed config nodes (its *JadeConfig*); this crate
//! reads and writes those trees by path, dispatches editor actions through
//! per-node-type reducers, and upgrades documents saved by older editors.
//!
//! ## Core Workflow
//!
//! 1.  **Load**: Parse a serialized graph with [`GraphOperator::builder`], optionally
//!     running the compatibility chain so every shape matches the current schema.
//! 2.  **Read and write by path**: `config(&[shapeId, name, ...])` returns a flattened
//!     view; `update(keys, value)` merges plain JSON back into the tree.
//! 3.  **Dispatch actions**: Pick the [`component::Component`] adapter for a node type
//!     and reduce an [`reducer::Action`] against the shape's config.
//! 4.  **Save**: `graph()` serializes the document, unknown fields included.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use jade_graph::prelude::*;
//! use serde_json::json;
//!
//! fn main() -> Result<()> {
//!     let json = std::fs::read_to_string("path/to/graph.json")?;
//!     let mut operator = GraphOperator::builder(&json).normalize(true).build()?;
//!
//!     if let Some(report) = operator.compatibility_report() {
//!         println!("normalized {} shapes", report.processed);
//!     }
//!
//!     operator.update(&["llm1", "temperature"], &json!(0.3))?;
//!     let view = operator.config(&["llm1", "temperature"])?;
//!     println!("{:?}", view.map(|v| v.value));
//!
//!     let knowledge = KnowledgeRetrievalComponent::new(None);
//!     let action = Action::ChangeRerankParam {
//!         name: "enableRerank".to_string(),
//!         value: json!(true),
//!     };
//!     operator.dispatch("kr1", &knowledge, &action)?;
//!
//!     std::fs::write("path/to/graph.json", operator.graph()?)?;
//!     Ok(())
//! }
//! ```

pub mod compat;
pub mod component;
pub mod defaults;
pub mod error;
pub mod i18n;
pub mod ids;
pub mod model;
pub mod operator;
pub mod path;
pub mod prelude;
pub mod reducer;

pub use operator::GraphOperator;
