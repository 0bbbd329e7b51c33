//! Component adapters: one per node type, each owning a default-config factory
//! and a reducer registry.

use crate::error::{GraphError, PathError, ReduceError};
use crate::ids::{IdGenerator, UuidGenerator};
use crate::model::{RootConfig, Shape};
use crate::reducer::{Action, ReducerRegistry, apply_system_update};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

pub mod intelligent_form;
pub mod knowledge_retrieval;
pub mod parallel;
pub mod template;
pub mod variable_updater;

pub use intelligent_form::{FormConfig, FormType, IntelligentFormComponent};
pub use knowledge_retrieval::KnowledgeRetrievalComponent;
pub use parallel::ParallelComponent;
pub use template::{TemplateComponent, TemplateKind};
pub use variable_updater::VariableUpdaterComponent;

/// The per-node-type adapter protocol.
pub trait Component: Send + Sync {
    type Config: Clone + Serialize + DeserializeOwned;

    /// The `componentName` this adapter serves.
    fn name(&self) -> &str;

    /// A fresh canonical config. Only the ids differ between calls.
    fn default_config(&self) -> Self::Config;

    /// The config this adapter was constructed from, if any.
    fn existing_config(&self) -> Option<&Self::Config>;

    fn registry(&self) -> &ReducerRegistry<Self::Config>;

    fn ids(&self) -> &dyn IdGenerator;

    fn jade_config(&self) -> Self::Config {
        self.existing_config()
            .cloned()
            .unwrap_or_else(|| self.default_config())
    }

    /// Runs the registered reducer for the action's kind, falling back to the
    /// base handler which only knows `system_update`.
    fn reduce(&self, config: &Self::Config, action: &Action) -> Result<Self::Config, ReduceError> {
        let kind = action.kind();
        if let Some(reducer) = self.registry().get(kind) {
            tracing::debug!(component = self.name(), action = %kind, "dispatching action");
            return reducer.reduce(config, action, self.ids());
        }
        match action {
            Action::SystemUpdate { changes } => apply_system_update(config, changes),
            _ => Err(ReduceError::UnknownAction(kind.to_string())),
        }
    }
}

/// Where a component's config lives inside a shape.
pub trait ConfigSlot: Sized {
    fn read(shape: &Shape) -> Option<Self>;
    fn write(self, shape: &mut Shape) -> Result<(), GraphError>;
}

impl ConfigSlot for RootConfig {
    fn read(shape: &Shape) -> Option<Self> {
        shape.root_config().cloned()
    }

    fn write(self, shape: &mut Shape) -> Result<(), GraphError> {
        let location = shape.root_location();
        let shape_id = shape.id.clone();
        let slot = shape.root_config_mut().ok_or(PathError::CorruptShape {
            shape_id,
            location: location.to_string(),
        })?;
        *slot = self;
        Ok(())
    }
}

/// The adapter for node types without reducers of their own.
pub struct DefaultComponent {
    existing: Option<RootConfig>,
    registry: ReducerRegistry<RootConfig>,
    ids: Arc<dyn IdGenerator>,
}

impl DefaultComponent {
    pub fn new(existing: Option<RootConfig>) -> Self {
        Self::with_ids(existing, Arc::new(UuidGenerator))
    }

    pub fn with_ids(existing: Option<RootConfig>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            existing,
            registry: ReducerRegistry::empty(),
            ids,
        }
    }
}

impl Component for DefaultComponent {
    type Config = RootConfig;

    fn name(&self) -> &str {
        "defaultComponent"
    }

    fn default_config(&self) -> RootConfig {
        RootConfig::default()
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
