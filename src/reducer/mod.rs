//! Reducers: pure `(config, action) -> config` transitions, registered per
//! component and looked up by [`ActionKind`].

use crate::error::ReduceError;
use crate::ids::IdGenerator;
use ahash::AHashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub mod action;
pub mod util;

pub use action::{Action, ActionKind, FieldChange, VariableRef, VariableUpdate};

/// Defines the contract for handling one [`ActionKind`].
///
/// A reducer receives the config by shared reference and returns a new one;
/// it cannot change the config it was given.
pub trait Reducer<C>: Send + Sync {
    fn action_kind(&self) -> ActionKind;
    fn reduce(&self, config: &C, action: &Action, ids: &dyn IdGenerator) -> Result<C, ReduceError>;
}

/// Declares unit reducer structs that forward to plain functions, plus a
/// `builtin_reducers()` constructor returning all of them.
macro_rules! define_reducers {
    ( $config:ty ; $( $name:ident => $kind:ident : $func:path ),* $(,)? ) => {
        $(
            pub struct $name;

            impl $crate::reducer::Reducer<$config> for $name {
                fn action_kind(&self) -> $crate::reducer::ActionKind {
                    $crate::reducer::ActionKind::$kind
                }

                fn reduce(
                    &self,
                    config: &$config,
                    action: &$crate::reducer::Action,
                    ids: &dyn $crate::ids::IdGenerator,
                ) -> Result<$config, $crate::error::ReduceError> {
                    $func(config, action, ids)
                }
            }
        )*

        pub(crate) fn builtin_reducers() -> Vec<Box<dyn $crate::reducer::Reducer<$config>>> {
            vec![ $( Box::new($name), )* ]
        }
    };
}

pub(crate) use define_reducers;

/// A mapping from action kinds to the reducers handling them.
pub struct ReducerRegistry<C> {
    reducers: AHashMap<ActionKind, Box<dyn Reducer<C>>>,
}

impl<C> ReducerRegistry<C> {
    pub fn builder() -> ReducerRegistryBuilder<C> {
        ReducerRegistryBuilder {
            reducers: AHashMap::new(),
        }
    }

    pub fn empty() -> Self {
        Self {
            reducers: AHashMap::new(),
        }
    }

    /// Builds a registry from a component's built-in reducers.
    pub(crate) fn from_builtin(reducers: Vec<Box<dyn Reducer<C>>>) -> Self {
        let mut registry = Self::empty();
        for reducer in reducers {
            let kind = reducer.action_kind();
            let previous = registry.reducers.insert(kind, reducer);
            debug_assert!(previous.is_none(), "built-in reducer for {} declared twice", kind);
        }
        registry
    }

    /// Adds a reducer; a second reducer for the same kind is rejected.
    pub fn register(&mut self, reducer: Box<dyn Reducer<C>>) -> Result<(), ReduceError> {
        let kind = reducer.action_kind();
        if self.reducers.contains_key(&kind) {
            return Err(ReduceError::DuplicateReducer(kind));
        }
        self.reducers.insert(kind, reducer);
        Ok(())
    }

    pub fn get(&self, kind: ActionKind) -> Option<&dyn Reducer<C>> {
        self.reducers.get(&kind).map(|r| r.as_ref())
    }

    pub fn contains(&self, kind: ActionKind) -> bool {
        self.reducers.contains_key(&kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = ActionKind> + '_ {
        self.reducers.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.reducers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reducers.is_empty()
    }
}

/// Collects reducers before freezing them into a [`ReducerRegistry`].
pub struct ReducerRegistryBuilder<C> {
    reducers: AHashMap<ActionKind, Box<dyn Reducer<C>>>,
}

impl<C> ReducerRegistryBuilder<C> {
    pub fn with_reducer(mut self, reducer: impl Reducer<C> + 'static) -> Result<Self, ReduceError> {
        let kind = reducer.action_kind();
        if self.reducers.contains_key(&kind) {
            return Err(ReduceError::DuplicateReducer(kind));
        }
        self.reducers.insert(kind, Box::new(reducer));
        Ok(self)
    }

    pub fn build(self) -> ReducerRegistry<C> {
        ReducerRegistry {
            reducers: self.reducers,
        }
    }
}

/// The error a reducer returns when handed an action of another kind.
pub(crate) fn mismatched(action: &Action, expected: ActionKind) -> ReduceError {
    ReduceError::InvalidPayload {
        kind: expected.to_string(),
        message: format!("reducer received a '{}' action", action.kind()),
    }
}

/// The base handler for `system_update`: assigns each `{key, value}` to the
/// config's top-level field of that name.
pub fn apply_system_update<C>(config: &C, changes: &[FieldChange]) -> Result<C, ReduceError>
where
    C: Serialize + DeserializeOwned,
{
    let mut fields = match serde_json::to_value(config) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return Err(ReduceError::InvalidConfig("config is not a JSON object".to_string())),
        Err(e) => return Err(ReduceError::InvalidConfig(e.to_string())),
    };
    for change in changes {
        tracing::debug!(key = %change.key, "system update");
        fields.insert(change.key.clone(), change.value.clone());
    }
    serde_json::from_value(Value::Object(fields)).map_err(|e| ReduceError::InvalidPayload {
        kind: ActionKind::SystemUpdate.to_string(),
        message: e.to_string(),
    })
}
