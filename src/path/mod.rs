//! Path-addressed access to config nodes.
//!
//! A path is `[shapeId, name1, name2, ...]`. The shape id selects a shape and,
//! through its type, the root input list to start from; every further key
//! selects a child by `name`.

use crate::error::PathError;
use crate::model::{ConfigNode, Shape, find_named};
use ahash::AHashMap;

mod mutator;

pub use mutator::ConfigMutator;

/// Maps shape ids to their position in a page's shape list.
pub type ShapeIndex = AHashMap<String, usize>;

/// Builds the id → position index for a page's shapes.
pub fn index_shapes(shapes: &[Shape]) -> ShapeIndex {
    shapes
        .iter()
        .enumerate()
        .map(|(i, s)| (s.id.clone(), i))
        .collect()
}

/// The outcome of resolving a path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved<'a> {
    /// The path named only a shape; this is its root input list.
    Root(&'a [ConfigNode]),
    Node(&'a ConfigNode),
    /// A traversal step found no child with the requested name.
    Absent,
}

impl<'a> Resolved<'a> {
    pub fn node(self) -> Option<&'a ConfigNode> {
        match self {
            Resolved::Node(n) => Some(n),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Resolved::Absent)
    }
}

/// Read-only resolver over one page's shapes.
pub struct PathResolver<'a> {
    shapes: &'a [Shape],
    index: &'a ShapeIndex,
}

impl<'a> PathResolver<'a> {
    pub fn new(shapes: &'a [Shape], index: &'a ShapeIndex) -> Self {
        Self { shapes, index }
    }

    /// Looks a shape up by id.
    pub fn shape(&self, keys: &[String]) -> Result<&'a Shape, PathError> {
        let shape_id = keys
            .first()
            .ok_or_else(|| PathError::invalid(keys, "path cannot be empty"))?;
        self.index
            .get(shape_id)
            .and_then(|&i| self.shapes.get(i))
            .ok_or_else(|| PathError::invalid(keys, format!("unknown shape '{}'", shape_id)))
    }

    /// Resolves `keys` to a node. Absence of an intermediate or final child is
    /// reported as [`Resolved::Absent`], not as an error.
    pub fn resolve(&self, keys: &[String]) -> Result<Resolved<'a>, PathError> {
        let shape = self.shape(keys)?;
        let inputs = shape.root_inputs().ok_or_else(|| PathError::CorruptShape {
            shape_id: shape.id.clone(),
            location: shape.root_location().to_string(),
        })?;

        let resolved = walk(inputs, &keys[1..]);
        if resolved.is_absent() {
            tracing::debug!(?keys, "path resolved to nothing");
        }
        Ok(resolved)
    }
}

fn walk<'a>(inputs: &'a [ConfigNode], names: &[String]) -> Resolved<'a> {
    let Some((first, rest)) = names.split_first() else {
        return Resolved::Root(inputs);
    };
    let Some(mut node) = find_named(inputs, first) else {
        return Resolved::Absent;
    };
    for name in rest {
        match node.child(name) {
            Some(child) => node = child,
            None => return Resolved::Absent,
        }
    }
    Resolved::Node(node)
}

/// Walks `names` below `inputs` and returns the children of the last node.
pub(crate) fn container_mut<'a>(
    inputs: &'a mut Vec<ConfigNode>,
    names: &[String],
) -> Option<&'a mut Vec<ConfigNode>> {
    let mut nodes = inputs;
    for name in names {
        let current = nodes;
        let node = current.iter_mut().find(|n| n.has_name(name))?;
        nodes = node.children_mut()?;
    }
    Some(nodes)
}
