//! The graph operator: a session over one serialized graph document.
//!
//! The operator owns the parsed document. Reads and writes address the first
//! page's shapes by id through a [`ShapeIndex`]; compatibility processing, when
//! requested, finishes before the operator is handed out.

use crate::compat::{CompatibilityChain, CompatibilityReport, PageIndex};
use crate::component::{Component, ConfigSlot};
use crate::error::{DocumentError, GraphError};
use crate::i18n::{Localizer, NoLocalizer};
use crate::ids::{IdGenerator, UuidGenerator};
use crate::model::{ConfigNode, ConfigView, FlowType, GraphDocument, ObservableRecord, Shape, ShapeKind};
use crate::path::{ConfigMutator, PathResolver, Resolved, ShapeIndex, index_shapes};
use crate::reducer::Action;
use serde_json::Value;
use std::sync::Arc;

pub mod validation;

pub use validation::{FormValidation, NodeValidation, ReferenceExtractor, ValidationExtractor};

pub struct GraphOperator {
    document: GraphDocument,
    index: ShapeIndex,
    ids: Arc<dyn IdGenerator>,
    extractor: Box<dyn ValidationExtractor>,
    report: Option<CompatibilityReport>,
}

pub struct GraphOperatorBuilder {
    json: String,
    flow_type: Option<FlowType>,
    localizer: Arc<dyn Localizer>,
    ids: Arc<dyn IdGenerator>,
    extractor: Box<dyn ValidationExtractor>,
    normalize: bool,
}

impl GraphOperatorBuilder {
    pub fn new(json: &str) -> Self {
        Self {
            json: json.to_string(),
            flow_type: None,
            localizer: Arc::new(NoLocalizer),
            ids: Arc::new(UuidGenerator),
            extractor: Box::new(ReferenceExtractor),
            normalize: false,
        }
    }

    /// Overrides the document's `flowType` during normalization.
    pub fn with_flow_type(mut self, flow_type: FlowType) -> Self {
        self.flow_type = Some(flow_type);
        self
    }

    pub fn with_localizer(mut self, localizer: Arc<dyn Localizer>) -> Self {
        self.localizer = localizer;
        self
    }

    pub fn with_ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_extractor(mut self, extractor: Box<dyn ValidationExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Runs the compatibility chain over the document before returning it.
    pub fn normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn build(self) -> Result<GraphOperator, GraphError> {
        let mut document = GraphDocument::from_json(&self.json)?;

        let report = if self.normalize {
            let mut chain = CompatibilityChain::builder()
                .with_localizer(self.localizer)
                .with_ids(Arc::clone(&self.ids));
            if let Some(flow_type) = self.flow_type {
                chain = chain.with_flow_type(flow_type);
            }
            Some(chain.build().run(&mut document))
        } else {
            None
        };

        let index = document
            .pages
            .first()
            .map(|page| index_shapes(&page.shapes))
            .ok_or(DocumentError::MissingPage)?;

        Ok(GraphOperator {
            document,
            index,
            ids: self.ids,
            extractor: self.extractor,
            report,
        })
    }
}

impl GraphOperator {
    /// Parses `json` without normalizing it.
    pub fn new(json: &str) -> Result<Self, GraphError> {
        Self::builder(json).build()
    }

    pub fn builder(json: &str) -> GraphOperatorBuilder {
        GraphOperatorBuilder::new(json)
    }

    fn shapes(&self) -> &[Shape] {
        // The builder rejects documents without pages.
        self.document
            .pages
            .first()
            .map(|p| p.shapes.as_slice())
            .unwrap_or(&[])
    }

    /// The flattened config at `keys`, `None` when nothing is there.
    pub fn config<S: AsRef<str>>(&self, keys: &[S]) -> Result<Option<ConfigView>, GraphError> {
        let keys = owned_keys(keys);
        let resolver = PathResolver::new(self.shapes(), &self.index);
        Ok(match resolver.resolve(&keys)? {
            Resolved::Root(inputs) => Some(ConfigView::of_root(inputs)),
            Resolved::Node(node) => Some(ConfigView::of(node)),
            Resolved::Absent => None,
        })
    }

    /// Writes `value` at `keys`, creating the leaf when it is missing.
    pub fn update<S: AsRef<str>>(&mut self, keys: &[S], value: &Value) -> Result<(), GraphError> {
        let keys = owned_keys(keys);
        let page = self.document.pages.first_mut().ok_or(DocumentError::MissingPage)?;
        ConfigMutator::new(self.ids.as_ref()).update(&mut page.shapes, &self.index, &keys, value)?;
        Ok(())
    }

    /// The document serialized back to JSON.
    pub fn graph(&self) -> Result<String, GraphError> {
        Ok(self.document.to_json()?)
    }

    pub fn document(&self) -> &GraphDocument {
        &self.document
    }

    pub fn into_document(self) -> GraphDocument {
        self.document
    }

    /// Validation info for every shape, grouped by shape type.
    pub fn forms_to_validate(&self) -> Vec<FormValidation> {
        validation::group_by_type(self.shapes(), self.extractor.as_ref())
    }

    /// `flowMeta.inputParams` of every start node.
    pub fn start_node_input_params(&self) -> Vec<&[ConfigNode]> {
        self.shapes()
            .iter()
            .filter(|s| s.kind == ShapeKind::Start)
            .filter_map(|s| s.flow_meta.as_ref()?.input_params.as_deref())
            .collect()
    }

    pub fn shape_ids_by_type(&self, kind: &ShapeKind) -> Vec<&str> {
        self.shapes()
            .iter()
            .filter(|s| &s.kind == kind)
            .map(|s| s.id.as_str())
            .collect()
    }

    pub fn shape(&self, id: &str) -> Option<&Shape> {
        self.index.get(id).and_then(|&i| self.shapes().get(i))
    }

    /// Every shape on some `jadeEvent` path from `src` to `target`.
    pub fn nodes_between(&self, src: &str, target: &str) -> Vec<String> {
        PageIndex::build(self.shapes()).nodes_between(src, target)
    }

    /// The result of load-time normalization, if it ran.
    pub fn compatibility_report(&self) -> Option<&CompatibilityReport> {
        self.report.as_ref()
    }

    /// Reduces `action` against the shape's config (or the component's default
    /// when the shape has none) and writes the result back into the shape.
    pub fn dispatch<K>(&mut self, shape_id: &str, component: &K, action: &Action) -> Result<K::Config, GraphError>
    where
        K: Component,
        K::Config: ConfigSlot,
    {
        let position = *self.index.get(shape_id).ok_or_else(|| {
            crate::error::PathError::invalid(&[shape_id.to_string()], format!("unknown shape '{}'", shape_id))
        })?;
        let shape = self
            .document
            .pages
            .first_mut()
            .and_then(|p| p.shapes.get_mut(position))
            .ok_or(DocumentError::MissingPage)?;

        let current = K::Config::read(shape).unwrap_or_else(|| component.jade_config());
        let next = component.reduce(&current, action)?;
        next.clone().write(shape)?;
        tracing::debug!(shape = shape_id, action = %action.kind(), "dispatched action");
        Ok(next)
    }

    /// Every output a shape publishes, flattened, for an observable registry.
    pub fn observables(&self) -> Vec<ObservableRecord> {
        let mut records = Vec::new();
        for shape in self.shapes().iter().filter(|s| !s.is_edge()) {
            if let Some(config) = shape.root_config() {
                collect_observables(&shape.id, &config.output_params, None, &mut records);
            }
        }
        records
    }
}

fn collect_observables(
    node_id: &str,
    outputs: &[ConfigNode],
    parent_id: Option<&str>,
    records: &mut Vec<ObservableRecord>,
) {
    for output in outputs {
        let Some(observable_id) = output.id() else {
            continue;
        };
        records.push(ObservableRecord {
            node_id: node_id.to_string(),
            observable_id: observable_id.to_string(),
            value: output.name.clone(),
            data_type: output.data_type.clone(),
            parent_id: parent_id.map(str::to_string),
        });
        if let Some(children) = output.children() {
            collect_observables(node_id, children, Some(observable_id), records);
        }
    }
}

fn owned_keys<S: AsRef<str>>(keys: &[S]) -> Vec<String> {
    keys.iter().map(|k| k.as_ref().to_string()).collect()
}
