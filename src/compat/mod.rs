//! Compatibility processing: brings documents saved by older editors up to the
//! current schema before anything else reads them.
//!
//! Each page is indexed first ([`PageIndex`]), then every shape is handed, in
//! shape order, to the processor registered for its type. Processors are a
//! base layer (defaults every shape needs) plus an optional type-specific
//! layer invoked after it. Effects on other shapes are returned as
//! [`FollowUp`]s and applied once the processor is done.

use crate::error::CompatibilityError;
use crate::i18n::{Localizer, NoLocalizer};
use crate::ids::{IdGenerator, UuidGenerator};
use crate::model::{FlowType, GraphDocument, Shape, ShapeKind};
use ahash::AHashMap;
use std::sync::Arc;

pub mod processors;
pub mod reach;

pub use reach::PageIndex;

/// Everything a processor may read besides the shape it is processing.
pub struct ProcessContext<'a> {
    pub page: &'a PageIndex,
    pub flow_type: Option<&'a FlowType>,
    pub localizer: &'a dyn Localizer,
    pub ids: &'a dyn IdGenerator,
}

/// A change to sibling shapes requested by a processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowUp {
    /// Every `llmNodeState` shape of the page gets `enableLog = true` unless it
    /// already has an `enableLog` input.
    EnableLlmLogs,
}

pub trait ShapeProcessor: Send + Sync {
    fn process(&self, shape: &mut Shape, ctx: &ProcessContext<'_>) -> Result<Vec<FollowUp>, CompatibilityError>;
}

/// Defaults applied to every shape: `runnable` becomes `true` when absent.
#[derive(Debug, Default, Clone, Copy)]
pub struct BaseProcessor;

impl ShapeProcessor for BaseProcessor {
    fn process(&self, shape: &mut Shape, _: &ProcessContext<'_>) -> Result<Vec<FollowUp>, CompatibilityError> {
        if shape.runnable.is_none() {
            shape.runnable = Some(true);
        }
        Ok(Vec::new())
    }
}

/// A type-specific layer run after the base processor.
pub struct Layered {
    base: BaseProcessor,
    layer: Box<dyn ShapeProcessor>,
}

impl Layered {
    pub fn new(layer: impl ShapeProcessor + 'static) -> Self {
        Self {
            base: BaseProcessor,
            layer: Box::new(layer),
        }
    }
}

impl ShapeProcessor for Layered {
    fn process(&self, shape: &mut Shape, ctx: &ProcessContext<'_>) -> Result<Vec<FollowUp>, CompatibilityError> {
        let mut follow_ups = self.base.process(shape, ctx)?;
        follow_ups.extend(self.layer.process(shape, ctx)?);
        Ok(follow_ups)
    }
}

/// What a chain run did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompatibilityReport {
    pub processed: usize,
    pub corrupt: Vec<CompatibilityError>,
}

impl CompatibilityReport {
    pub fn is_clean(&self) -> bool {
        self.corrupt.is_empty()
    }

    /// Ids of the shapes that could not be normalized.
    pub fn corrupt_shape_ids(&self) -> Vec<&str> {
        self.corrupt
            .iter()
            .map(|e| match e {
                CompatibilityError::CorruptShape { shape_id, .. } => shape_id.as_str(),
            })
            .collect()
    }
}

/// The processor registry plus the options every processor reads.
pub struct CompatibilityChain {
    processors: AHashMap<ShapeKind, Box<dyn ShapeProcessor>>,
    fallback: BaseProcessor,
    flow_type: Option<FlowType>,
    localizer: Arc<dyn Localizer>,
    ids: Arc<dyn IdGenerator>,
}

impl Default for CompatibilityChain {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl CompatibilityChain {
    pub fn builder() -> CompatibilityChainBuilder {
        CompatibilityChainBuilder::default()
    }

    /// Normalizes every page of `document` in place.
    pub fn run(&self, document: &mut GraphDocument) -> CompatibilityReport {
        let flow_type = self.flow_type.clone().or_else(|| document.flow_type.clone());
        let mut report = CompatibilityReport::default();

        for page in document.pages.iter_mut() {
            let index = PageIndex::build(&page.shapes);
            let ctx = ProcessContext {
                page: &index,
                flow_type: flow_type.as_ref(),
                localizer: self.localizer.as_ref(),
                ids: self.ids.as_ref(),
            };

            for position in 0..page.shapes.len() {
                let result = {
                    let shape = &mut page.shapes[position];
                    let processor: &dyn ShapeProcessor = match self.processors.get(&shape.kind) {
                        Some(p) => p.as_ref(),
                        None => &self.fallback,
                    };
                    processor.process(shape, &ctx)
                };
                report.processed += 1;

                match result {
                    Ok(follow_ups) => {
                        for follow_up in follow_ups {
                            apply_follow_up(&follow_up, &mut page.shapes, &index, self.ids.as_ref());
                        }
                    }
                    Err(error) => {
                        tracing::warn!(%error, "skipping corrupt shape");
                        report.corrupt.push(error);
                    }
                }
            }
        }

        tracing::info!(
            processed = report.processed,
            corrupt = report.corrupt.len(),
            "compatibility processing finished"
        );
        report
    }
}

fn apply_follow_up(follow_up: &FollowUp, shapes: &mut [Shape], index: &PageIndex, ids: &dyn IdGenerator) {
    match follow_up {
        FollowUp::EnableLlmLogs => {
            for position in index.positions_of(&ShapeKind::Llm) {
                let Some(entity) = shapes.get_mut(position).and_then(Shape::root_config_mut) else {
                    tracing::debug!(position, "llm shape has no jober entity; enableLog not added");
                    continue;
                };
                if entity.input("enableLog").is_none() {
                    entity.input_params.push(crate::defaults::enable_log(ids, true));
                }
            }
        }
    }
}

/// Configures a [`CompatibilityChain`]; starts with every built-in processor.
pub struct CompatibilityChainBuilder {
    processors: AHashMap<ShapeKind, Box<dyn ShapeProcessor>>,
    flow_type: Option<FlowType>,
    localizer: Arc<dyn Localizer>,
    ids: Arc<dyn IdGenerator>,
}

impl Default for CompatibilityChainBuilder {
    fn default() -> Self {
        let mut processors = AHashMap::new();
        processors::register_default_processors(&mut processors);
        Self {
            processors,
            flow_type: None,
            localizer: Arc::new(NoLocalizer),
            ids: Arc::new(UuidGenerator),
        }
    }
}

impl CompatibilityChainBuilder {
    /// Overrides the document's own `flowType`.
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

    /// Registers a processor for `kind`, replacing the built-in one. The base
    /// layer is not added implicitly; wrap the processor in [`Layered`] to keep it.
    pub fn with_processor(mut self, kind: ShapeKind, processor: impl ShapeProcessor + 'static) -> Self {
        self.processors.insert(kind, Box::new(processor));
        self
    }

    pub fn build(self) -> CompatibilityChain {
        CompatibilityChain {
            processors: self.processors,
            fallback: BaseProcessor,
            flow_type: self.flow_type,
            localizer: self.localizer,
            ids: self.ids,
        }
    }
}
