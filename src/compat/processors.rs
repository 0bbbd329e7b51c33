//! Type-specific compatibility layers, one per shape type that changed shape
//! over time. Each runs after [`BaseProcessor`](super::BaseProcessor).

use super::{FollowUp, Layered, ProcessContext, ShapeProcessor};
use crate::component::FormType;
use crate::defaults;
use crate::error::CompatibilityError;
use crate::model::{
    ConfigNode, DataType, FlowMeta, FlowType, FromKind, JobParam, RootConfig, Shape, ShapeKind, Task,
    find_named_mut,
};
use ahash::AHashMap;
use serde_json::Value;

const JOBER_ENTITY: &str = "flowMeta.jober.converter.entity";
const CALLBACK_ENTITY: &str = "flowMeta.callback.converter.entity";

/// Name of the input that marks an end node as a manual-check form end.
pub const END_FORM_ID: &str = "endFormId";

pub(crate) fn register_default_processors(processors: &mut AHashMap<ShapeKind, Box<dyn ShapeProcessor>>) {
    processors.insert(ShapeKind::Condition, Box::new(Layered::new(ConditionProcessor)));
    processors.insert(
        ShapeKind::QuestionClassification,
        Box::new(Layered::new(QuestionClassificationProcessor)),
    );
    processors.insert(ShapeKind::Loop, Box::new(Layered::new(LoopProcessor)));
    processors.insert(ShapeKind::ManualCheck, Box::new(Layered::new(ManualCheckProcessor)));
    processors.insert(ShapeKind::IntelligentForm, Box::new(Layered::new(IntelligentFormProcessor)));
    processors.insert(ShapeKind::Start, Box::new(Layered::new(StartProcessor)));
    processors.insert(ShapeKind::End, Box::new(Layered::new(EndProcessor)));
    processors.insert(ShapeKind::Llm, Box::new(Layered::new(LlmProcessor)));
    processors.insert(ShapeKind::KnowledgeRetrieval, Box::new(Layered::new(KnowledgeProcessor)));
}

fn corrupt(shape: &Shape, missing: &str) -> CompatibilityError {
    CompatibilityError::CorruptShape {
        shape_id: shape.id.clone(),
        shape_type: shape.kind.to_string(),
        missing: missing.to_string(),
    }
}

fn flow_meta_mut(shape: &mut Shape) -> Result<&mut FlowMeta, CompatibilityError> {
    let missing = corrupt(shape, "flowMeta");
    shape.flow_meta.as_mut().ok_or(missing)
}

fn jober_entity_mut(shape: &mut Shape) -> Result<&mut RootConfig, CompatibilityError> {
    let missing = corrupt(shape, JOBER_ENTITY);
    shape.flow_meta.as_mut().and_then(FlowMeta::jober_entity_mut).ok_or(missing)
}

fn task_mut(shape: &mut Shape) -> Result<&mut Task, CompatibilityError> {
    let missing = corrupt(shape, "flowMeta.task");
    shape.flow_meta.as_mut().and_then(|m| m.task.as_mut()).ok_or(missing)
}

/// Pushes `make()` unless a node with the same name is already present.
fn ensure(nodes: &mut Vec<ConfigNode>, name: &str, make: impl FnOnce() -> ConfigNode) {
    if !nodes.iter().any(|n| n.has_name(name)) {
        nodes.push(make());
    }
}

pub struct ConditionProcessor;

impl ShapeProcessor for ConditionProcessor {
    fn process(&self, shape: &mut Shape, _: &ProcessContext<'_>) -> Result<Vec<FollowUp>, CompatibilityError> {
        let branches = shape
            .flow_meta
            .as_mut()
            .and_then(|m| m.condition_params.as_mut())
            .and_then(|c| c.branches.as_mut());
        for branch in branches.into_iter().flatten() {
            branch.runnable.get_or_insert(true);
        }
        Ok(Vec::new())
    }
}

pub struct QuestionClassificationProcessor;

impl ShapeProcessor for QuestionClassificationProcessor {
    fn process(&self, shape: &mut Shape, _: &ProcessContext<'_>) -> Result<Vec<FollowUp>, CompatibilityError> {
        let entity = jober_entity_mut(shape)?;
        let questions = entity
            .input_mut("classifyQuestionParam")
            .and_then(|p| p.child_mut("questionTypeList"))
            .and_then(ConfigNode::children_mut);
        for question in questions.into_iter().flatten() {
            question
                .extra
                .entry("runnable")
                .or_insert(Value::Bool(true));
        }
        Ok(Vec::new())
    }
}

/// Loop nodes gained a `context` parameter.
pub struct LoopProcessor;

impl ShapeProcessor for LoopProcessor {
    fn process(&self, shape: &mut Shape, ctx: &ProcessContext<'_>) -> Result<Vec<FollowUp>, CompatibilityError> {
        // Validate the envelope before touching anything.
        jober_entity_mut(shape)?;
        let missing = corrupt(shape, "flowMeta.jober");
        let jober = flow_meta_mut(shape)?.jober.as_mut().ok_or(missing)?;

        let params = jober
            .entity
            .get_or_insert_with(Default::default)
            .params
            .get_or_insert_with(Vec::new);
        if params.iter().any(|p| p.name.as_deref() == Some("context")) {
            return Ok(Vec::new());
        }
        params.push(JobParam::named("context"));

        if let Some(entity) = jober.converter.as_mut().and_then(|c| c.entity.as_mut()) {
            ensure(&mut entity.input_params, "context", || defaults::context_input(ctx.ids));
        }
        Ok(Vec::new())
    }
}

/// Manual-check nodes were folded into intelligent forms.
pub struct ManualCheckProcessor;

impl ShapeProcessor for ManualCheckProcessor {
    fn process(&self, shape: &mut Shape, _: &ProcessContext<'_>) -> Result<Vec<FollowUp>, CompatibilityError> {
        let task = task_mut(shape)?;
        task.form_type.get_or_insert_with(|| FormType::Manual.to_string());
        shape.kind = ShapeKind::IntelligentForm;
        shape.component_name = Some("intelligentFormComponent".to_string());
        Ok(Vec::new())
    }
}

pub struct IntelligentFormProcessor;

impl ShapeProcessor for IntelligentFormProcessor {
    fn process(&self, shape: &mut Shape, _: &ProcessContext<'_>) -> Result<Vec<FollowUp>, CompatibilityError> {
        task_mut(shape)?
            .form_type
            .get_or_insert_with(|| FormType::Orchestration.to_string());
        Ok(Vec::new())
    }
}

pub struct StartProcessor;

impl ShapeProcessor for StartProcessor {
    fn process(&self, shape: &mut Shape, ctx: &ProcessContext<'_>) -> Result<Vec<FollowUp>, CompatibilityError> {
        shape.deletable = Some(false);
        let items = flow_meta_mut(shape)?
            .input_params
            .as_mut()
            .and_then(|params| find_named_mut(params, "input"))
            .and_then(ConfigNode::children_mut);

        for item in items.into_iter().flatten() {
            if item.has_name("Question") {
                item.display_name = Some(ctx.localizer.localize("userQuestion"));
            }
            let required = *item.is_required.get_or_insert(true);
            item.is_visible.get_or_insert(required);
        }
        Ok(Vec::new())
    }
}

/// End nodes of chat flows report a structured object instead of a single
/// value; a flat primary output is wrapped into one.
pub struct EndProcessor;

impl ShapeProcessor for EndProcessor {
    fn process(&self, shape: &mut Shape, ctx: &ProcessContext<'_>) -> Result<Vec<FollowUp>, CompatibilityError> {
        shape.deletable = Some(true);
        if ctx.flow_type == Some(&FlowType::WorkFlow) {
            return Ok(Vec::new());
        }

        let missing = corrupt(shape, CALLBACK_ENTITY);
        let entity = shape
            .flow_meta
            .as_mut()
            .and_then(FlowMeta::callback_entity_mut)
            .ok_or(missing)?;
        let inputs = &mut entity.input_params;
        if inputs.is_empty() || inputs.iter().any(|i| i.has_name(END_FORM_ID)) {
            return Ok(Vec::new());
        }
        ensure(inputs, "enableLog", || defaults::enable_log(ctx.ids, false));

        let primary = &mut inputs[0];
        if primary.is_expand() {
            for child in primary.children_mut().into_iter().flatten() {
                child.is_required = Some(true);
            }
            return Ok(Vec::new());
        }

        wrap_primary(primary, ctx);
        tracing::debug!(shape = %shape.id, "wrapped flat end node output");
        Ok(vec![FollowUp::EnableLlmLogs])
    }
}

fn wrap_primary(primary: &mut ConfigNode, ctx: &ProcessContext<'_>) {
    let mut child = defaults::default_reference(ctx.ids);
    child.overlay(primary.clone());
    child.is_required = Some(true);

    primary.id = Some(ctx.ids.next_id());
    primary.from = Some(FromKind::Expand);
    primary.data_type = Some(DataType::Object);
    primary.editable = Some(false);
    primary.is_required = Some(false);
    primary.reference_node = Some(String::new());
    primary.reference_key = Some(String::new());
    primary.reference_id = Some(String::new());
    primary.value = Some(vec![child].into());
}

pub struct LlmProcessor;

impl ShapeProcessor for LlmProcessor {
    fn process(&self, shape: &mut Shape, ctx: &ProcessContext<'_>) -> Result<Vec<FollowUp>, CompatibilityError> {
        let entity = jober_entity_mut(shape)?;
        let ids = ctx.ids;

        let inputs = &mut entity.input_params;
        ensure(inputs, "maxMemoryRounds", || defaults::max_memory_rounds(ids));
        ensure(inputs, "knowledgeBases", || defaults::knowledge_bases(ids));
        ensure(inputs, "mcpServers", || defaults::mcp_servers(ids));
        ensure(inputs, "enableLog", || defaults::enable_log(ids, true));
        move_workflows_to_tools(inputs, ctx);

        if let Some(outputs) = entity.output_mut("output").and_then(ConfigNode::children_mut) {
            ensure(outputs, "reference", || defaults::llm_reference_output(ids));
        }
        entity
            .temp_reference
            .get_or_insert_with(|| Value::Object(Default::default()));
        Ok(Vec::new())
    }
}

fn move_workflows_to_tools(inputs: &mut Vec<ConfigNode>, ctx: &ProcessContext<'_>) {
    let moved = match find_named_mut(inputs, "workflows").and_then(ConfigNode::children_mut) {
        Some(workflows) if !workflows.is_empty() => std::mem::take(workflows),
        _ => return,
    };
    ensure(inputs, "tools", || defaults::tools(ctx.ids));
    if let Some(tools) = find_named_mut(inputs, "tools").and_then(ConfigNode::children_mut) {
        tools.extend(moved);
    }
}

pub struct KnowledgeProcessor;

impl ShapeProcessor for KnowledgeProcessor {
    fn process(&self, shape: &mut Shape, ctx: &ProcessContext<'_>) -> Result<Vec<FollowUp>, CompatibilityError> {
        let ids = ctx.ids;
        let entity = jober_entity_mut(shape)?;

        if let Some(option) = entity.input_mut("option").and_then(ConfigNode::children_mut) {
            ensure(option, "groupId", || defaults::group_id(ids));
            ensure(option, "knowledgeConfigId", || defaults::knowledge_config_id(ids));
            if let Some(rerank) = find_named_mut(option, "rerankParam").and_then(ConfigNode::children_mut) {
                if !rerank.iter().any(|r| r.has_name("accessInfo")) {
                    rerank.push(defaults::access_info(ids));
                    ensure(rerank, "rerankTopN", || defaults::rerank_top_n(ids));
                }
            }
            ensure(option, "extensions", || defaults::extensions(ids));
        }
        entity.input_params.retain(|i| !i.has_name("userId"));

        let params = shape
            .flow_meta
            .as_mut()
            .and_then(|m| m.jober.as_mut())
            .and_then(|j| j.entity.as_mut())
            .and_then(|e| e.params.as_mut());
        if let Some(params) = params {
            params.retain(|p| p.name.as_deref() != Some("userId"));
        }
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compat::PageIndex;
    use crate::i18n::MapLocalizer;
    use crate::ids::SequentialGenerator;
    use crate::model::{Callback, Converter, Jober};
    use serde_json::json;

    fn run(processor: &dyn ShapeProcessor, shape: &mut Shape, flow_type: Option<&FlowType>) -> Vec<FollowUp> {
        let index = PageIndex::default();
        let ids = SequentialGenerator::new("c");
        let localizer = MapLocalizer::new().with("userQuestion", "User question");
        let ctx = ProcessContext {
            page: &index,
            flow_type,
            localizer: &localizer,
            ids: &ids,
        };
        processor.process(shape, &ctx).unwrap()
    }

    fn with_jober(kind: ShapeKind, entity: RootConfig) -> Shape {
        Shape {
            flow_meta: Some(FlowMeta {
                jober: Some(Jober {
                    converter: Some(Converter::mapping(entity)),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Shape::new("n1", kind)
        }
    }

    fn end_node(inputs: Vec<ConfigNode>) -> Shape {
        Shape {
            flow_meta: Some(FlowMeta {
                callback: Some(Callback {
                    converter: Some(Converter::mapping(RootConfig::new(inputs, Vec::new()))),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Shape::new("end", ShapeKind::End)
        }
    }

    fn end_inputs(shape: &Shape) -> &Vec<ConfigNode> {
        &shape.root_config().unwrap().input_params
    }

    #[test]
    fn flat_end_output_is_wrapped() {
        let mut output = ConfigNode::input("o1".into(), "output", DataType::String, json!("hi"));
        output.extra.insert("renderType".into(), json!("text"));
        let mut shape = end_node(vec![output]);

        let follow_ups = run(&Layered::new(EndProcessor), &mut shape, Some(&FlowType::ChatFlow));
        assert_eq!(follow_ups, vec![FollowUp::EnableLlmLogs]);
        assert_eq!(shape.runnable, Some(true));
        assert_eq!(shape.deletable, Some(true));

        let inputs = end_inputs(&shape);
        let wrapper = &inputs[0];
        assert!(wrapper.is_expand());
        assert_eq!(wrapper.name(), Some("output"));
        assert_eq!(wrapper.data_type, Some(DataType::Object));
        assert_eq!(wrapper.is_required, Some(false));
        assert_ne!(wrapper.id(), Some("o1"));

        let child = &wrapper.children().unwrap()[0];
        assert_eq!(child.id(), Some("o1"));
        assert_eq!(child.raw_value(), Some(&json!("hi")));
        assert_eq!(child.is_required, Some(true));
        assert_eq!(child.extra.get("renderType"), Some(&json!("text")));

        let log = inputs.iter().find(|i| i.has_name("enableLog")).unwrap();
        assert_eq!(log.raw_value(), Some(&json!(false)));
    }

    #[test]
    fn wrapped_end_is_stable() {
        let mut shape = end_node(vec![ConfigNode::input("o1".into(), "output", DataType::String, json!(""))]);
        run(&EndProcessor, &mut shape, None);
        let once = shape.clone();
        let follow_ups = run(&EndProcessor, &mut shape, None);
        assert!(follow_ups.is_empty());
        assert_eq!(shape, once);
    }

    #[test]
    fn workflow_and_form_ends_are_left_alone() {
        let flat = vec![ConfigNode::input("o1".into(), "output", DataType::String, json!(""))];
        let mut workflow = end_node(flat.clone());
        run(&EndProcessor, &mut workflow, Some(&FlowType::WorkFlow));
        assert_eq!(end_inputs(&workflow), &flat);

        let mut form_end = flat.clone();
        form_end.push(ConfigNode::input("f".into(), END_FORM_ID, DataType::String, json!("form1")));
        let mut manual = end_node(form_end.clone());
        run(&EndProcessor, &mut manual, None);
        assert_eq!(end_inputs(&manual), &form_end);
    }

    #[test]
    fn end_without_callback_is_corrupt() {
        let index = PageIndex::default();
        let ids = SequentialGenerator::default();
        let ctx = ProcessContext {
            page: &index,
            flow_type: None,
            localizer: &crate::i18n::NoLocalizer,
            ids: &ids,
        };
        let mut shape = Shape::new("end", ShapeKind::End);
        let err = EndProcessor.process(&mut shape, &ctx).unwrap_err();
        assert_eq!(
            err,
            CompatibilityError::CorruptShape {
                shape_id: "end".into(),
                shape_type: "endNodeEnd".into(),
                missing: CALLBACK_ENTITY.into(),
            }
        );
    }

    #[test]
    fn llm_gains_missing_inputs_and_tools_absorb_workflows() {
        let workflows = ConfigNode::expand(
            "w".into(),
            Some("workflows"),
            DataType::Array,
            vec![ConfigNode::input("w1".into(), "flowA", DataType::String, json!("a"))],
        );
        let output = ConfigNode::expand("out".into(), Some("output"), DataType::Object, Vec::new());
        let mut shape = with_jober(ShapeKind::Llm, RootConfig::new(vec![workflows], vec![output]));

        run(&LlmProcessor, &mut shape, None);
        let entity = shape.root_config().unwrap();
        for name in ["maxMemoryRounds", "knowledgeBases", "mcpServers", "enableLog", "tools"] {
            assert!(entity.input(name).is_some(), "missing {name}");
        }
        assert!(entity.input("workflows").unwrap().children().unwrap().is_empty());
        assert!(entity.input("tools").unwrap().child("flowA").is_some());
        assert!(entity.output("output").unwrap().child("reference").is_some());
        assert_eq!(entity.temp_reference, Some(json!({})));
    }

    #[test]
    fn knowledge_fills_option_and_drops_user_id() {
        let option = ConfigNode::expand(
            "opt".into(),
            Some("option"),
            DataType::Object,
            vec![ConfigNode::expand("rr".into(), Some("rerankParam"), DataType::Object, Vec::new())],
        );
        let user = ConfigNode::input("u".into(), "userId", DataType::String, json!(""));
        let mut shape = with_jober(ShapeKind::KnowledgeRetrieval, RootConfig::new(vec![option, user], vec![]));
        if let Some(jober) = shape.flow_meta.as_mut().and_then(|m| m.jober.as_mut()) {
            jober.entity = Some(crate::model::JoberEntity {
                params: Some(vec![JobParam::named("query"), JobParam::named("userId")]),
                ..Default::default()
            });
        }

        run(&KnowledgeProcessor, &mut shape, None);
        let entity = shape.root_config().unwrap();
        assert!(entity.input("userId").is_none());
        let option = entity.input("option").unwrap();
        for name in ["groupId", "knowledgeConfigId", "extensions"] {
            assert!(option.child(name).is_some(), "missing {name}");
        }
        let rerank = option.child("rerankParam").unwrap();
        assert!(rerank.child("accessInfo").is_some());
        assert!(rerank.child("rerankTopN").is_some());

        let params = shape.flow_meta.as_ref().unwrap().jober.as_ref().unwrap().entity.as_ref().unwrap();
        assert_eq!(params.params.as_ref().unwrap(), &vec![JobParam::named("query")]);
    }

    #[test]
    fn start_inputs_get_visibility_defaults() {
        let question = ConfigNode::input("q".into(), "Question", DataType::String, json!(""));
        let mut hidden = ConfigNode::input("h".into(), "extra", DataType::String, json!(""));
        hidden.is_required = Some(false);
        let input = ConfigNode::expand("in".into(), Some("input"), DataType::Object, vec![question, hidden]);
        let mut shape = Shape {
            flow_meta: Some(FlowMeta {
                input_params: Some(vec![input]),
                ..Default::default()
            }),
            ..Shape::new("start", ShapeKind::Start)
        };

        run(&StartProcessor, &mut shape, None);
        assert_eq!(shape.deletable, Some(false));
        let items = shape.root_inputs().unwrap()[0].children().unwrap();
        assert_eq!(items[0].display_name.as_deref(), Some("User question"));
        assert_eq!((items[0].is_required, items[0].is_visible), (Some(true), Some(true)));
        assert_eq!((items[1].is_required, items[1].is_visible), (Some(false), Some(false)));
    }

    #[test]
    fn manual_check_becomes_intelligent_form() {
        let mut shape = Shape {
            flow_meta: Some(FlowMeta {
                task: Some(Task::default()),
                ..Default::default()
            }),
            ..Shape::new("m", ShapeKind::ManualCheck)
        };
        run(&ManualCheckProcessor, &mut shape, None);
        assert_eq!(shape.kind, ShapeKind::IntelligentForm);
        assert_eq!(shape.component_name.as_deref(), Some("intelligentFormComponent"));
        let task = shape.flow_meta.as_ref().and_then(|m| m.task.as_ref()).unwrap();
        assert_eq!(task.form_type.as_deref(), Some("manual"));
    }

    #[test]
    fn loop_gains_context_once() {
        let mut shape = with_jober(ShapeKind::Loop, RootConfig::default());
        run(&LoopProcessor, &mut shape, None);
        run(&LoopProcessor, &mut shape, None);
        let meta = shape.flow_meta.as_ref().unwrap();
        let params = meta.jober.as_ref().unwrap().entity.as_ref().unwrap().params.as_ref().unwrap();
        assert_eq!(params, &vec![JobParam::named("context")]);
        assert_eq!(meta.jober_entity().unwrap().input_params.len(), 1);
    }
}
