use clap::Parser;
use jade_graph::component::{Component, KnowledgeRetrievalComponent};
use jade_graph::model::{
    Callback, ConfigNode, Converter, DataType, FlowMeta, FlowType, GraphDocument, Jober, Page, RootConfig,
    Shape, ShapeKind,
};
use rand::Rng;
use rand::rngs::ThreadRng;
use serde_json::json;
use std::fs;

/// Generates random flow graphs for stress-testing migrations and reachability
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The path to write the generated JSON file to
    #[arg(short, long, default_value = "generated_graph.json")]
    output: String,

    /// Number of nodes between the start and end node
    #[arg(long, default_value_t = 20)]
    nodes: usize,

    /// Extra random edges on top of the start-to-end spine
    #[arg(long, default_value_t = 10)]
    extra_edges: usize,

    /// Generate a work-flow graph instead of a chat-flow graph
    #[arg(long)]
    workflow: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut rng = rand::rng();

    println!(
        "Generating graph with {} inner nodes and {} extra edges...",
        cli.nodes, cli.extra_edges
    );

    let mut shapes = vec![start_node()];
    for i in 0..cli.nodes {
        shapes.push(inner_node(&mut rng, i));
    }
    shapes.push(end_node());

    let node_ids: Vec<String> = shapes.iter().map(|s| s.id.clone()).collect();
    let mut edges = Vec::new();
    // A spine keeps the end node reachable from the start node.
    for (i, pair) in node_ids.windows(2).enumerate() {
        edges.push(Shape::edge(&format!("spine{}", i), &pair[0], &pair[1]));
    }
    for i in 0..cli.extra_edges {
        let from = rng.random_range(0..node_ids.len());
        let to = rng.random_range(0..node_ids.len());
        if from != to {
            edges.push(Shape::edge(&format!("extra{}", i), &node_ids[from], &node_ids[to]));
        }
    }
    println!("-> Generated {} nodes and {} edges.", node_ids.len(), edges.len());
    shapes.extend(edges);

    let document = GraphDocument {
        pages: vec![Page {
            shapes,
            ..Default::default()
        }],
        flow_type: Some(if cli.workflow { FlowType::WorkFlow } else { FlowType::ChatFlow }),
        ..Default::default()
    };

    fs::write(&cli.output, serde_json::to_string_pretty(&document)?)?;
    println!("Successfully generated and saved graph to '{}'", cli.output);
    Ok(())
}

fn with_jober(id: &str, kind: ShapeKind, entity: RootConfig) -> Shape {
    Shape {
        text: Some(id.to_string()),
        flow_meta: Some(FlowMeta {
            jober: Some(Jober {
                converter: Some(Converter::mapping(entity)),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Shape::new(id, kind)
    }
}

fn start_node() -> Shape {
    let question = ConfigNode::input("question".into(), "Question", DataType::String, json!(""));
    let input = ConfigNode::expand("input".into(), Some("input"), DataType::Object, vec![question]);
    Shape {
        text: Some("start".into()),
        flow_meta: Some(FlowMeta {
            input_params: Some(vec![input]),
            ..Default::default()
        }),
        ..Shape::new("start", ShapeKind::Start)
    }
}

/// An end node in the pre-migration format: a single flat output.
fn end_node() -> Shape {
    let output = ConfigNode::reference("finalOutput".into(), Some("finalOutput"), DataType::String);
    Shape {
        text: Some("end".into()),
        flow_meta: Some(FlowMeta {
            callback: Some(Callback {
                converter: Some(Converter::mapping(RootConfig::new(vec![output], Vec::new()))),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Shape::new("end", ShapeKind::End)
    }
}

fn inner_node(rng: &mut ThreadRng, index: usize) -> Shape {
    let id = format!("node{}", index);
    if rng.random_bool(0.5) {
        // Legacy LLM node: none of the inputs added by later editors.
        let prompt = ConfigNode::input(format!("{}-prompt", id), "prompt", DataType::String, json!("Hi"));
        let output = ConfigNode::expand(format!("{}-output", id), Some("output"), DataType::Object, Vec::new());
        with_jober(&id, ShapeKind::Llm, RootConfig::new(vec![prompt], vec![output]))
    } else {
        let knowledge = KnowledgeRetrievalComponent::new(None);
        let mut config = knowledge.jade_config();
        config.input_params.push(ConfigNode::input(
            format!("{}-user", id),
            "userId",
            DataType::String,
            json!(""),
        ));
        with_jober(&id, ShapeKind::KnowledgeRetrieval, config)
    }
}
