use clap::{Parser, Subcommand, ValueEnum};
use itertools::Itertools;
use jade_graph::prelude::*;
use std::fs;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FlowTypeCli {
    Workflow,
    Chatflow,
}

impl From<FlowTypeCli> for FlowType {
    fn from(value: FlowTypeCli) -> Self {
        match value {
            FlowTypeCli::Workflow => FlowType::WorkFlow,
            FlowTypeCli::Chatflow => FlowType::ChatFlow,
        }
    }
}

/// Inspect, edit and migrate flow graph documents
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the graph JSON file
    graph_path: String,

    /// Treat the graph as this flow type instead of reading `flowType`
    #[arg(long, value_enum, global = true)]
    flow_type: Option<FlowTypeCli>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the compatibility chain and write the upgraded graph
    Normalize {
        /// Where to write the result; defaults to overwriting the input
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Print the flattened config at a path (shape id first)
    Get {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Write a JSON value at a path and save the graph
    Set {
        /// The JSON value to write
        #[arg(short, long)]
        value: String,
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Print the validation info of every shape, grouped by type
    Validate,
    /// List the shapes on any path between two shapes
    Between { from: String, to: String },
    /// List shape ids, optionally of one type only
    Shapes {
        #[arg(short = 't', long = "type")]
        kind: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("\nError: {}", e);
        std::process::exit(1);
    }
}

fn load(cli: &Cli, normalize: bool) -> Result<GraphOperator> {
    let json = fs::read_to_string(&cli.graph_path)?;
    let mut builder = GraphOperator::builder(&json).normalize(normalize);
    if let Some(flow_type) = cli.flow_type {
        builder = builder.with_flow_type(flow_type.into());
    }
    Ok(builder.build()?)
}

fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Command::Normalize { output } => {
            let start = Instant::now();
            let operator = load(&cli, true)?;
            if let Some(report) = operator.compatibility_report() {
                println!("Processed {} shapes in {:.2?}.", report.processed, start.elapsed());
                if !report.is_clean() {
                    println!("Corrupt shapes: {}", report.corrupt_shape_ids().iter().join(", "));
                }
            }
            let target = output.as_deref().unwrap_or(&cli.graph_path);
            fs::write(target, operator.graph()?)?;
            println!("Wrote '{}'.", target);
        }
        Command::Get { keys } => {
            let operator = load(&cli, false)?;
            match operator.config(keys)? {
                Some(view) => println!("{}", serde_json::to_string_pretty(&view)?),
                None => println!("-> Nothing at '{}'.", keys.iter().join(".")),
            }
        }
        Command::Set { value, keys } => {
            let value: serde_json::Value = serde_json::from_str(value)?;
            let mut operator = load(&cli, false)?;
            operator.update(keys, &value)?;
            fs::write(&cli.graph_path, operator.graph()?)?;
            println!("Updated '{}'.", keys.iter().join("."));
        }
        Command::Validate => {
            let operator = load(&cli, false)?;
            println!("{}", serde_json::to_string_pretty(&operator.forms_to_validate())?);
        }
        Command::Between { from, to } => {
            let operator = load(&cli, false)?;
            let chain = operator.nodes_between(from, to);
            if chain.is_empty() {
                println!("-> '{}' is not reachable from '{}'.", to, from);
            } else {
                println!("{}", chain.iter().join(" -> "));
            }
        }
        Command::Shapes { kind } => {
            let operator = load(&cli, false)?;
            match kind {
                Some(kind) => {
                    for id in operator.shape_ids_by_type(&ShapeKind::from(kind.as_str())) {
                        println!("{}", id);
                    }
                }
                None => {
                    for shape in &operator.document().pages[0].shapes {
                        println!("{:<40} {}", shape.id, shape.kind);
                    }
                }
            }
        }
    }
    Ok(())
}
