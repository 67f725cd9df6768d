use clap::Parser;
use flowsmith::prelude::*;
use std::fs;
use std::io::{self, Write};
use std::time::Instant;

/// Compiles a search workflow canvas into provisioning templates
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the canvas JSON file
    input_path: String,

    /// Treat the input as a canonical `VisualGraph` instead of a raw canvas export
    #[arg(long)]
    graph: bool,

    /// Wrap the templates in a create-workflow document with this name
    #[arg(long, value_name = "NAME")]
    document: Option<String>,

    /// Seed for reproducible pipeline names
    #[arg(long, conflicts_with = "sequential_ids")]
    seed: Option<u64>,

    /// Number generated names `prefix_0`, `prefix_1`, ... instead of randomizing them
    #[arg(long)]
    sequential_ids: bool,

    /// Only run the pre-flight checks
    #[arg(long)]
    validate_only: bool,

    /// Write the output here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    run(cli);
}

fn run(cli: Cli) {
    let start = Instant::now();

    let content = fs::read_to_string(&cli.input_path).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to read '{}': {}", cli.input_path, e))
    });
    let graph = load_graph(&content, cli.graph)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load graph: {}", e)));
    tracing::info!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "loaded graph"
    );

    let strategy = match (cli.seed, cli.sequential_ids) {
        (Some(seed), _) => IdStrategy::Seeded(seed),
        (None, true) => IdStrategy::Sequential,
        (None, false) => IdStrategy::Random,
    };
    let compiler = Compiler::builder(graph).with_id_strategy(strategy).build();

    if cli.validate_only {
        match compiler.validate() {
            Ok(()) => eprintln!("Graph is valid ({:?})", start.elapsed()),
            Err(e) => exit_with_report(&e),
        }
        return;
    }

    let rendered = match &cli.document {
        Some(name) => compiler
            .compile_document(name, "", "CUSTOM")
            .map(|doc| to_pretty_json(&doc)),
        None => compiler.compile().map(|flows| to_pretty_json(&flows)),
    }
    .unwrap_or_else(|e| exit_with_report(&e));

    match &cli.output {
        Some(path) => fs::write(path, rendered + "\n")
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to write '{}': {}", path, e))),
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", rendered)
                .unwrap_or_else(|e| exit_with_error(&format!("Failed to write output: {}", e)));
        }
    }
    tracing::info!(elapsed = ?start.elapsed(), "done");
}

fn load_graph(
    content: &str,
    canonical: bool,
) -> std::result::Result<VisualGraph, GraphConversionError> {
    if canonical {
        serde_json::from_str(content).map_err(|e| GraphConversionError::JsonParseError(e.to_string()))
    } else {
        UiWorkflow::from_json(content)?.into_graph()
    }
}

fn to_pretty_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to serialize output: {}", e)))
}

fn exit_with_report(error: &CompileError) -> ! {
    for e in error.errors() {
        eprintln!("  - {}", e);
    }
    exit_with_error(&error.to_string())
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
