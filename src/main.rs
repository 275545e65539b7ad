use clap::Parser;
use source_refactor::{
    ActionOptions, ActionRegistry, FilePosition, FindDefinitionAction, MemoryCodeModel,
    TemplateParameterRemoveAction,
};
use std::fs::File;
use std::io::{self, BufWriter, Write};

/// Source-to-source refactoring engine driven by a semantic code model
#[derive(Parser, Debug)]
#[command(name = "source-refactor")]
#[command(version = "0.1.0")]
#[command(about = "Computes and applies refactoring edits over source text", long_about = None)]
struct Args {
    /// Path to the serialized code model (JSON)
    #[arg(short, long)]
    model: String,

    /// Refactor action to perform
    action: Option<String>,

    /// Position of the symbol to refactor (<path>:<line>:<column>)
    #[arg(short, long)]
    position: Option<String>,

    /// Output computed edits as a JSON report instead of rewritten source
    #[arg(short, long)]
    json: bool,

    /// Write output to file instead of stdout
    #[arg(short, long)]
    output: Option<String>,

    /// Enable diagnostic logging to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn build_registry() -> ActionRegistry {
    let mut registry = ActionRegistry::new();
    registry.register(Box::new(FindDefinitionAction));
    registry.register(Box::new(TemplateParameterRemoveAction));
    registry
}

/// Print usage and the list of registered actions with their parameters
fn print_actions(registry: &ActionRegistry) {
    println!("source-refactor tool");
    println!("Usage: source-refactor --model <model> <action> [action arguments]");
    println!();
    println!("Available refactor actions:");
    for action in registry.actions() {
        println!("  {}", action.name());
        for param in action.params() {
            let requirement = if param.required { "required" } else { "optional" };
            println!("      --{} ({}): {}", param.name, requirement, param.help);
        }
    }
}

fn main() {
    let args = Args::parse();

    if args.verbose {
        tracing_subscriber::fmt::Subscriber::builder()
            .without_time()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    }

    let registry = build_registry();

    // Without an action there is nothing to perform; list what is available
    let Some(action_name) = args.action.as_deref() else {
        print_actions(&registry);
        std::process::exit(1);
    };

    let action = match registry.find(action_name) {
        Ok(action) => action,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    let model = match MemoryCodeModel::load(&args.model) {
        Ok(model) => model,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    let position = match args.position.as_deref().map(str::parse::<FilePosition>) {
        Some(Ok(pos)) => Some(pos),
        Some(Err(e)) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
        None => None,
    };

    let opts = ActionOptions {
        position,
        json: args.json,
    };

    let result = match &args.output {
        Some(path) => match File::create(path) {
            Ok(file) => {
                let mut out = BufWriter::new(file);
                action
                    .perform(&model, &opts, &mut out)
                    .and_then(|()| out.flush().map_err(Into::into))
            }
            Err(e) => {
                eprintln!("ERROR: can't open output file '{}' for writing: {}", path, e);
                std::process::exit(1);
            }
        },
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            action
                .perform(&model, &opts, &mut out)
                .and_then(|()| out.flush().map_err(Into::into))
        }
    };

    if let Err(e) = result {
        eprintln!("ERROR: {}", e);
        std::process::exit(1);
    }
}
