//! Schema Typegen CLI
//!
//! Command-line interface for resolving OpenAPI schema graphs into
//! component definitions.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use schema_typegen::{generate, load_document, merge, DocumentStore, Schema, Settings};
use serde::Serialize;
use tracing::Level;

#[derive(Parser)]
#[command(name = "schema-typegen")]
#[command(about = "Resolve OpenAPI schema graphs into component definitions")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the schemas of a specification document and model tree
    Generate {
        /// Specification document (YAML or JSON)
        #[arg(long)]
        spec: PathBuf,

        /// Root of the specification tree (default: directory of --spec)
        #[arg(long)]
        spec_root: Option<PathBuf>,

        /// Root of the shared model tree, scanned whole unless --include is
        /// given (default: the specification root, not scanned)
        #[arg(long)]
        models: Option<PathBuf>,

        /// Base package for specification-rooted types
        #[arg(long, default_value = "")]
        spec_package: String,

        /// Base package for model-rooted types
        #[arg(long, default_value = "")]
        model_package: String,

        /// Model directory to scan, as path or path:glob (repeatable)
        #[arg(long)]
        include: Vec<String>,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Merge the schema in <FROM> into the schema in <TO>
    Merge {
        /// Schema that wins conflicts
        to: PathBuf,

        /// Schema merged into <TO>
        from: PathBuf,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Generate {
            spec,
            spec_root,
            models,
            spec_package,
            model_package,
            include,
            output,
            pretty,
        } => run_generate(GenerateArgs {
            spec,
            spec_root,
            models,
            spec_package,
            model_package,
            include,
            output,
            pretty,
        }),

        Commands::Merge { to, from, pretty } => run_merge(&to, &from, pretty),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

struct GenerateArgs {
    spec: PathBuf,
    spec_root: Option<PathBuf>,
    models: Option<PathBuf>,
    spec_package: String,
    model_package: String,
    include: Vec<String>,
    output: Option<PathBuf>,
    pretty: bool,
}

fn run_generate(args: GenerateArgs) -> Result<(), u8> {
    let spec = absolute(&args.spec)?;
    if !spec.is_file() {
        eprintln!("Error: file not found: {}", spec.display());
        return Err(3);
    }

    let spec_root = match &args.spec_root {
        Some(root) => absolute(root)?,
        None => spec
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/")),
    };
    let model_root = match &args.models {
        Some(root) => absolute(root)?,
        None => spec_root.clone(),
    };

    let mut settings = Settings::new(&spec_root, &model_root)
        .and_then(|settings| settings.spec(&spec))
        .map_err(|e| {
            eprintln!("Error: {}", e);
            2u8
        })?
        .spec_package(args.spec_package)
        .model_package(args.model_package);
    for include in &args.include {
        settings = settings.include(include);
    }
    if args.models.is_some() && args.include.is_empty() {
        settings = settings.include("");
    }

    let mut store = DocumentStore::new();
    let specification = generate(&settings, &mut store).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    write_json(&specification, args.output.as_deref(), args.pretty)
}

fn run_merge(to: &Path, from: &Path, pretty: bool) -> Result<(), u8> {
    let to = load_schema(to)?;
    let from = load_schema(from)?;

    let merged = merge(&to, &from).map_err(|e| {
        eprintln!("Error: {}", e);
        2u8
    })?;

    write_json(&merged, None, pretty)
}

fn load_schema(path: &Path) -> Result<Schema, u8> {
    let document = load_document(path).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    serde_json::from_value(document).map_err(|e| {
        eprintln!("Error: invalid schema in {}: {}", path.display(), e);
        2u8
    })
}

fn absolute(path: &Path) -> Result<PathBuf, u8> {
    std::path::absolute(path).map_err(|e| {
        eprintln!("Error: cannot resolve {}: {}", path.display(), e);
        3u8
    })
}

fn write_json<T: Serialize>(value: &T, output: Option<&Path>, pretty: bool) -> Result<(), u8> {
    let json_output = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}
