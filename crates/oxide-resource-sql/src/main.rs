//! oxide-resource CLI
//!
//! Compiles a directory of resource descriptions into a PostgreSQL
//! migration or CRUD statements.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_resource_core::loader;
use oxide_resource_sql::prelude::*;

/// Relationship-aware schema and query compiler.
#[derive(Parser)]
#[command(name = "oxide-resource")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding one JSON description per resource.
    #[arg(short, long, env = "OXIDE_RESOURCES_DIR", default_value = "resources")]
    resources: PathBuf,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the migration script.
    Migrate {
        /// Write the script to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the order tables are created in.
    Order,

    /// Print the normalized models, inverse relationships included.
    Inspect,

    /// Print a compiled read statement and its parameters.
    Query {
        /// Resource to read.
        resource: String,

        /// Read a single row instead of a list.
        #[arg(long)]
        id: Option<i64>,

        /// Comma-separated fields to project.
        #[arg(long, value_delimiter = ',')]
        fields: Option<Vec<String>>,

        /// Page number, one-indexed.
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        page: Option<u32>,

        /// Rows per page.
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        page_size: Option<u32>,
    },
}

fn load(dir: &Path) -> anyhow::Result<DefinitionSet> {
    let raw = loader::load_dir(dir)
        .with_context(|| format!("failed to load resources from {}", dir.display()))?;
    let models = compile_models(raw)?;
    Ok(DefinitionSet::build(models)?)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let definitions = load(&cli.resources)?;

    match cli.command {
        Commands::Migrate { output } => {
            let script = MigrationCompiler::new().compile(&definitions)?.script();
            match output {
                Some(path) => {
                    fs::write(&path, script)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    info!(path = %path.display(), "Migration written");
                }
                None => print!("{script}"),
            }
        }

        Commands::Order => {
            let order = DependencyGraph::from_models(definitions.models()).topological_order()?;
            for name in order {
                println!("{name}");
            }
        }

        Commands::Inspect => {
            let models: Vec<&ResourceModel> = definitions.models().collect();
            println!("{}", serde_json::to_string_pretty(&models)?);
        }

        Commands::Query {
            resource,
            id,
            fields,
            page,
            page_size,
        } => {
            let definition = definitions
                .get(&resource)
                .ok_or_else(|| CompileError::UnknownResource(resource.clone()))?;
            let mut request = ReadRequest {
                id,
                ..ReadRequest::default()
            };
            if let Some(fields) = fields {
                request = request.fields(fields);
            }
            if page.is_some() || page_size.is_some() {
                let default = Page::default_for(&definition.model().pagination);
                request = request.page(Page::new(
                    page.unwrap_or(default.number),
                    page_size.unwrap_or(default.size),
                ));
            }

            let statement = QueryCompiler::new(&definitions).read(&resource, &request)?;
            println!("{statement}");
            for (position, param) in statement.params.iter().enumerate() {
                println!("-- ${} {} = {:?}", position + 1, param.name, param.value);
            }
        }
    }

    Ok(())
}
