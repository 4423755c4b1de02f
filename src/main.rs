//! Command-line interface for rowmap
//!
//! # Usage Examples
//!
//! ## Resolve
//! ```bash
//! # Which mappers serve a type?
//! rowmap resolve --type int
//! rowmap resolve --type '{type: array, element_type: text}' --kind row
//! ```
//!
//! ## Map
//! ```bash
//! # Map every row of a YAML result fixture
//! rowmap map --input users.yaml --type text --column 1
//! rowmap --config rowmap.toml map --input users.yaml --type big_int
//! ```
//!
//! A result fixture lists column labels and rows:
//!
//! ```yaml
//! columns: [id, name]
//! rows:
//!   - [1, ada]
//!   - [2, null]
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use rowmap::{Configuration, MapperOptions, ResultSet, StatementContext, TypeDescriptor};
use serde_json::json;
use tracing::info;

#[derive(Parser)]
#[command(name = "rowmap")]
#[command(about = "Resolve and run row and column mappers")]
#[command(long_about = None)]
struct Cli {
    /// Mapper options file (TOML)
    #[arg(long, global = true, env = "ROWMAP_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report which mappers the registry resolves for a type
    Resolve {
        /// Type descriptor in YAML form, e.g. `int` or `{type: optional, inner: text}`
        #[arg(long = "type", value_name = "TYPE")]
        ty: String,

        /// Which registry to query
        #[arg(long, value_enum, default_value = "both")]
        kind: MapperKind,
    },

    /// Map every row of a result fixture and print the values
    Map {
        /// Result fixture file (YAML)
        #[arg(long, value_name = "PATH")]
        input: PathBuf,

        /// Type descriptor in YAML form
        #[arg(long = "type", value_name = "TYPE")]
        ty: String,

        /// Map this column with a column mapper instead of mapping whole rows
        #[arg(long)]
        column: Option<usize>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MapperKind {
    Row,
    Column,
    Both,
}

fn main() -> anyhow::Result<()> {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let options = match &cli.config {
        Some(path) => MapperOptions::from_file(path)?,
        None => MapperOptions::default(),
    };
    let ctx = Configuration::new(options).into_statement_context();

    match cli.command {
        Commands::Resolve { ty, kind } => {
            let ty = parse_type(&ty)?;
            resolve(&ctx, &ty, kind)
        }
        Commands::Map { input, ty, column } => {
            let ty = parse_type(&ty)?;
            let results = ResultSet::from_file(&input)
                .with_context(|| format!("Failed to load result fixture {}", input.display()))?;
            map_rows(&ctx, &results, &ty, column)
        }
    }
}

fn parse_type(input: &str) -> anyhow::Result<TypeDescriptor> {
    TypeDescriptor::parse(input).context("Invalid --type")
}

fn resolve(ctx: &StatementContext, ty: &TypeDescriptor, kind: MapperKind) -> anyhow::Result<()> {
    let mut report = json!({ "type": ty.to_string() });

    if kind != MapperKind::Row {
        let column = ctx.find_column_mapper_for(ty)?;
        report["column"] = match column {
            Some(m) => json!({ "mapper": m.mapper_name(), "output": m.output_name() }),
            None => serde_json::Value::Null,
        };
    }
    if kind != MapperKind::Column {
        let row = ctx.find_row_mapper_for(ty)?;
        report["row"] = match row {
            Some(m) => json!({ "mapper": m.mapper_name(), "output": m.output_name() }),
            None => serde_json::Value::Null,
        };
    }
    report["stats"] = serde_json::to_value(ctx.config().mappers().stats())?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn map_rows(
    ctx: &StatementContext,
    results: &ResultSet,
    ty: &TypeDescriptor,
    column: Option<usize>,
) -> anyhow::Result<()> {
    info!(rows = results.len(), ty = %ty, "Mapping result fixture");
    let mappers = ctx.config().mappers();

    match column {
        Some(column) => {
            let mapper = mappers.require_column_mapper_for(ty, ctx)?;
            for row in results.rows() {
                let value = mapper
                    .map_value(&row, column, ctx)
                    .with_context(|| format!("Failed to map row {}", row.index))?;
                println!("{}: {value:?}", row.index);
            }
        }
        None => {
            let mapper = mappers.require_row_mapper_for(ty, ctx)?;
            for row in results.rows() {
                let value = mapper
                    .map_value(&row, ctx)
                    .with_context(|| format!("Failed to map row {}", row.index))?;
                println!("{}: {value:?}", row.index);
            }
        }
    }
    Ok(())
}
