//! pgcompose CLI - Main entry point
//!
//! Compares two schema sources and emits the dependency-ordered migration
//! between them.

use clap::Parser;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use pgcompose_cli::commands::plan::{self, PlanCommand};
use pgcompose_cli::config::Config;
use pgcompose_cli::error::CliError;
use pgcompose_migrations::{OutputFormat, PlanOptions};

/// pgcompose - Schema diff and migration planning for PostgreSQL
#[derive(Parser, Debug)]
#[command(name = "pgcompose")]
#[command(author, version, about = "Schema diff and migration planning for PostgreSQL", long_about = None)]
struct Cli {
    /// Current schema: JSON record file(s), comma separated
    #[arg(value_name = "SOURCE_A")]
    source_a: String,

    /// Desired schema: JSON record file(s), comma separated
    #[arg(value_name = "SOURCE_B")]
    source_b: String,

    /// Only plan objects in these schemas (space or comma separated)
    #[arg(long, num_args = 1.., value_delimiter = ',', value_name = "NAMES")]
    schemas: Vec<String>,

    /// Deployment file for the plan
    #[arg(long, value_name = "PATH")]
    deploy: Option<PathBuf>,

    /// Preview the deployment without writing it (default)
    #[arg(long, conflicts_with = "prod")]
    dry_run: bool,

    /// Write the deployment file
    #[arg(long)]
    prod: bool,

    /// Include GRANT statements (omitted by default)
    #[arg(long, overrides_with = "no_grants")]
    grants: bool,

    /// Exclude GRANT statements
    #[arg(long, overrides_with = "grants")]
    no_grants: bool,

    /// Output format (sql, json or ast)
    #[arg(long, value_parser = parse_output_format, value_name = "FORMAT")]
    output_format: Option<OutputFormat>,

    /// Path to config file (default: pgcompose.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log diff and sort decisions to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn parse_output_format(s: &str) -> Result<OutputFormat, String> {
    s.parse()
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(cli.config.as_deref())?;

    let include_grants = if cli.no_grants {
        false
    } else if cli.grants {
        true
    } else {
        config.include_grants()
    };
    let schemas = if cli.schemas.is_empty() {
        config.schemas
    } else {
        cli.schemas
    };

    let cmd = PlanCommand {
        base: cli.source_a,
        updated: cli.source_b,
        options: PlanOptions::new()
            .with_grants(include_grants)
            .with_schemas(schemas),
        format: cli.output_format.unwrap_or(config.output_format),
        deploy: cli.deploy.or(config.deploy),
        prod: cli.prod && !cli.dry_run,
    };

    plan::run(&cmd)
}

fn load_config(custom_path: Option<&Path>) -> Result<Config, CliError> {
    match custom_path {
        Some(path) => Config::load_from(path).map_err(Into::into),
        None => Config::load().map_err(Into::into),
    }
}
