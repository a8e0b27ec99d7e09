//! Nodemap CLI - Command line interface for the graph store

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::{completions, config as config_cmd, load, query, show};
use config::Config;
use nodemap_core::{GraphStore, LoadReport};
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "nodemap")]
#[command(author, version, about = "Typed in-memory graph store with path projections")]
pub struct Cli {
    /// Dataset file (JSON array of instance records)
    #[arg(short, long, global = true, env = "NODEMAP_DATA")]
    pub data: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum)]
    pub format: Option<OutputFormat>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a dataset and report what was loaded
    Load,
    /// Run a path query and print the projections
    Query(query::QueryArgs),
    /// Show one instance and its links
    Show(show::ShowArgs),
    /// Manage configuration
    Config(config_cmd::ConfigArgs),
    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Application context with the loaded store
pub struct AppContext {
    pub store: GraphStore,
    pub report: LoadReport,
    pub format: OutputFormat,
}

impl AppContext {
    pub fn new(cli: &Cli, config: &Config) -> anyhow::Result<Self> {
        let data = cli
            .data
            .clone()
            .or_else(|| config.data_file.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("No dataset given. Pass --data or run `nodemap config set data_file <path>`")
            })?;
        tracing::debug!("Loading dataset from: {:?}", data);

        let content = std::fs::read_to_string(&data)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {}", data.display(), e))?;
        let (store, report) = nodemap_core::load_json(&content)?;

        Ok(Self {
            store,
            report,
            format: cli.format.or(config.format).unwrap_or_default(),
        })
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();

    tracing::debug!("Starting nodemap CLI");

    // Commands that need no dataset
    match &cli.command {
        Commands::Config(args) => return config_cmd::run(args),
        Commands::Completions(args) => return completions::run(args),
        _ => {}
    }

    let config = Config::load();
    let mut ctx = AppContext::new(&cli, &config)?;

    match &cli.command {
        Commands::Load => load::run(&ctx),
        Commands::Query(args) => query::run(args, &mut ctx),
        Commands::Show(args) => show::run(args, &ctx),
        Commands::Config(_) | Commands::Completions(_) => Ok(()),
    }
}
