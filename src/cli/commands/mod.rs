//! CLI parser and command dispatch.

mod config_cmd;
mod crawl;
mod parse;
mod query;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use centris::config::load_settings;

use crawl::CrawlArgs;

#[derive(Parser)]
#[command(name = "centris")]
#[command(about = "Crawl Centris real-estate listings into JSON Lines")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full crawl: session, query, pagination and detail enrichment
    Crawl(CrawlArgs),

    /// Extract listing summaries from a saved results response
    Parse {
        /// GetInscriptions response body (JSON), or raw results HTML with --html
        file: PathBuf,
        /// Treat FILE as the results markup itself
        #[arg(long)]
        html: bool,
    },

    /// Print the search query payload that would be submitted
    Query,

    /// Print the effective settings
    Config,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (settings, config) = load_settings(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Crawl(args) => crawl::cmd_crawl(settings, args).await,
        Commands::Parse { file, html } => parse::cmd_parse(&settings, &file, html).await,
        Commands::Query => query::cmd_query(&settings),
        Commands::Config => config_cmd::cmd_config(&settings, &config),
    }
}
