use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use env_logger::Env;
use gem_inventory::Config;

mod analytics;
mod criteria;
mod format;
mod order;
mod orders;
mod price;
mod restock;
mod search;
mod values;

#[derive(Parser)]
#[command(name = "gem")]
#[command(about = "Diamond inventory, ordering and restock reporting", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true, hide = true)]
    debug: bool,

    /// Path to gem.toml (defaults to $GEM_CONFIG, then ./gem.toml)
    #[arg(long = "config", global = true, value_name = "PATH", value_hint = clap::ValueHint::FilePath)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find unsold diamonds matching the given criteria
    #[command(alias = "s")]
    Search(search::SearchArgs),

    /// List the distinct values of a catalog column
    Values(values::ValuesArgs),

    /// Allocate diamonds to a customer order
    #[command(alias = "o")]
    Order(order::OrderArgs),

    /// Show placed orders
    Orders(orders::OrdersArgs),

    /// Compute stock versus sales per cut and clarity
    #[command(alias = "r")]
    Restock(restock::RestockArgs),

    /// Count stones per shape and carat weight
    Analytics(analytics::AnalyticsArgs),

    /// Manager pricing tools
    Price(price::PriceArgs),
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {e}", "Error:".red());
        for cause in e.chain().skip(1) {
            eprintln!("  {cause}");
        }
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logger with default level depending on --debug (overridden by RUST_LOG)
    let env = if cli.debug {
        Env::default().default_filter_or("debug")
    } else {
        Env::default().default_filter_or("error")
    };
    env_logger::Builder::from_env(env).init();

    let config = load_config(cli.config)?;

    match cli.command {
        Commands::Search(args) => search::execute(args, &config),
        Commands::Values(args) => values::execute(args, &config),
        Commands::Order(args) => order::execute(args, &config),
        Commands::Orders(args) => orders::execute(args, &config),
        Commands::Restock(args) => restock::execute(args, &config),
        Commands::Analytics(args) => analytics::execute(args, &config),
        Commands::Price(args) => price::execute(args, &config),
    }
}

fn load_config(explicit: Option<PathBuf>) -> anyhow::Result<Config> {
    let explicit = explicit.or_else(|| std::env::var_os("GEM_CONFIG").map(PathBuf::from));
    let cwd = std::env::current_dir().context("Failed to determine working directory")?;
    Config::discover(explicit.as_deref(), &cwd).context("Failed to load configuration")
}
