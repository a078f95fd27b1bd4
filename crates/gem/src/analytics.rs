use std::io::{self, Write};

use anyhow::Result;
use clap::Args;
use gem_inventory::table::write_stone_counts_table;
use gem_inventory::{stone_counts, Catalog, Config};

use crate::format::{write_json, OutputFormat};

#[derive(Args, Debug, Clone)]
pub struct AnalyticsArgs {
    /// Only count stones of this shape
    #[arg(long)]
    pub cut: Option<String>,

    /// Output format
    #[arg(short, long, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

pub fn execute(args: AnalyticsArgs, config: &Config) -> Result<()> {
    let catalog = Catalog::load(&config.paths.catalog)?;
    let counts = stone_counts(catalog.stones(), args.cut.as_deref());

    let mut writer = io::stdout().lock();
    match args.format {
        OutputFormat::Json => write_json(writer, &counts)?,
        OutputFormat::Table if counts.is_empty() => writeln!(writer, "No stones to count.")?,
        OutputFormat::Table => write_stone_counts_table(&counts, writer)?,
    }
    Ok(())
}
