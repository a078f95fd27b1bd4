use std::io::{self, Write};

use anyhow::Result;
use clap::Args;
use gem_inventory::table::write_stones_table;
use gem_inventory::{Catalog, Config, SoldSet};

use crate::criteria::CriteriaArgs;
use crate::format::{write_json, OutputFormat};

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    #[command(flatten)]
    pub criteria: CriteriaArgs,

    /// Also list stones that have already been sold
    #[arg(long)]
    pub include_sold: bool,

    /// Show at most this many stones
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Output format
    #[arg(short, long, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

pub fn execute(args: SearchArgs, config: &Config) -> Result<()> {
    let criteria = args.criteria.to_criteria()?;
    criteria.validate()?;

    let catalog = Catalog::load(&config.paths.catalog)?;
    catalog.check_criteria(&criteria)?;
    let mut stones = catalog.filter(&criteria);
    if !args.include_sold {
        let sold = SoldSet::load(&config.paths.sold_stones)?;
        stones = sold.exclude(stones);
    }
    let total = stones.len();
    if let Some(limit) = args.limit {
        stones.truncate(limit);
    }
    log::debug!("{total} stones match, showing {}", stones.len());

    let mut writer = io::stdout().lock();
    match args.format {
        OutputFormat::Json => write_json(writer, &stones)?,
        OutputFormat::Table if stones.is_empty() => {
            writeln!(writer, "No diamonds match the given criteria.")?
        }
        OutputFormat::Table => {
            write_stones_table(&stones, &mut writer)?;
            if total > stones.len() {
                writeln!(writer, "Showing {} of {total} matching stones.", stones.len())?;
            } else {
                writeln!(writer, "{total} matching stones.")?;
            }
        }
    }
    Ok(())
}
