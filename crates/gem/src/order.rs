use std::io::{self, Write};

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use gem_inventory::{Catalog, Config, OrderLog, OrderProcessor, OrderRequest, SoldSet};

use crate::criteria::CriteriaArgs;
use crate::format::{write_json, OutputFormat};

#[derive(Args, Debug, Clone)]
pub struct OrderArgs {
    #[command(flatten)]
    pub criteria: CriteriaArgs,

    /// Name the order is placed under
    #[arg(long, value_name = "NAME")]
    pub customer: String,

    /// Number of stones to allocate
    #[arg(short, long, allow_negative_numbers = true)]
    pub quantity: i64,

    /// Output format
    #[arg(short, long, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

pub fn execute(args: OrderArgs, config: &Config) -> Result<()> {
    let request = OrderRequest::new(args.criteria.to_criteria()?, &args.customer, args.quantity);
    // Reject bad input before touching any file.
    request.validate()?;

    let catalog = Catalog::load(&config.paths.catalog)?;
    let sold = SoldSet::load(&config.paths.sold_stones)?;
    let mut processor = OrderProcessor::new(&catalog, sold, OrderLog::new(&config.paths.orders));
    if config.orders.lock {
        processor = processor.with_lock(config.order_lock_path());
    }

    let record = processor.place_order(&request)?;

    let mut writer = io::stdout().lock();
    match args.format {
        OutputFormat::Json => write_json(writer, &record)?,
        OutputFormat::Table => {
            writeln!(writer, "{}", "Order placed successfully.".green())?;
            record.write_summary(&mut writer)?;
        }
    }
    Ok(())
}
