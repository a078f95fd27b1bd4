use std::io::{self, Write};

use anyhow::Result;
use clap::Args;
use gem_inventory::table::write_orders_table;
use gem_inventory::{Config, OrderLog};

use crate::format::{write_json, OutputFormat};

#[derive(Args, Debug, Clone)]
pub struct OrdersArgs {
    /// Only show orders for this customer
    #[arg(long, value_name = "NAME")]
    pub customer: Option<String>,

    /// Output format
    #[arg(short, long, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

pub fn execute(args: OrdersArgs, config: &Config) -> Result<()> {
    let mut records = OrderLog::new(&config.paths.orders).records()?;
    if let Some(customer) = &args.customer {
        let wanted = customer.trim().to_lowercase();
        records.retain(|r| r.customer_name.trim().to_lowercase() == wanted);
    }

    let mut writer = io::stdout().lock();
    match args.format {
        OutputFormat::Json => write_json(writer, &records)?,
        OutputFormat::Table if records.is_empty() => writeln!(writer, "No orders found.")?,
        OutputFormat::Table => write_orders_table(&records, writer)?,
    }
    Ok(())
}
