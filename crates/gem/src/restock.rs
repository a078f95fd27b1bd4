use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use gem_inventory::{Catalog, Config, OrderLog, RestockReport};

use crate::format::{write_json, OutputFormat};

#[derive(Args, Debug, Clone)]
pub struct RestockArgs {
    /// Flag groups with fewer remaining stones than this
    #[arg(long, allow_negative_numbers = true)]
    pub threshold: Option<i64>,

    /// Where to write the report CSV (defaults to paths.restock_report)
    #[arg(short, long, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

pub fn execute(args: RestockArgs, config: &Config) -> Result<()> {
    let threshold = args
        .threshold
        .unwrap_or(config.restock.low_stock_threshold);
    let output = args
        .output
        .unwrap_or_else(|| config.paths.restock_report.clone());

    let catalog = Catalog::load(&config.paths.catalog)?;
    let sold = OrderLog::new(&config.paths.orders).stones()?;
    let report = RestockReport::compute(catalog.stones(), &sold, threshold);
    report.write(&output)?;

    let mut writer = io::stdout().lock();
    match args.format {
        OutputFormat::Json => write_json(writer, &report)?,
        OutputFormat::Table => {
            report.write_table(&mut writer)?;
            let low = report.low_stock().count();
            if low > 0 {
                writeln!(
                    writer,
                    "{}",
                    format!("{low} groups below {threshold} remaining stones.").yellow()
                )?;
            }
            writeln!(writer, "Report written to {}", output.display())?;
        }
    }
    Ok(())
}
