use std::io::{self, Write};

use anyhow::Result;
use clap::Args;
use gem_inventory::{Catalog, Config};

use crate::format::{write_json, OutputFormat};

#[derive(Args, Debug, Clone)]
pub struct ValuesArgs {
    /// Catalog column, e.g. cut or clarity
    #[arg(value_name = "COLUMN")]
    pub column: String,

    /// Output format
    #[arg(short, long, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

pub fn execute(args: ValuesArgs, config: &Config) -> Result<()> {
    let catalog = Catalog::load(&config.paths.catalog)?;
    let values = catalog.unique_values(args.column.trim())?;

    let mut writer = io::stdout().lock();
    match args.format {
        OutputFormat::Json => write_json(writer, &values)?,
        OutputFormat::Table => {
            for value in values {
                writeln!(writer, "{value}")?;
            }
        }
    }
    Ok(())
}
