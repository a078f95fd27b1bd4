use anyhow::{bail, Result};
use clap::Args;
use gem_inventory::Criteria;
use rust_decimal::Decimal;

/// Stone filters shared by `search` and `order`.
#[derive(Args, Debug, Clone, Default)]
pub struct CriteriaArgs {
    /// Shape, e.g. Round or Oval
    #[arg(long)]
    pub cut: Option<String>,

    /// Smallest carat weight, inclusive
    #[arg(long, value_name = "CARAT")]
    pub carat_min: Option<Decimal>,

    /// Largest carat weight, inclusive
    #[arg(long, value_name = "CARAT")]
    pub carat_max: Option<Decimal>,

    /// Clarity grade, e.g. VS1
    #[arg(long)]
    pub clarity: Option<String>,

    /// Cut quality, e.g. Excellent
    #[arg(long)]
    pub cut_quality: Option<String>,

    /// Grading lab, e.g. GIA
    #[arg(long)]
    pub lab: Option<String>,

    /// Match any other catalog column exactly (repeatable)
    #[arg(long = "where", value_name = "COLUMN=VALUE")]
    pub attributes: Vec<String>,
}

impl CriteriaArgs {
    pub fn to_criteria(&self) -> Result<Criteria> {
        let mut criteria =
            Criteria::new().carat_range(self.carat_min, self.carat_max);
        if let Some(cut) = &self.cut {
            criteria = criteria.cut(cut);
        }
        if let Some(clarity) = &self.clarity {
            criteria = criteria.clarity(clarity);
        }
        if let Some(cut_quality) = &self.cut_quality {
            criteria = criteria.cut_quality(cut_quality);
        }
        if let Some(lab) = &self.lab {
            criteria = criteria.lab(lab);
        }
        for pair in &self.attributes {
            let Some((column, value)) = pair.split_once('=') else {
                bail!("Invalid --where '{pair}', expected COLUMN=VALUE");
            };
            criteria = criteria.attribute(column.trim(), value);
        }
        Ok(criteria)
    }
}
