use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use gem_inventory::{
    adjust_prices, AdjustmentLog, Authenticator, Config, ConfigAuthenticator, PriceChange,
};
use inquire::error::{InquireError, InquireResult};
use inquire::{Confirm, CustomType, Password, PasswordDisplayMode, Text};
use rust_decimal::Decimal;

use crate::format::{write_json, OutputFormat};

/// Read instead of prompting when set.
const PASSWORD_ENV: &str = "GEM_MANAGER_PASSWORD";

#[derive(Args, Debug)]
#[command(about = "Manager pricing tools")]
pub struct PriceArgs {
    #[command(subcommand)]
    command: PriceCommand,
}

#[derive(Subcommand, Debug)]
enum PriceCommand {
    /// Raise or lower every catalog price by a percentage
    Adjust(AdjustArgs),
}

#[derive(Args, Debug)]
struct AdjustArgs {
    /// Percentage change, e.g. 10 or -5.5 (prompted when omitted)
    #[arg(long, allow_negative_numbers = true)]
    percent: Option<Decimal>,

    /// Why prices are changing (prompted when omitted)
    #[arg(long)]
    reason: Option<String>,

    /// Manager username (prompted when omitted)
    #[arg(short, long)]
    username: Option<String>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,

    /// Output format
    #[arg(short, long, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

pub fn execute(args: PriceArgs, config: &Config) -> Result<()> {
    match args.command {
        PriceCommand::Adjust(args) => adjust(args, config),
    }
}

fn adjust(args: AdjustArgs, config: &Config) -> Result<()> {
    let username = match args.username {
        Some(username) => username,
        None => Text::new("Manager username:")
            .prompt()
            .context("Failed to read username")?,
    };
    let password = match std::env::var(PASSWORD_ENV) {
        Ok(password) => password,
        Err(_) => Password::new("Password:")
            .with_display_mode(PasswordDisplayMode::Hidden)
            .without_confirmation()
            .prompt()
            .context("Failed to read password")?,
    };

    let authenticator = ConfigAuthenticator::new(config.managers.clone());
    let operator = authenticator.authenticate(username.trim(), &password)?;

    let percent = match args.percent {
        Some(percent) => percent,
        None => CustomType::<Decimal>::new("Percentage change:")
            .with_help_message("e.g. 10 to raise prices by 10%, -5 to lower them by 5%")
            .with_error_message("Please enter a number")
            .prompt()
            .context("Failed to read percentage")?,
    };
    let reason = match args.reason {
        Some(reason) => reason,
        None => Text::new("Reason for adjustment:")
            .prompt()
            .context("Failed to read reason")?,
    };
    let change = PriceChange::new(percent, reason);
    change.validate()?;

    if !args.yes {
        let answer = Confirm::new(&format!(
            "Adjust every price in {} by {}%?",
            config.paths.catalog.display(),
            change.percent
        ))
        .with_default(false)
        .prompt();
        ensure_confirmed(answer)?;
    }

    let adjustment = adjust_prices(&config.paths.catalog, &change, &operator)?;
    AdjustmentLog::new(&config.paths.adjustment_log).append(&adjustment)?;

    let mut writer = io::stdout().lock();
    match args.format {
        OutputFormat::Json => write_json(writer, &adjustment)?,
        OutputFormat::Table => writeln!(
            writer,
            "{} {} stones repriced by {}%.",
            "Prices updated.".green(),
            adjustment.stones_repriced,
            adjustment.percent
        )?,
    }
    Ok(())
}

/// Declining or aborting the prompt cancels; any other prompt failure is an error.
fn ensure_confirmed(answer: InquireResult<bool>) -> Result<()> {
    match answer {
        Ok(true) => Ok(()),
        Ok(false) | Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
            bail!("Price adjustment cancelled")
        }
        Err(e) => Err(e).context("Failed to read confirmation"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declined_confirmation_cancels() {
        assert!(ensure_confirmed(Ok(true)).is_ok());

        for answer in [
            Ok(false),
            Err(InquireError::OperationCanceled),
            Err(InquireError::OperationInterrupted),
        ] {
            let err = ensure_confirmed(answer).unwrap_err();
            assert_eq!(err.to_string(), "Price adjustment cancelled");
        }
    }

    #[test]
    fn test_prompt_failure_is_reported() {
        let err = ensure_confirmed(Err(InquireError::NotTTY)).unwrap_err();
        assert_eq!(err.to_string(), "Failed to read confirmation");
    }
}
