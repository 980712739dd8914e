//! Command-line interface argument parsing.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use finance_dashboard::{NewTransaction, Overrides, TransactionType};
use std::path::PathBuf;

/// Finance Dashboard - in-memory personal finance session
///
/// Everything lives for one invocation: add or import transactions, move
/// money to savings, then read the totals.
///
/// Examples:
///   finance-dashboard normalize "R$ 1.200,50" "£1,200.50"
///   finance-dashboard session --add "2024-05-01|Salary|2500|Salary|INCOME" --transfer 200
///   finance-dashboard session --import statement.pdf --import export.csv --advice
///   finance-dashboard init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    ///
    /// If not specified, looks for .finance-dashboard.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// AI model for extraction and advice
    #[arg(long, env = "FINANCE_DASHBOARD_MODEL", global = true)]
    pub model: Option<String>,

    /// Timeout in seconds for AI requests
    #[arg(long, value_name = "SECONDS", global = true)]
    pub timeout: Option<u64>,

    /// Currency symbol used for display
    #[arg(long, value_name = "SYMBOL", global = true)]
    pub currency: Option<String>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Normalize free-form currency strings
    Normalize {
        /// Amounts such as "1.200,50" or "£1,200.50"
        #[arg(required = true, allow_hyphen_values = true)]
        amounts: Vec<String>,

        /// Report unparsable input instead of printing 0.00
        #[arg(long)]
        strict: bool,
    },

    /// Build a session ledger and print the dashboard
    Session {
        /// Manual entry: "date|description|amount|category|TYPE"
        #[arg(long = "add", value_name = "RECORD", value_parser = parse_record)]
        add: Vec<NewTransaction>,

        /// Statement to import (pdf, png, jpg, webp, csv, tsv, xlsx, xls, txt)
        #[arg(long = "import", value_name = "FILE")]
        import: Vec<PathBuf>,

        /// Pasted statement text to import
        #[arg(long, value_name = "TEXT")]
        text: Option<String>,

        /// Remove a transaction by id after adding/importing
        #[arg(long = "remove", value_name = "ID")]
        remove: Vec<String>,

        /// Move this amount to savings at the end of the session
        #[arg(long, value_name = "AMOUNT")]
        transfer: Option<f64>,

        /// Ask the AI model for tips on the newest transactions
        #[arg(long)]
        advice: bool,

        /// Print the dashboard as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a default .finance-dashboard.toml
    InitConfig,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the log level based on verbosity flags.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    pub fn overrides(&self) -> Overrides {
        Overrides {
            model: self.model.clone(),
            currency_symbol: self.currency.clone(),
            timeout_seconds: self.timeout,
        }
    }
}

/// Parse "date|description|amount|category|TYPE". The amount stays text so
/// it goes through the same normalization as imported values.
pub fn parse_record(raw: &str) -> Result<NewTransaction> {
    let fields: Vec<&str> = raw.split('|').map(str::trim).collect();
    if fields.len() != 5 {
        bail!(
            "expected 5 '|'-separated fields (date|description|amount|category|TYPE), got {}",
            fields.len()
        );
    }

    let kind: TransactionType = fields[4].parse()?;
    Ok(NewTransaction::new(fields[0], fields[1], fields[2], fields[3], kind))
}
