mod commands;
mod input;
mod output;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::balance::BalanceArgs;
use commands::debtors::DebtorsArgs;
use commands::suspension::SuspensionArgs;

/// Student balances and debtor status for school administration
#[derive(Parser)]
#[command(
    name = "sfin",
    version,
    about = "Student balances and debtor status for school administration",
    long_about = "Computes what each student owes for the active academic year from a \
                  snapshot of student records, financial settings and academic years. \
                  Supports single-student breakdowns, debtor listings and suspension checks."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Evaluate as of this date (YYYY-MM-DD) instead of the input's referenceDate or today
    #[arg(long, global = true, value_parser = parse_date)]
    as_of: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
    /// Itemised balance of one student
    Balance(BalanceArgs),
    /// Debtor listing over a set of students
    Debtors(DebtorsArgs),
    /// Check whether a student may be suspended
    SuspensionCheck(SuspensionArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("invalid date '{s}': {e}"))
}

fn main() {
    // Logs go to stderr so stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Balance(args) => commands::balance::run_balance(args, cli.as_of),
        Commands::Debtors(args) => commands::debtors::run_debtors(args, cli.as_of),
        Commands::SuspensionCheck(args) => {
            commands::suspension::run_suspension_check(args, cli.as_of)
        }
        Commands::Version => {
            println!("sfin {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
