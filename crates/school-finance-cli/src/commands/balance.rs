use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use school_finance_core::billing::balance::{self, BalanceInput};

use super::apply_reference_date;
use crate::input;

/// Arguments for a single student's balance
#[derive(Args)]
pub struct BalanceArgs {
    /// Path to a JSON/YAML file holding `student`, `settings` and
    /// `academicYears` (stdin is read when omitted)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_balance(
    args: BalanceArgs,
    as_of: Option<NaiveDate>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut data = input::load(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for balance")?;
    apply_reference_date(&mut data, as_of);

    let balance_input: BalanceInput = serde_json::from_value(data)?;
    let result = balance::calculate_balance(&balance_input)?;
    Ok(serde_json::to_value(result)?)
}
