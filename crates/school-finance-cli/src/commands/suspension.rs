use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use school_finance_core::workflows::suspension::{self, SuspensionInput};

use super::apply_reference_date;
use crate::input;

/// Arguments for the suspension check
#[derive(Args)]
pub struct SuspensionArgs {
    /// Path to a JSON/YAML file holding `student`, `settings` and
    /// `academicYears` (stdin is read when omitted)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_suspension_check(
    args: SuspensionArgs,
    as_of: Option<NaiveDate>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut data = input::load(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for suspension-check")?;
    apply_reference_date(&mut data, as_of);

    let suspension_input: SuspensionInput = serde_json::from_value(data)?;
    let result = suspension::check_suspension(&suspension_input)?;
    Ok(serde_json::to_value(result)?)
}
