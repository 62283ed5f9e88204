use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use serde_json::{json, Value};

use school_finance_core::reports::debtors::{self, SortOrder};

use super::apply_reference_date;
use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortArg {
    Balance,
    Name,
    Input,
}

impl From<SortArg> for SortOrder {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Balance => SortOrder::Balance,
            SortArg::Name => SortOrder::Name,
            SortArg::Input => SortOrder::Input,
        }
    }
}

/// Arguments for the debtor listing
#[derive(Args)]
pub struct DebtorsArgs {
    /// Path to a JSON/YAML file holding `students`, `settings` and
    /// `academicYears` (stdin is read when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// List debtors only
    #[arg(long)]
    pub only_debtors: bool,

    /// Row order
    #[arg(long)]
    pub sort: Option<SortArg>,

    /// Restrict to students with these statuses (e.g. "Ativo,Suspenso")
    #[arg(long, value_delimiter = ',')]
    pub status: Option<Vec<String>>,
}

pub fn run_debtors(
    args: DebtorsArgs,
    as_of: Option<NaiveDate>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut data = input::load(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for debtors")?;
    apply_reference_date(&mut data, as_of);
    apply_options(&mut data, &args)?;

    let result = debtors::debtor_report_from_value(data)?;
    Ok(serde_json::to_value(result)?)
}

/// Merge command-line filters over any `options` present in the document.
fn apply_options(data: &mut Value, args: &DebtorsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let map = data
        .as_object_mut()
        .ok_or("input document must be a JSON object")?;
    let options = map.entry("options").or_insert_with(|| json!({}));
    let options = options
        .as_object_mut()
        .ok_or("`options` must be a JSON object")?;

    if args.only_debtors {
        options.insert("onlyDebtors".into(), Value::Bool(true));
    }
    if let Some(sort) = args.sort {
        options.insert("sort".into(), serde_json::to_value(SortOrder::from(sort))?);
    }
    if let Some(ref statuses) = args.status {
        options.insert("statuses".into(), json!(statuses));
    }
    Ok(())
}
