use chrono::Local;
use napi::Result as NapiResult;
use napi_derive::napi;
use school_finance_core::billing::balance::{self, BalanceInput, BalanceStatus};
use school_finance_core::reports::debtors;
use school_finance_core::workflows::suspension::{self, SuspensionInput};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Balance
// ---------------------------------------------------------------------------

/// `{ balance, isDebtor }` for one student. A record that cannot be read
/// yields a zero, non-debtor balance rather than an exception, so one bad
/// student never breaks a listing.
#[napi]
pub fn compute_balance(input_json: String) -> NapiResult<String> {
    let status = match serde_json::from_str::<BalanceInput>(&input_json) {
        Ok(input) => balance::compute_balance(
            &input.student,
            input.settings.as_ref(),
            &input.academic_years,
            input
                .reference_date
                .unwrap_or_else(|| Local::now().date_naive()),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "unreadable balance input; using default");
            BalanceStatus::default()
        }
    };
    serde_json::to_string(&status).map_err(to_napi_error)
}

#[napi]
pub fn balance_breakdown(input_json: String) -> NapiResult<String> {
    let input: BalanceInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = balance::calculate_balance(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Reports and workflows
// ---------------------------------------------------------------------------

#[napi]
pub fn debtor_report(input_json: String) -> NapiResult<String> {
    let value: serde_json::Value = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = debtors::debtor_report_from_value(value).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn check_suspension(input_json: String) -> NapiResult<String> {
    let input: SuspensionInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = suspension::check_suspension(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
