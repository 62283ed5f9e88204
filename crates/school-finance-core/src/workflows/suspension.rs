use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

use crate::billing::balance::{compute_breakdown, outcome_warning, BalanceOutcome};
use crate::records::{AcademicYear, FinancialSettings, Student, StudentStatus};
use crate::{types::*, SchoolFinanceResult};

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuspensionInput {
    pub student: Student,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<FinancialSettings>,
    #[serde(default)]
    pub academic_years: Vec<AcademicYear>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SuspensionReason {
    /// No debt; the suspension may proceed.
    Clear,
    AlreadySuspended,
    /// Inactive or transferred students cannot be suspended.
    NotActive,
    /// The student is a debtor and must settle first.
    OutstandingDebt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuspensionDecision {
    pub allowed: bool,
    pub reason: SuspensionReason,
    pub balance: Money,
    /// Amount the student must pay before suspension, zero when allowed.
    pub outstanding: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Decide whether a student may be suspended. Students in debt are refused
/// and the decision carries the amount owed.
pub fn check_suspension(
    input: &SuspensionInput,
) -> SchoolFinanceResult<ComputationOutput<SuspensionDecision>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let reference_date = input.reference_date.unwrap_or_else(|| {
        warnings.push("Reference date not supplied; using today's date.".into());
        Local::now().date_naive()
    });

    let decision = match input.student.status {
        StudentStatus::Suspended => refused(SuspensionReason::AlreadySuspended),
        StudentStatus::Inactive | StudentStatus::Transferred => {
            refused(SuspensionReason::NotActive)
        }
        StudentStatus::Active => {
            let breakdown = compute_breakdown(
                &input.student,
                input.settings.as_ref(),
                &input.academic_years,
                reference_date,
            );
            if breakdown.outcome != BalanceOutcome::Computed {
                warnings.extend(outcome_warning(breakdown.outcome));
            }
            if breakdown.is_debtor {
                SuspensionDecision {
                    allowed: false,
                    reason: SuspensionReason::OutstandingDebt,
                    balance: breakdown.balance,
                    outstanding: breakdown.balance.abs(),
                }
            } else {
                SuspensionDecision {
                    allowed: true,
                    reason: SuspensionReason::Clear,
                    balance: breakdown.balance,
                    outstanding: Decimal::ZERO,
                }
            }
        }
    };

    info!(
        student = %input.student.id,
        allowed = decision.allowed,
        reason = ?decision.reason,
        "suspension check"
    );

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "reference_date": reference_date.to_string(),
        "student_status": input.student.status,
    });

    Ok(with_metadata(
        "Suspension gate: refuse while the student is a debtor",
        &assumptions,
        warnings,
        elapsed,
        decision,
    ))
}

fn refused(reason: SuspensionReason) -> SuspensionDecision {
    SuspensionDecision {
        allowed: false,
        reason,
        balance: Decimal::ZERO,
        outstanding: Decimal::ZERO,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
