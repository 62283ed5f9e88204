use chrono::{Datelike, Local, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use super::fees::{effective_fee, validate_profile, EffectiveFee, FeeSchedule};
use crate::records::academic_year::active_year;
use crate::records::{
    AcademicYear, FinancialProfile, FinancialSettings, PaymentType, Student, StudentStatus,
};
use crate::{types::*, SchoolFinanceError, SchoolFinanceResult};

/// A balance must fall strictly below this to mark the student as a debtor.
/// Small shortfalls from rounding are tolerated.
pub const DEBTOR_THRESHOLD: Money = dec!(-50);

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceInput {
    pub student: Student,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<FinancialSettings>,
    #[serde(default)]
    pub academic_years: Vec<AcademicYear>,
    /// Date the balance is evaluated on. Today's local date when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_date: Option<NaiveDate>,
}

/// The two facts every consumer of the engine needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceStatus {
    pub balance: Money,
    pub is_debtor: bool,
}

/// How the balance was arrived at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BalanceOutcome {
    /// Full computation over the active year.
    Computed,
    /// No financial settings configured; nothing can be owed.
    NoSettings,
    /// No academic year configured.
    NoAcademicYear,
    /// Enrolled this month with nothing paid yet; not yet billable.
    EnrollmentGrace,
    /// Inconsistent input; the safe default was returned.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ObligationKind {
    Enrollment,
    Renewal,
    Tuition,
    ExtraCharge,
}

/// One charged item of the active year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObligationLine {
    pub kind: ObligationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub base: Money,
    pub discount: Money,
    pub penalty: Money,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceBreakdown {
    pub balance: Money,
    pub is_debtor: bool,
    pub outcome: BalanceOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub academic_year: Option<i32>,
    pub total_paid: Money,
    pub total_obligation: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<FeeSchedule>,
    pub lines: Vec<ObligationLine>,
}

impl BalanceBreakdown {
    fn settled(academic_year: Option<i32>, outcome: BalanceOutcome) -> Self {
        BalanceBreakdown {
            balance: Decimal::ZERO,
            is_debtor: false,
            outcome,
            academic_year,
            total_paid: Decimal::ZERO,
            total_obligation: Decimal::ZERO,
            schedule: None,
            lines: Vec::new(),
        }
    }

    pub fn status(&self) -> BalanceStatus {
        BalanceStatus {
            balance: self.balance,
            is_debtor: self.is_debtor,
        }
    }

    /// Sum of the lines of one kind.
    pub fn total_of(&self, kind: ObligationKind) -> Money {
        self.lines
            .iter()
            .filter(|l| l.kind == kind)
            .map(|l| l.amount)
            .sum()
    }

    /// Months that accrued tuition, in order.
    pub fn charged_months(&self) -> Vec<u32> {
        self.lines
            .iter()
            .filter(|l| l.kind == ObligationKind::Tuition)
            .filter_map(|l| l.month)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Balance and debtor flag of `student` for the active academic year as of
/// `reference_date`.
///
/// Never fails: missing settings, an empty year list and any inconsistent
/// record all yield a zero, non-debtor balance.
pub fn compute_balance(
    student: &Student,
    settings: Option<&FinancialSettings>,
    academic_years: &[AcademicYear],
    reference_date: NaiveDate,
) -> BalanceStatus {
    compute_breakdown(student, settings, academic_years, reference_date).status()
}

/// Same as [`compute_balance`], itemised.
pub fn compute_breakdown(
    student: &Student,
    settings: Option<&FinancialSettings>,
    academic_years: &[AcademicYear],
    reference_date: NaiveDate,
) -> BalanceBreakdown {
    match try_breakdown(student, settings, academic_years, reference_date) {
        Ok(breakdown) => {
            debug!(
                student = %student.id,
                balance = %breakdown.balance,
                is_debtor = breakdown.is_debtor,
                outcome = ?breakdown.outcome,
                "computed balance"
            );
            breakdown
        }
        Err(e) => {
            warn!(student = %student.id, error = %e, "balance fell back to default");
            BalanceBreakdown::settled(
                active_year(academic_years).map(|y| y.year),
                BalanceOutcome::Fallback,
            )
        }
    }
}

/// Compute the itemised balance wrapped in the standard output envelope.
pub fn calculate_balance(
    input: &BalanceInput,
) -> SchoolFinanceResult<ComputationOutput<BalanceBreakdown>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let reference_date = match input.reference_date {
        Some(d) => d,
        None => {
            warnings.push("Reference date not supplied; using today's date.".into());
            Local::now().date_naive()
        }
    };

    if let Some(first) = input.academic_years.first() {
        if !input.academic_years.iter().any(AcademicYear::is_in_progress) {
            warnings.push(format!(
                "No academic year is in progress; using {} as the active year.",
                first.year
            ));
        }
    }

    let breakdown = compute_breakdown(
        &input.student,
        input.settings.as_ref(),
        &input.academic_years,
        reference_date,
    );
    warnings.extend(outcome_warning(breakdown.outcome));

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "reference_date": reference_date.to_string(),
        "debtor_threshold": DEBTOR_THRESHOLD.to_string(),
        "currency": input.settings.as_ref().map(|s| s.currency.clone()),
    });

    Ok(with_metadata(
        "Student balance: payments less enrollment/renewal, tuition and unpaid extra charges",
        &assumptions,
        warnings,
        elapsed,
        breakdown,
    ))
}

/// Human-readable note for any outcome other than a full computation.
pub fn outcome_warning(outcome: BalanceOutcome) -> Option<String> {
    match outcome {
        BalanceOutcome::Computed => None,
        BalanceOutcome::NoSettings => {
            Some("No financial settings configured; balance is zero.".into())
        }
        BalanceOutcome::NoAcademicYear => {
            Some("No academic years configured; balance is zero.".into())
        }
        BalanceOutcome::EnrollmentGrace => Some(
            "Student enrolled this month with no payments yet; not treated as a debtor.".into(),
        ),
        BalanceOutcome::Fallback => {
            Some("Student record is inconsistent; balance defaulted to zero.".into())
        }
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn try_breakdown(
    student: &Student,
    settings: Option<&FinancialSettings>,
    academic_years: &[AcademicYear],
    reference_date: NaiveDate,
) -> SchoolFinanceResult<BalanceBreakdown> {
    let Some(settings) = settings else {
        return Ok(BalanceBreakdown::settled(None, BalanceOutcome::NoSettings));
    };
    let Some(year) = active_year(academic_years) else {
        return Ok(BalanceBreakdown::settled(None, BalanceOutcome::NoAcademicYear));
    };
    validate_year(year)?;

    let current_year = year.year;
    let total_paid = student
        .total_paid_in(current_year)
        .ok_or_else(|| overflow("total paid"))?;

    let matriculation = student.matriculation_date;
    if total_paid.is_zero() && same_month(matriculation, reference_date) {
        return Ok(BalanceBreakdown::settled(
            Some(current_year),
            BalanceOutcome::EnrollmentGrace,
        ));
    }

    let schedule = FeeSchedule::resolve(settings, &student.desired_class)?;
    let profile = student.profile();
    validate_profile(&profile)?;

    let mut lines: Vec<ObligationLine> = Vec::new();

    // -- Enrollment / renewal ------------------------------------------------
    let matriculation_year = matriculation.year();
    if matriculation_year == current_year {
        let fee = effective_fee(&profile, PaymentType::Enrollment, schedule.enrollment_fee)?;
        lines.push(fee_line(ObligationKind::Enrollment, None, fee));
    } else if matriculation_year < current_year && student.status != StudentStatus::Inactive {
        let fee = effective_fee(&profile, PaymentType::Renewal, schedule.renewal_fee)?;
        lines.push(fee_line(ObligationKind::Renewal, None, fee));
    }

    // -- Tuition ---------------------------------------------------------------
    if current_year <= reference_date.year() {
        lines.extend(tuition_lines(
            student,
            year,
            &schedule,
            &profile,
            reference_date,
        )?);
    }

    // -- Extra charges ---------------------------------------------------------
    lines.extend(
        student
            .extra_charges
            .iter()
            .filter(|c| c.date.year() == current_year && !c.is_paid)
            .map(|c| ObligationLine {
                kind: ObligationKind::ExtraCharge,
                month: None,
                description: c.description.clone(),
                base: c.amount,
                discount: Decimal::ZERO,
                penalty: Decimal::ZERO,
                amount: c.amount,
            }),
    );

    let total_obligation = lines
        .iter()
        .try_fold(Decimal::ZERO, |acc, l| acc.checked_add(l.amount))
        .ok_or_else(|| overflow("total obligation"))?;
    let balance = total_paid
        .checked_sub(total_obligation)
        .ok_or_else(|| overflow("balance"))?;

    Ok(BalanceBreakdown {
        balance,
        is_debtor: balance < DEBTOR_THRESHOLD,
        outcome: BalanceOutcome::Computed,
        academic_year: Some(current_year),
        total_paid,
        total_obligation,
        schedule: Some(schedule),
        lines,
    })
}

/// Tuition due for each billable month of the active year up to the
/// reference date (or the whole window for a past year).
fn tuition_lines(
    student: &Student,
    year: &AcademicYear,
    schedule: &FeeSchedule,
    profile: &FinancialProfile,
    reference_date: NaiveDate,
) -> SchoolFinanceResult<Vec<ObligationLine>> {
    let current_year = year.year;

    // Tuition never predates enrollment.
    let start_month = if student.matriculation_date.year() == current_year {
        year.start_month.max(student.matriculation_date.month() + 1)
    } else {
        year.start_month
    };

    let last_month = if current_year == reference_date.year() {
        reference_date.month().min(year.end_month)
    } else {
        year.end_month
    };

    let penalise = schedule.late_penalty_percent > Decimal::ZERO && profile.accrues_penalty();

    let mut lines = Vec::new();
    for month in start_month..=last_month {
        if is_suspended_for(student, current_year, month) {
            continue;
        }

        let fee = effective_fee(profile, PaymentType::Tuition, schedule.monthly_fee)?;
        let penalty = if penalise
            && is_late(current_year, month, reference_date, schedule.payment_limit_day)
        {
            schedule.late_penalty(fee.amount)?
        } else {
            Decimal::ZERO
        };

        let mut line = fee_line(ObligationKind::Tuition, Some(month), fee);
        line.penalty = penalty;
        line.amount = fee
            .amount
            .checked_add(penalty)
            .ok_or_else(|| overflow("tuition"))?;
        lines.push(line);
    }
    Ok(lines)
}

/// No tuition accrues after the month a suspension took effect, nor in any
/// later year.
fn is_suspended_for(student: &Student, current_year: i32, month: u32) -> bool {
    if student.status != StudentStatus::Suspended {
        return false;
    }
    match student.suspension_date {
        Some(date) => {
            (current_year == date.year() && month > date.month()) || current_year > date.year()
        }
        None => false,
    }
}

/// Every month of a past year is late. In the current year a month is late
/// once it is over, or once the limit day of the running month has passed.
fn is_late(current_year: i32, month: u32, reference_date: NaiveDate, limit_day: u32) -> bool {
    current_year < reference_date.year()
        || month < reference_date.month()
        || (month == reference_date.month() && reference_date.day() > limit_day)
}

fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

fn validate_year(year: &AcademicYear) -> SchoolFinanceResult<()> {
    for (field, month) in [("startMonth", year.start_month), ("endMonth", year.end_month)] {
        if !(1..=12).contains(&month) {
            return Err(SchoolFinanceError::InvalidInput {
                field: field.into(),
                reason: format!("{month} is not a calendar month."),
            });
        }
    }
    if year.start_month > year.end_month {
        return Err(SchoolFinanceError::InvalidInput {
            field: "startMonth".into(),
            reason: format!(
                "Academic year {} starts after it ends ({} > {}).",
                year.year, year.start_month, year.end_month
            ),
        });
    }
    Ok(())
}

fn fee_line(kind: ObligationKind, month: Option<u32>, fee: EffectiveFee) -> ObligationLine {
    ObligationLine {
        kind,
        month,
        description: None,
        base: fee.base,
        discount: fee.discount,
        penalty: Decimal::ZERO,
        amount: fee.amount,
    }
}

fn overflow(context: &str) -> SchoolFinanceError {
    SchoolFinanceError::ArithmeticOverflow {
        context: context.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
